//! Mouse event → byte sequence encoding (spec.md §4.3 "Mouse reporting").
//! The host still owns the raw pointer protocol and X selection gestures
//! (spec.md §1 Non-goals); this module is the report-format encoder once
//! `Terminal` has decided a press/release/drag/wheel event should be
//! reported to the child rather than used for local selection.

use smallvec::SmallVec;

use super::keys::Modifiers;
use super::modes::ModeSet;
use crate::geometry::Pos;

/// Which physical control moved, in xterm's base button numbering (wheel
/// directions are reported through [`MouseKind::WheelUp`]/[`WheelDown`]
/// rather than a button number, spec.md §4.3 "Wheel events use button
/// numbers 3/4 biased +64").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseKind {
    Press(MouseButton),
    Release(MouseButton),
    Motion(Option<MouseButton>),
    WheelUp,
    WheelDown,
}

pub type EncodedMouse = SmallVec<[u8; 16]>;

fn base_button(kind: MouseKind) -> Option<u8> {
    match kind {
        MouseKind::Press(b) | MouseKind::Release(b) | MouseKind::Motion(Some(b)) => Some(match b {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
        }),
        MouseKind::Motion(None) => Some(3), // "no button" code in the X10 scheme.
        MouseKind::WheelUp => Some(64),
        MouseKind::WheelDown => Some(65),
    }
}

fn modifier_bits(mods: Modifiers) -> u8 {
    let mut bits = 0u8;
    if mods.contains(Modifiers::SHIFT) {
        bits += 4;
    }
    if mods.contains(Modifiers::ALT) {
        bits += 8;
    }
    if mods.contains(Modifiers::CTRL) {
        bits += 16;
    }
    bits
}

/// Encode `kind` at `pos` (viewport-relative, 0-based) into a mouse report,
/// honouring `MOUSE_FORMAT_SGR` (spec.md §4.3). Returns `None` when no
/// mouse-reporting mode is active at all — callers should have already
/// checked `MOUSE_PRESS_RELEASE`/`MOUSE_DRAG`/`MOUSE_MOTION` before calling
/// this, but a defensive `None` costs nothing.
pub fn encode_mouse(kind: MouseKind, pos: Pos, mods: Modifiers, modes: ModeSet) -> Option<EncodedMouse> {
    let button = base_button(kind)?;
    let motion_bit = if matches!(kind, MouseKind::Motion(_)) { 32 } else { 0 };
    let cb = button + modifier_bits(mods) + motion_bit;

    let mut out = EncodedMouse::new();
    if modes.contains(ModeSet::MOUSE_FORMAT_SGR) {
        out.extend_from_slice(b"\x1b[<");
        out.extend_from_slice(cb.to_string().as_bytes());
        out.push(b';');
        out.extend_from_slice((pos.col + 1).to_string().as_bytes());
        out.push(b';');
        out.extend_from_slice((pos.row + 1).to_string().as_bytes());
        out.push(if matches!(kind, MouseKind::Release(_)) { b'm' } else { b'M' });
    } else {
        out.extend_from_slice(b"\x1b[M");
        // Legacy X10 format has no separate release-button code and
        // cannot exceed column/row 223 (32 + 191); clamp rather than wrap.
        let release_code = 3u8; // "all buttons released" in the X10 scheme.
        let cb = if matches!(kind, MouseKind::Release(_)) { release_code + modifier_bits(mods) } else { cb };
        out.push(cb.saturating_add(32));
        out.push((pos.col + 1).clamp(1, 223) as u8 + 32);
        out.push((pos.row + 1).clamp(1, 223) as u8 + 32);
    }
    Some(out)
}
