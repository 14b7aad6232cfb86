//! Keysym + modifier → byte sequence encoding (spec.md §4.3 "Key input").
//! The host owns keysym/modifier mapping itself (spec.md §1 Non-goals); this
//! module only covers the encoding step once a logical key has been
//! identified, grounded in xterm's well-known function-key table and
//! terminol's `Terminal::keyPress` (`common/terminal.cxx`).

use bitflags::bitflags;
use smallvec::SmallVec;

use super::modes::ModeSet;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

/// A logical key, independent of any particular keyboard layout or
/// toolkit's keysym numbering — the host translates its own keysym space
/// into this enum before calling [`encode_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySym {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    F(u8),
}

/// Output of [`encode_key`]: either a byte sequence for the child, or a
/// signal that the host's key-binding table should handle this press
/// instead (spec.md §4.3 "consult configured key bindings" — the bindings
/// themselves are the host's, this just reports "not mine").
pub type EncodedKey = SmallVec<[u8; 16]>;

/// xterm's `ESC [ num ; mod+1 code`/`ESC [ num ~` modifier suffix, only
/// emitted when at least one modifier besides plain Shift-on-a-plain-key is
/// held (spec.md §4.3 "Function keys follow xterm's... encoding when
/// modifiers are present").
fn modifier_code(mods: Modifiers) -> Option<u16> {
    if mods.is_empty() {
        return None;
    }
    let mut code = 1u16;
    if mods.contains(Modifiers::SHIFT) {
        code += 1;
    }
    if mods.contains(Modifiers::ALT) {
        code += 2;
    }
    if mods.contains(Modifiers::CTRL) {
        code += 4;
    }
    if mods.contains(Modifiers::SUPER) {
        code += 8;
    }
    Some(code)
}

fn push_csi_tilde(out: &mut EncodedKey, num: u16, mods: Modifiers) {
    out.extend_from_slice(b"\x1b[");
    out.extend_from_slice(num.to_string().as_bytes());
    if let Some(m) = modifier_code(mods) {
        out.push(b';');
        out.extend_from_slice(m.to_string().as_bytes());
    }
    out.push(b'~');
}

/// `ESC [ code` / `ESC O code` cursor-key family, letter-final rather than
/// `~`-final (Home/End/arrows when no extra modifier needs the `;mod`
/// suffix use the app-mode form; with modifiers they always go through
/// `CSI`, never `SS3`, matching xterm).
fn push_cursor_key(out: &mut EncodedKey, code: u8, mods: Modifiers, app_cursor: bool) {
    match modifier_code(mods) {
        None if app_cursor => {
            out.extend_from_slice(b"\x1bO");
            out.push(code);
        }
        None => {
            out.extend_from_slice(b"\x1b[");
            out.push(code);
        }
        Some(m) => {
            out.extend_from_slice(b"\x1b[1;");
            out.extend_from_slice(m.to_string().as_bytes());
            out.push(code);
        }
    }
}

/// Control+letter mapping (spec.md §4.3): `3..7` → C0 `0x1B..0x1F`, `2` →
/// NUL, `8`/`?` → DEL, letters → `code & 0x1F`.
fn control_byte(c: char) -> Option<u8> {
    match c {
        'a'..='z' => Some(c as u8 - b'a' + 1),
        'A'..='Z' => Some(c as u8 - b'A' + 1),
        '2' | '@' => Some(0x00),
        '3' => Some(0x1B),
        '4' => Some(0x1C),
        '5' => Some(0x1D),
        '6' => Some(0x1E),
        '7' => Some(0x1F),
        '8' | '?' => Some(0x7F),
        '[' => Some(0x1B),
        '\\' => Some(0x1C),
        ']' => Some(0x1D),
        '^' => Some(0x1E),
        '_' => Some(0x1F),
        _ => None,
    }
}

/// Encode one key press into the bytes to send the child, honouring
/// `APPCURSOR`/`APPKEYPAD`/`CR_ON_LF`/`DELETE_SENDS_DEL`/`ALT_SENDS_ESC`/
/// `META_8BIT` (spec.md §4.3). Returns `None` only when the key carries no
/// payload at all (there are none currently; kept for a future key this
/// core doesn't yet model).
pub fn encode_key(key: KeySym, mods: Modifiers, modes: ModeSet) -> Option<EncodedKey> {
    let app_cursor = modes.contains(ModeSet::APPCURSOR);
    let mut out = EncodedKey::new();

    match key {
        KeySym::Up => push_cursor_key(&mut out, b'A', mods, app_cursor),
        KeySym::Down => push_cursor_key(&mut out, b'B', mods, app_cursor),
        KeySym::Right => push_cursor_key(&mut out, b'C', mods, app_cursor),
        KeySym::Left => push_cursor_key(&mut out, b'D', mods, app_cursor),
        KeySym::Home => push_cursor_key(&mut out, b'H', mods, app_cursor),
        KeySym::End => push_cursor_key(&mut out, b'F', mods, app_cursor),
        KeySym::Insert => push_csi_tilde(&mut out, 2, mods),
        KeySym::Delete => {
            if modes.contains(ModeSet::DELETE_SENDS_DEL) && mods.is_empty() {
                out.push(0x7F);
            } else {
                push_csi_tilde(&mut out, 3, mods);
            }
        }
        KeySym::PageUp => push_csi_tilde(&mut out, 5, mods),
        KeySym::PageDown => push_csi_tilde(&mut out, 6, mods),
        KeySym::F(n @ 1..=4) => push_cursor_key(&mut out, b'P' + (n - 1), mods, false),
        KeySym::F(n @ 5..=16) => {
            const TABLE: [u16; 12] = [15, 17, 18, 19, 20, 21, 23, 24, 25, 26, 28, 29];
            push_csi_tilde(&mut out, TABLE[(n - 5) as usize], mods);
        }
        KeySym::F(_) => return None,
        KeySym::Enter => {
            out.push(if modes.contains(ModeSet::CR_ON_LF) { b'\n' } else { b'\r' });
        }
        KeySym::Tab => out.push(b'\t'),
        KeySym::Escape => out.push(0x1B),
        KeySym::Backspace => out.push(0x7F),
        KeySym::Char(c) => encode_char(&mut out, c, mods, modes),
    }

    Some(out)
}

fn encode_char(out: &mut EncodedKey, c: char, mods: Modifiers, modes: ModeSet) {
    let alt = mods.contains(Modifiers::ALT);

    if mods.contains(Modifiers::CTRL) {
        if let Some(byte) = control_byte(c) {
            if alt && modes.contains(ModeSet::ALT_SENDS_ESC) && !modes.contains(ModeSet::META_8BIT) {
                out.push(0x1B);
            }
            if alt && modes.contains(ModeSet::META_8BIT) {
                out.push(byte | 0x80);
            } else {
                out.push(byte);
            }
            return;
        }
    }

    let mut buf = [0u8; 4];
    let encoded = c.encode_utf8(&mut buf);
    let bytes = encoded.as_bytes();

    if alt {
        // spec.md §9 Open Question: META_8BIT only sets the high bit on a
        // single-byte (ASCII) payload; multi-byte UTF-8 always falls back
        // to the ESC-prefix form, matching terminol's current behaviour.
        if modes.contains(ModeSet::META_8BIT) && bytes.len() == 1 {
            out.push(bytes[0] | 0x80);
            return;
        }
        if modes.contains(ModeSet::ALT_SENDS_ESC) {
            out.push(0x1B);
        }
    }
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_char_passes_through_as_utf8() {
        let encoded = encode_key(KeySym::Char('a'), Modifiers::empty(), ModeSet::default()).unwrap();
        assert_eq!(encoded.as_slice(), b"a");
    }

    #[test]
    fn ctrl_letter_maps_to_c0_control_byte() {
        let encoded = encode_key(KeySym::Char('c'), Modifiers::CTRL, ModeSet::default()).unwrap();
        assert_eq!(encoded.as_slice(), &[0x03]);
    }

    #[test]
    fn ctrl_2_is_nul() {
        let encoded = encode_key(KeySym::Char('2'), Modifiers::CTRL, ModeSet::default()).unwrap();
        assert_eq!(encoded.as_slice(), &[0x00]);
    }

    #[test]
    fn alt_sends_esc_prefixes_plain_chars() {
        let encoded = encode_key(KeySym::Char('x'), Modifiers::ALT, ModeSet::default()).unwrap();
        assert_eq!(encoded.as_slice(), b"\x1bx");
    }

    #[test]
    fn meta_8bit_sets_high_bit_on_single_byte_payload() {
        let modes = ModeSet::META_8BIT;
        let encoded = encode_key(KeySym::Char('x'), Modifiers::ALT, modes).unwrap();
        assert_eq!(encoded.as_slice(), &[b'x' | 0x80]);
    }

    #[test]
    fn meta_8bit_falls_back_to_esc_prefix_for_multibyte_payload() {
        let modes = ModeSet::META_8BIT;
        let encoded = encode_key(KeySym::Char('é'), Modifiers::ALT, modes).unwrap();
        let mut expected = vec![0x1B];
        expected.extend_from_slice("é".as_bytes());
        assert_eq!(encoded.as_slice(), expected.as_slice());
    }

    #[test]
    fn app_cursor_mode_uses_ss3_for_plain_arrow() {
        let encoded = encode_key(KeySym::Up, Modifiers::empty(), ModeSet::APPCURSOR).unwrap();
        assert_eq!(encoded.as_slice(), b"\x1bOA");
    }

    #[test]
    fn normal_cursor_mode_uses_csi_for_plain_arrow() {
        let encoded = encode_key(KeySym::Up, Modifiers::empty(), ModeSet::empty()).unwrap();
        assert_eq!(encoded.as_slice(), b"\x1b[A");
    }

    #[test]
    fn modified_arrow_always_uses_csi_with_modifier_suffix() {
        let encoded = encode_key(KeySym::Up, Modifiers::SHIFT, ModeSet::APPCURSOR).unwrap();
        assert_eq!(encoded.as_slice(), b"\x1b[1;2A");
    }

    #[test]
    fn delete_sends_tilde_sequence_by_default() {
        let encoded = encode_key(KeySym::Delete, Modifiers::empty(), ModeSet::default()).unwrap();
        assert_eq!(encoded.as_slice(), b"\x1b[3~");
    }

    #[test]
    fn delete_sends_del_byte_when_mode_set() {
        let modes = ModeSet::DELETE_SENDS_DEL;
        let encoded = encode_key(KeySym::Delete, Modifiers::empty(), modes).unwrap();
        assert_eq!(encoded.as_slice(), &[0x7F]);
    }

    #[test]
    fn enter_sends_lf_when_cr_on_lf_is_set() {
        let encoded = encode_key(KeySym::Enter, Modifiers::empty(), ModeSet::CR_ON_LF).unwrap();
        assert_eq!(encoded.as_slice(), b"\n");
    }

    #[test]
    fn f5_uses_the_higher_function_key_table() {
        let encoded = encode_key(KeySym::F(5), Modifiers::empty(), ModeSet::default()).unwrap();
        assert_eq!(encoded.as_slice(), b"\x1b[15~");
    }
}
