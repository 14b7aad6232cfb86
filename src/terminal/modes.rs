//! The terminal mode set (spec.md §4.3 "Modes"): everything toggled by
//! `CSI ... h` / `CSI ... l`, ANSI or `?`-prefixed DEC private. Grounded in
//! terminol's `Terminal::Mode` enum (`common/terminal.hxx`) and, in idiom,
//! on the teacher's `bitflags`-backed `TuiStyleAttribs`/`AttrSet`
//! (`src/style.rs` in this crate follows the same pattern for SGR attrs).

use bitflags::bitflags;

bitflags! {
    /// One bit per mode named in spec.md §4.3. Composed as a set because
    /// `Terminal::key_input`/`mouse_input`/`write` all need to test several
    /// of these together rather than branch on one at a time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeSet: u32 {
        /// DECNKM / `CSI ?66h`: numeric vs application keypad.
        const APPKEYPAD            = 1 << 0;
        /// DECCKM / `CSI ?1h`: cursor keys send `ESC O` vs `ESC [`.
        const APPCURSOR            = 1 << 1;
        /// DECAWM / `CSI ?7h`: wrap at the right margin.
        const AUTO_WRAP            = 1 << 2;
        /// DECARM / `CSI ?8h`: key auto-repeat (host-side concern; carried
        /// for completeness, spec.md §1 Non-goals excludes key-repeat
        /// timing itself).
        const AUTO_REPEAT          = 1 << 3;
        /// DECOM / `CSI ?6h`: cursor addressing is margin-relative.
        const ORIGIN               = 1 << 4;
        /// DECSCNM / `CSI ?5h`: whole-screen video reverse.
        const REVERSE              = 1 << 5;
        /// DECTCEM / `CSI ?25h`: cursor is painted at all.
        const SHOW_CURSOR          = 1 << 6;
        /// IRM / `CSI 4h`: inserted writes shift the rest of the line
        /// right instead of overwriting.
        const INSERT               = 1 << 7;
        /// SRM / `CSI 12l` (note: SRM is normally-on, so this mode name
        /// tracks "local echo enabled", the *complement* of the raw SRM
        /// bit) — local echo of typed input.
        const ECHO                 = 1 << 8;
        /// LNM / `CSI 20h`: LF also does CR.
        const CR_ON_LF             = 1 << 9;
        /// KAM / `CSI 2h`: keyboard input is locked (ignored).
        const KBDLOCK              = 1 << 10;
        /// `CSI ?1000h`: report mouse button press/release.
        const MOUSE_PRESS_RELEASE  = 1 << 11;
        /// `CSI ?1002h`: also report motion while a button is held.
        const MOUSE_DRAG           = 1 << 12;
        /// `CSI ?1003h`: report all motion, button held or not.
        const MOUSE_MOTION         = 1 << 13;
        /// Local selection gesture handling is enabled (terminol config
        /// flag rather than a DEC mode number — see DESIGN.md).
        const MOUSE_SELECT         = 1 << 14;
        /// `CSI ?1006h`: SGR mouse report encoding instead of the legacy
        /// base-32 X10 triplet.
        const MOUSE_FORMAT_SGR     = 1 << 15;
        /// `CSI ?1004h`: report focus in/out.
        const FOCUS                = 1 << 16;
        /// `CSI ?1034h`: set the high bit on Meta/Alt single-byte payloads
        /// instead of prefixing `ESC`.
        const META_8BIT            = 1 << 17;
        /// Config-driven: Delete key sends `DEL` (0x7F) rather than the
        /// `CSI 3~` sequence.
        const DELETE_SENDS_DEL     = 1 << 18;
        /// `CSI ?1036h`: Alt+key prefixes `ESC` rather than setting the
        /// high bit (mutually exclusive in effect with `META_8BIT`; the
        /// latter wins when both are set, matching xterm).
        const ALT_SENDS_ESC        = 1 << 19;
        /// `CSI ?2004h`: wrap pasted text in `ESC [200~` / `ESC [201~`.
        const BRACKETED_PASTE      = 1 << 20;
    }
}

impl Default for ModeSet {
    /// spec.md §4.3 "Initial set".
    fn default() -> Self {
        ModeSet::AUTO_WRAP | ModeSet::SHOW_CURSOR | ModeSet::AUTO_REPEAT | ModeSet::ALT_SENDS_ESC
    }
}

/// Resolve a DEC private mode number (the argument of `CSI ? ... h/l`) to
/// the `ModeSet` bit it toggles. `None` for numbers this core doesn't
/// recognise (silently ignored, spec.md §6.5).
pub fn private_mode(n: u16) -> Option<ModeSet> {
    Some(match n {
        1 => ModeSet::APPCURSOR,
        5 => ModeSet::REVERSE,
        6 => ModeSet::ORIGIN,
        7 => ModeSet::AUTO_WRAP,
        8 => ModeSet::AUTO_REPEAT,
        25 => ModeSet::SHOW_CURSOR,
        66 => ModeSet::APPKEYPAD,
        1000 => ModeSet::MOUSE_PRESS_RELEASE,
        1002 => ModeSet::MOUSE_DRAG,
        1003 => ModeSet::MOUSE_MOTION,
        1004 => ModeSet::FOCUS,
        1006 => ModeSet::MOUSE_FORMAT_SGR,
        1034 => ModeSet::META_8BIT,
        1036 => ModeSet::ALT_SENDS_ESC,
        2004 => ModeSet::BRACKETED_PASTE,
        _ => return None,
    })
}

/// Resolve an ANSI (non-`?`) mode number to the `ModeSet` bit it toggles.
pub fn ansi_mode(n: u16) -> Option<ModeSet> {
    Some(match n {
        2 => ModeSet::KBDLOCK,
        4 => ModeSet::INSERT,
        12 => ModeSet::ECHO,
        20 => ModeSet::CR_ON_LF,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_modes_match_spec() {
        let modes = ModeSet::default();
        assert!(modes.contains(ModeSet::AUTO_WRAP));
        assert!(modes.contains(ModeSet::SHOW_CURSOR));
        assert!(modes.contains(ModeSet::AUTO_REPEAT));
        assert!(modes.contains(ModeSet::ALT_SENDS_ESC));
        assert!(!modes.contains(ModeSet::INSERT));
    }

    #[test]
    fn private_mode_looks_up_deccckm_and_alt_screen_siblings() {
        assert_eq!(private_mode(1), Some(ModeSet::APPCURSOR));
        assert_eq!(private_mode(1049), None); // handled separately (buffer switch)
        assert_eq!(private_mode(9999), None);
    }

    #[test]
    fn ansi_mode_looks_up_insert_and_linefeed_newline() {
        assert_eq!(ansi_mode(4), Some(ModeSet::INSERT));
        assert_eq!(ansi_mode(20), Some(ModeSet::CR_ON_LF));
        assert_eq!(ansi_mode(99), None);
    }
}
