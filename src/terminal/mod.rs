//! C7: `Terminal`, the façade tying the VT parser (C2), screen buffer (C6),
//! mode set, and key/mouse encoders together (spec.md §4.3). Laid out the
//! way the teacher splits a big coordinating type across a `mod.rs` plus
//! sibling files rather than one large file — `perform.rs` is this module's
//! `csi_dispatch`-equivalent, `sgr.rs`/`keys.rs`/`mouse.rs`/`modes.rs` are
//! each a single concern `Terminal` delegates to.

pub mod keys;
pub mod modes;
pub mod mouse;
mod perform;
mod sgr;

pub use keys::{EncodedKey, KeySym, Modifiers};
pub use modes::ModeSet;
pub use mouse::{EncodedMouse, MouseButton, MouseKind};

use crate::buffer::Buffer;
use crate::config::Config;
use crate::deduper::Deduper;
use crate::geometry::{Pos, Region};
use crate::observer::{Observer, Selection};
use crate::style::Style;
use crate::vtparse::Machine;

/// Which gesture a held mouse button is currently driving: reported to the
/// child as a byte sequence, or consumed locally as a selection drag
/// (spec.md §4.3 "Mouse reporting" vs §4.4 "Selection"). The two are
/// mutually exclusive for the lifetime of one press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressKind {
    None,
    Select,
    Report,
}

/// C7: owns the primary and alternate [`Buffer`]s, the active [`ModeSet`],
/// and the running [`Machine`] that turns child bytes into [`Event`]s
/// (spec.md §4.3). Generic over the same [`Deduper`] `Buffer` is, since the
/// primary and alternate screens are two independent buffers (the
/// alternate's `history_limit` pinned at `0`, spec.md §7).
///
/// [`Event`]: crate::vtparse::Event
pub struct Terminal<D: Deduper> {
    pri: Buffer<D>,
    alt: Buffer<D>,
    alt_active: bool,
    modes: ModeSet,
    vt: Machine,
    last_normal: Option<([u8; 4], u8)>,
    press: PressKind,
    select_initial_drag: bool,
    cut_chars: String,
    scroll_on_tty_output: bool,
    scroll_on_tty_key_press: bool,
    scroll_on_paste: bool,
    pending_fix_damage: bool,
    osc667_enabled: bool,
}

impl<D: Deduper> Terminal<D> {
    /// Build a fresh terminal at `rows`x`cols`. `pri_deduper`/`alt_deduper`
    /// are the host's two `Deduper` instances — kept separate because the
    /// alternate screen never grows scroll-back and so never needs one that
    /// retains anything (spec.md §6.1, §7).
    pub fn new(rows: u16, cols: u16, config: &Config, pri_deduper: D, alt_deduper: D) -> Self {
        let rows = i16::try_from(rows).unwrap_or(i16::MAX).max(1);
        let cols = i16::try_from(cols).unwrap_or(i16::MAX).max(1);

        let mut pri = Buffer::new(rows, cols, config.effective_history_limit(), pri_deduper);
        pri.set_scroll_with_history(config.scroll_with_history);
        pri.set_traditional_wrapping(config.traditional_wrapping);

        let mut alt = Buffer::new(rows, cols, 0, alt_deduper);
        alt.set_traditional_wrapping(config.traditional_wrapping);

        Self {
            pri,
            alt,
            alt_active: false,
            modes: ModeSet::default(),
            vt: Machine::new(),
            last_normal: None,
            press: PressKind::None,
            select_initial_drag: true,
            cut_chars: config.cut_chars.clone(),
            scroll_on_tty_output: config.scroll_on_tty_output,
            scroll_on_tty_key_press: config.scroll_on_tty_key_press,
            scroll_on_paste: config.scroll_on_paste,
            pending_fix_damage: false,
            osc667_enabled: false,
        }
    }

    pub fn active(&self) -> &Buffer<D> {
        if self.alt_active {
            &self.alt
        } else {
            &self.pri
        }
    }

    fn active_mut(&mut self) -> &mut Buffer<D> {
        if self.alt_active {
            &mut self.alt
        } else {
            &mut self.pri
        }
    }

    pub fn is_alt_screen(&self) -> bool {
        self.alt_active
    }

    pub fn modes(&self) -> ModeSet {
        self.modes
    }

    /// `OSC 667` (spec.md §6.5) is disabled by default: unlike the rest of
    /// this core's OSC handling, it asks the host to resize the whole
    /// terminal off a bare escape sequence, so a host opts in explicitly
    /// (DESIGN.md records this as the resolution of an Open Question).
    pub fn set_osc667_enabled(&mut self, enabled: bool) {
        self.osc667_enabled = enabled;
    }

    /// Feed a chunk of bytes read from the child, dispatching every event it
    /// produces against the active buffer (spec.md §4.3). Scrolls the
    /// viewport back to the bottom afterwards when `scroll_on_tty_output`
    /// is configured and the child actually produced output.
    pub fn feed(&mut self, bytes: &[u8], observer: &mut impl Observer) {
        let events = self.vt.feed(bytes);
        for event in events {
            perform::dispatch_event(self, event, observer);
        }
        if self.pending_fix_damage {
            self.pending_fix_damage = false;
            self.dispatch(observer);
        }
        if self.scroll_on_tty_output && self.active().scroll_offset() != 0 {
            self.active_mut().set_scroll_offset(0);
        }
    }

    /// Run one damage-driven render pass over the active buffer (spec.md
    /// §4.4, §5). A no-op if the host declines via
    /// `terminal_fix_damage_begin`.
    pub fn dispatch(&mut self, observer: &mut impl Observer) {
        if !observer.terminal_fix_damage_begin() {
            return;
        }
        let reverse = self.modes.contains(ModeSet::REVERSE);
        let show_cursor = self.modes.contains(ModeSet::SHOW_CURSOR);
        let rows = self.active().rows();
        let cols = self.active().cols();
        let history_len = self.active().history_len() as u32;
        let scroll_offset = self.active().scroll_offset();

        observer.terminal_draw_scrollbar(u32::from(rows as u16) + history_len, scroll_offset, rows as u16);
        self.active_mut().dispatch(reverse, show_cursor, observer);
        observer.terminal_fix_damage_end(Region::new(Pos::new(0, 0), Pos::new(rows, cols)), history_len > 0);
    }

    /// Resize both screens to `rows`x`cols`: the primary reflows, the
    /// alternate clips (spec.md §4.4 "Resize", §7).
    pub fn resize(&mut self, rows: u16, cols: u16) -> crate::error::Result<()> {
        let rows = i16::try_from(rows).unwrap_or(i16::MAX);
        let cols = i16::try_from(cols).unwrap_or(i16::MAX);
        self.pri.resize_reflow(rows, cols)?;
        self.alt.resize_clip(rows, cols)?;
        Ok(())
    }

    /// `ESC c` (RIS): reset modes, margins, cursor style and both screens to
    /// their initial state (spec.md §4.3 "`c` → full reset"), then tell the
    /// host to restore its window title and icon to their startup values,
    /// matching terminol's `Terminal::resetAll`.
    fn reset_to_initial_state(&mut self, observer: &mut impl Observer) {
        self.modes = ModeSet::default();
        self.alt_active = false;
        self.last_normal = None;
        self.press = PressKind::None;

        let (rows, cols) = (self.pri.rows(), self.pri.cols());
        self.pri.set_cursor_style(Style::default());
        let _ = self.pri.move_cursor(Pos::new(0, 0), false);
        self.pri.reset_margins();
        self.pri.clear();

        self.alt.resize_clip(rows, cols).expect("alt screen resized to the primary's own valid geometry");
        self.alt.set_cursor_style(Style::default());
        self.alt.clear();

        observer.terminal_reset_title_and_icon();
    }

    // ---- Key input ------------------------------------------------------

    /// Encode one key press into the bytes to send the child (spec.md §4.3
    /// "Key input"). Resets the scroll-back viewport when
    /// `scroll_on_tty_key_press` is configured. Key-binding interception
    /// (font size, copy/paste shortcuts, etc.) is the host's job, performed
    /// before a press ever reaches this call (spec.md §1 Non-goals).
    pub fn key_input(&mut self, key: KeySym, mods: Modifiers) -> Option<EncodedKey> {
        let encoded = keys::encode_key(key, mods, self.modes)?;
        if self.scroll_on_tty_key_press {
            self.active_mut().set_scroll_offset(0);
        }
        Some(encoded)
    }

    /// Wrap pasted `text` in `ESC[200~`/`ESC[201~` when `BRACKETED_PASTE` is
    /// active (spec.md §4.3), and reset the scroll-back viewport when
    /// `scroll_on_paste` is configured.
    pub fn paste_input(&mut self, text: &str) -> Vec<u8> {
        if self.scroll_on_paste {
            self.active_mut().set_scroll_offset(0);
        }
        let bracketed = self.modes.contains(ModeSet::BRACKETED_PASTE);
        let mut out = Vec::with_capacity(text.len() + 12);
        if bracketed {
            out.extend_from_slice(b"\x1b[200~");
        }
        out.extend_from_slice(text.as_bytes());
        if bracketed {
            out.extend_from_slice(b"\x1b[201~");
        }
        out
    }

    // ---- Mouse input ------------------------------------------------------

    /// Whether a press right now should be reported to the child rather
    /// than drive a local selection: some mouse-reporting mode is active,
    /// and Shift isn't held (xterm's own override to force local selection
    /// even while the child wants reports).
    fn reports_mouse(&self, mods: Modifiers) -> bool {
        let reporting = ModeSet::MOUSE_PRESS_RELEASE | ModeSet::MOUSE_DRAG | ModeSet::MOUSE_MOTION;
        self.modes.intersects(reporting) && !mods.contains(Modifiers::SHIFT)
    }

    /// `click_count` is the host's own double/triple-click detection
    /// (timing is a host concern, spec.md §1 Non-goals): `1` marks a point
    /// selection, `>= 2` expands it via `Buffer::expand_selection`. A
    /// middle-click outside of mouse reporting pastes the primary
    /// selection, matching terminol's `Terminal::buttonPress`.
    pub fn mouse_press(
        &mut self,
        button: MouseButton,
        pos: Pos,
        mods: Modifiers,
        click_count: u32,
        observer: &mut impl Observer,
    ) -> Option<EncodedMouse> {
        if self.reports_mouse(mods) {
            self.press = PressKind::Report;
            return mouse::encode_mouse(MouseKind::Press(button), pos, mods, self.modes);
        }
        if button == MouseButton::Middle {
            self.press = PressKind::None;
            observer.terminal_paste(Selection::Primary);
        } else if self.modes.contains(ModeSet::MOUSE_SELECT) {
            self.press = PressKind::Select;
            self.select_initial_drag = true;
            if click_count <= 1 {
                self.active_mut().mark_selection(pos);
            } else {
                let cut_chars = self.cut_chars.clone();
                self.active_mut().expand_selection(pos, click_count, &cut_chars);
            }
        } else {
            self.press = PressKind::None;
        }
        None
    }

    /// Drag while a button from `mouse_press` is still held.
    pub fn mouse_motion(&mut self, pos: Pos, held: Option<MouseButton>, mods: Modifiers) -> Option<EncodedMouse> {
        match self.press {
            PressKind::Select => {
                let initial = self.select_initial_drag;
                self.select_initial_drag = false;
                self.active_mut().delimit_selection(pos, initial);
                None
            }
            PressKind::Report => mouse::encode_mouse(MouseKind::Motion(held), pos, mods, self.modes),
            PressKind::None if self.modes.contains(ModeSet::MOUSE_MOTION) => {
                mouse::encode_mouse(MouseKind::Motion(held), pos, mods, self.modes)
            }
            PressKind::None => None,
        }
    }

    /// Release of the button `mouse_press` started tracking. A completed
    /// local selection is copied into the X11 primary selection, matching
    /// terminol's select-copies-on-release convention.
    pub fn mouse_release(&mut self, button: MouseButton, pos: Pos, mods: Modifiers, observer: &mut impl Observer) -> Option<EncodedMouse> {
        let press = self.press;
        self.press = PressKind::None;
        match press {
            PressKind::Report => mouse::encode_mouse(MouseKind::Release(button), pos, mods, self.modes),
            PressKind::Select => {
                if let Some(text) = self.active().get_selected_text() {
                    if !text.is_empty() {
                        observer.terminal_copy(&text, Selection::Primary);
                    }
                }
                None
            }
            PressKind::None => None,
        }
    }

    /// Wheel tick: reported to the child when a mouse mode wants it,
    /// otherwise scrolls the viewport locally by a few rows.
    pub fn mouse_wheel(&mut self, up: bool, pos: Pos, mods: Modifiers) -> Option<EncodedMouse> {
        if self.reports_mouse(mods) {
            let kind = if up { MouseKind::WheelUp } else { MouseKind::WheelDown };
            return mouse::encode_mouse(kind, pos, mods, self.modes);
        }
        const WHEEL_ROWS: i64 = 3;
        let delta = if up { -WHEEL_ROWS } else { WHEEL_ROWS };
        let buf = self.active_mut();
        let offset = (i64::from(buf.scroll_offset()) - delta).max(0) as u32;
        buf.set_scroll_offset(offset);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduper::InMemoryDeduper;
    use crate::style::{AttrSet, UColor};

    #[derive(Default)]
    struct NullObserver {
        copied: Option<(String, Selection)>,
        pasted: Option<Selection>,
        title_and_icon_reset: bool,
    }

    impl crate::renderer::Renderer for NullObserver {
        fn buffer_draw_bg(&mut self, _pos: Pos, _count: i16, _color: UColor) {}
        fn buffer_draw_fg(&mut self, _pos: Pos, _count: i16, _color: UColor, _attrs: AttrSet, _bytes: &[u8], _size: usize) {}
        fn buffer_draw_cursor(
            &mut self,
            _pos: Pos,
            _fg: UColor,
            _bg: UColor,
            _attrs: AttrSet,
            _bytes: &[u8],
            _size: usize,
            _wrap_next: bool,
        ) {
        }
    }

    impl Observer for NullObserver {
        fn terminal_copy(&mut self, text: &str, selection: Selection) {
            self.copied = Some((text.to_owned(), selection));
        }
        fn terminal_paste(&mut self, selection: Selection) {
            self.pasted = Some(selection);
        }
        fn terminal_resize_local_font(&mut self, _delta: i32) {}
        fn terminal_resize_global_font(&mut self, _delta: i32) {}
        fn terminal_reset_title_and_icon(&mut self) {
            self.title_and_icon_reset = true;
        }
        fn terminal_set_window_title(&mut self, _title: &str, _transient: bool) {}
        fn terminal_set_icon_name(&mut self, _name: &str) {}
        fn terminal_bell(&mut self) {}
        fn terminal_resize_buffer(&mut self, _rows: u16, _cols: u16) {}
        fn terminal_fix_damage_begin(&mut self) -> bool {
            true
        }
        fn terminal_draw_scrollbar(&mut self, _total_rows: u32, _history_offset: u32, _visible_rows: u16) {}
        fn terminal_fix_damage_end(&mut self, _damage: Region, _scrollbar: bool) {}
        fn terminal_reaped(&mut self, _status: i32) {}
    }

    fn terminal() -> Terminal<InMemoryDeduper> {
        Terminal::new(5, 10, &Config::default(), InMemoryDeduper::new(), InMemoryDeduper::new())
    }

    #[test]
    fn key_input_encodes_plain_char() {
        let mut term = terminal();
        let encoded = term.key_input(KeySym::Char('a'), Modifiers::empty()).unwrap();
        assert_eq!(encoded.as_slice(), b"a");
    }

    #[test]
    fn resize_reflows_primary_and_clips_alternate() {
        let mut term = terminal();
        let mut observer = NullObserver::default();
        term.feed(b"\x1b[?1049h", &mut observer);
        term.resize(5, 6).unwrap();
        assert_eq!(term.active().cols(), 6);
    }

    #[test]
    fn mouse_select_and_release_copies_primary_selection() {
        let mut term = terminal();
        let mut observer = NullObserver::default();
        term.feed(b"hello", &mut observer);
        term.modes.insert(ModeSet::MOUSE_SELECT);
        term.mouse_press(MouseButton::Left, Pos::new(0, 0), Modifiers::empty(), 1, &mut observer);
        term.mouse_motion(Pos::new(0, 4), Some(MouseButton::Left), Modifiers::empty());
        term.mouse_release(MouseButton::Left, Pos::new(0, 4), Modifiers::empty(), &mut observer);
        assert_eq!(observer.copied.unwrap().0, "hello");
    }

    #[test]
    fn mouse_press_reports_when_mode_active() {
        let mut term = terminal();
        let mut observer = NullObserver::default();
        term.modes.insert(ModeSet::MOUSE_PRESS_RELEASE | ModeSet::MOUSE_FORMAT_SGR);
        let encoded = term.mouse_press(MouseButton::Left, Pos::new(0, 0), Modifiers::empty(), 1, &mut observer).unwrap();
        assert_eq!(encoded.as_slice(), b"\x1b[<0;1;1M");
    }

    #[test]
    fn middle_click_pastes_primary_selection_when_not_reporting() {
        let mut term = terminal();
        let mut observer = NullObserver::default();
        let encoded = term.mouse_press(MouseButton::Middle, Pos::new(0, 0), Modifiers::empty(), 1, &mut observer);
        assert!(encoded.is_none());
        assert_eq!(observer.pasted, Some(Selection::Primary));
    }

    #[test]
    fn ris_notifies_observer_to_reset_title_and_icon() {
        let mut term = terminal();
        let mut observer = NullObserver::default();
        term.feed(b"\x1bc", &mut observer);
        assert!(observer.title_and_icon_reset);
    }

    #[test]
    fn paste_wraps_in_bracketed_markers_when_mode_set() {
        let mut term = terminal();
        term.modes.insert(ModeSet::BRACKETED_PASTE);
        let out = term.paste_input("hi");
        assert_eq!(out, b"\x1b[200~hi\x1b[201~");
    }
}
