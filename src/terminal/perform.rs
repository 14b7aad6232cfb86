//! VT event → `Buffer` mutation dispatch (spec.md §4.3 "VT event dispatch").
//! This is `Terminal`'s half of what the teacher's `ansi_parser::perform`
//! module does for its `OffscreenBuffer`: turn one parsed [`Event`] into
//! the corresponding `Buffer`/mode/observer call. Kept as a free function
//! over `&mut Terminal` rather than a method so the match arms stay flat,
//! matching the teacher's `csi_dispatch` routing through small per-opcode
//! functions in `operations/*.rs`.

use crate::charset::{self, CharSet};
use crate::deduper::Deduper;
use crate::geometry::Pos;
use crate::observer::Observer;
use crate::vtparse::{nth_arg, nth_arg_raw, Event};

use super::modes::{self, ModeSet};
use super::sgr::apply_sgr;
use super::Terminal;

pub(super) fn dispatch_event<D: Deduper>(term: &mut Terminal<D>, event: Event, observer: &mut impl Observer) {
    match event {
        Event::Normal { seq, len } => {
            let auto_wrap = term.modes.contains(ModeSet::AUTO_WRAP);
            let insert = term.modes.contains(ModeSet::INSERT);
            let _ = term.active_mut().write(seq, len, auto_wrap, insert);
            term.last_normal = Some((seq, len));
        }
        Event::Control(byte) => control(term, byte, observer),
        Event::SimpleEsc { inters, code } => simple_esc(term, &inters, code, observer),
        Event::CsiEsc { priv_marker, args, inters, mode } => csi(term, priv_marker, &args, &inters, mode),
        Event::OscEsc { args } => osc(term, &args, observer),
        Event::DcsEsc { .. } => {
            // No DCS consumer in this core (spec.md §1 Non-goals); retained
            // in `vtparse::Event` purely so a host can log/inspect it.
        }
    }
}

fn control<D: Deduper>(term: &mut Terminal<D>, byte: u8, observer: &mut impl Observer) {
    let auto_wrap = term.modes.contains(ModeSet::AUTO_WRAP);
    match byte {
        0x07 => observer.terminal_bell(),
        0x08 => term.active_mut().backspace(auto_wrap),
        0x09 => term.active_mut().tab_forward(1),
        0x0A | 0x0B | 0x0C => {
            let cr_on_lf = term.modes.contains(ModeSet::CR_ON_LF);
            term.active_mut().forward_index(cr_on_lf);
        }
        0x0D => {
            let row = term.active().cursor().pos.row;
            let _ = term.active_mut().move_cursor(Pos::new(row, 0), false);
        }
        0x0E => term.active_mut().set_cursor_charset(CharSet::G1),
        0x0F => term.active_mut().set_cursor_charset(CharSet::G0),
        _ => {}
    }
}

fn simple_esc<D: Deduper>(term: &mut Terminal<D>, inters: &[u8], code: u8, observer: &mut impl Observer) {
    if let Some(&designator @ (b'(' | b')' | b'*' | b'+')) = inters.first() {
        if let Some(sub) = charset::lookup(code) {
            let set = match designator {
                b'(' => CharSet::G0,
                b')' => CharSet::G1,
                b'*' => CharSet::G2,
                _ => CharSet::G3,
            };
            term.active_mut().designate_charset(set, sub);
        }
        return;
    }

    match code {
        b'7' => term.active_mut().save_cursor(),
        b'8' => term.active_mut().restore_cursor(),
        b'D' => term.active_mut().forward_index(false),
        b'M' => term.active_mut().reverse_index(),
        b'E' => term.active_mut().forward_index(true),
        b'H' => {
            let col = term.active().cursor().pos.col;
            term.active_mut().set_tab(col);
        }
        b'=' => term.modes.insert(ModeSet::APPKEYPAD),
        b'>' => term.modes.remove(ModeSet::APPKEYPAD),
        b'c' => term.reset_to_initial_state(observer),
        _ => {}
    }
}

fn switch_alt_screen<D: Deduper>(term: &mut Terminal<D>, enter: bool, save_cursor: bool) {
    if enter == term.alt_active {
        return;
    }
    if enter {
        if save_cursor {
            term.pri.save_cursor();
        }
        let (rows, cols) = (term.pri.rows(), term.pri.cols());
        term.alt.resize_clip(rows, cols).expect("alt screen resized to the primary's own valid geometry");
        term.alt.clear();
        term.alt_active = true;
    } else {
        term.alt_active = false;
        if save_cursor {
            term.pri.restore_cursor();
        }
    }
}

fn sm_rm<D: Deduper>(term: &mut Terminal<D>, priv_marker: Option<u8>, args: &[u16], set: bool) {
    for &n in args {
        if priv_marker == Some(b'?') {
            match n {
                47 | 1047 => switch_alt_screen(term, set, false),
                1049 => switch_alt_screen(term, set, true),
                _ => {
                    if let Some(bit) = modes::private_mode(n) {
                        term.modes.set(bit, set);
                    }
                }
            }
        } else if let Some(bit) = modes::ansi_mode(n) {
            term.modes.set(bit, set);
        }
    }
}

fn csi<D: Deduper>(term: &mut Terminal<D>, priv_marker: Option<u8>, args: &[u16], _inters: &[u8], mode: char) {
    let one = |n: usize| i16::try_from(nth_arg(args, n, 1)).unwrap_or(i16::MAX);

    match mode {
        'A' => term.active_mut().move_cursor_relative(-one(0), 0),
        'B' => term.active_mut().move_cursor_relative(one(0), 0),
        'C' | 'a' => term.active_mut().move_cursor_relative(0, one(0)),
        'D' => term.active_mut().move_cursor_relative(0, -one(0)),
        'e' => term.active_mut().move_cursor_relative(one(0), 0),
        'E' => {
            term.active_mut().move_cursor_relative(one(0), 0);
            let row = term.active().cursor().pos.row;
            let _ = term.active_mut().move_cursor(Pos::new(row, 0), false);
        }
        'F' => {
            term.active_mut().move_cursor_relative(-one(0), 0);
            let row = term.active().cursor().pos.row;
            let _ = term.active_mut().move_cursor(Pos::new(row, 0), false);
        }
        'G' | '`' => {
            let col = one(0) - 1;
            let row = term.active().cursor().pos.row;
            let _ = term.active_mut().move_cursor(Pos::new(row, col), false);
        }
        'd' => {
            let row = one(0) - 1;
            let col = term.active().cursor().pos.col;
            let origin = term.modes.contains(ModeSet::ORIGIN);
            let _ = term.active_mut().move_cursor(Pos::new(row, col), origin);
        }
        'H' | 'f' => {
            let row = one(0) - 1;
            let col = one(1) - 1;
            let origin = term.modes.contains(ModeSet::ORIGIN);
            let _ = term.active_mut().move_cursor(Pos::new(row, col), origin);
        }
        'I' => term.active_mut().tab_forward(u32::from(nth_arg(args, 0, 1))),
        'Z' => term.active_mut().tab_backward(u32::from(nth_arg(args, 0, 1))),
        'J' => match nth_arg_raw(args, 0, 0) {
            0 => term.active_mut().clear_below(),
            1 => term.active_mut().clear_above(),
            _ => term.active_mut().clear(),
        },
        'K' => match nth_arg_raw(args, 0, 0) {
            0 => term.active_mut().clear_line_right(),
            1 => term.active_mut().clear_line_left(),
            _ => term.active_mut().clear_line(),
        },
        'L' => term.active_mut().insert_lines(one(0)),
        'M' => term.active_mut().erase_lines(one(0)),
        '@' => term.active_mut().insert_cells(one(0)),
        'P' => term.active_mut().erase_cells(one(0)),
        'X' => term.active_mut().blank_cells(one(0)),
        'S' => term.active_mut().scroll_up_margins(one(0)),
        'T' => term.active_mut().scroll_down_margins(one(0)),
        'r' => {
            let rows = term.active().rows();
            let begin = i16::try_from(nth_arg(args, 0, 1)).unwrap_or(1) - 1;
            let end = i16::try_from(nth_arg_raw(args, 1, rows as u16)).unwrap_or(rows);
            term.active_mut().set_margins(begin, end);
        }
        'g' => match nth_arg_raw(args, 0, 0) {
            3 => term.active_mut().clear_all_tabs(),
            _ => {
                let col = term.active().cursor().pos.col;
                term.active_mut().clear_tab(col);
            }
        },
        'W' => match nth_arg_raw(args, 0, 0) {
            2 | 5 => {
                let col = term.active().cursor().pos.col;
                term.active_mut().set_tab(col);
            }
            _ => {
                let col = term.active().cursor().pos.col;
                term.active_mut().clear_tab(col);
            }
        },
        'b' => {
            if let Some((seq, len)) = term.last_normal {
                let n = u32::from(nth_arg(args, 0, 1));
                let auto_wrap = term.modes.contains(ModeSet::AUTO_WRAP);
                let insert = term.modes.contains(ModeSet::INSERT);
                term.active_mut().repeat_last(seq, len, n, auto_wrap, insert);
            }
        }
        'm' => {
            let mut style = term.active().cursor_style();
            apply_sgr(&mut style, args);
            term.active_mut().set_cursor_style(style);
        }
        'h' => sm_rm(term, priv_marker, args, true),
        'l' => sm_rm(term, priv_marker, args, false),
        's' if priv_marker.is_none() => term.active_mut().save_cursor(),
        'u' if priv_marker.is_none() => term.active_mut().restore_cursor(),
        _ => {}
    }
}

fn osc<D: Deduper>(term: &mut Terminal<D>, args: &[String], observer: &mut impl Observer) {
    let Some(code) = args.first() else { return };
    let text = args.get(1).map(String::as_str).unwrap_or_default();
    match code.as_str() {
        "0" => {
            observer.terminal_set_window_title(text, false);
            observer.terminal_set_icon_name(text);
        }
        "1" => observer.terminal_set_icon_name(text),
        "2" => observer.terminal_set_window_title(text, false),
        "666" => term.pending_fix_damage = true,
        "667" => {
            if term.osc667_enabled {
                if let Some((rows, cols)) = text.split_once(';').and_then(|(r, c)| Some((r.parse().ok()?, c.parse().ok()?))) {
                    observer.terminal_resize_buffer(rows, cols);
                }
            }
        }
        // spec.md §6.5 names OSC 55/112 as recognised; this core has no
        // observer hook for either yet (DESIGN.md records the decision),
        // so they're parsed and discarded rather than silently unmatched.
        "55" | "112" => tracing::trace!(code = %code, "recognised OSC with no observer effect"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduper::InMemoryDeduper;
    use crate::geometry::Region;
    use crate::observer::Selection;
    use crate::renderer::Renderer;
    use crate::style::{AttrSet, UColor};

    #[derive(Default)]
    struct Recorder {
        bell_calls: u32,
        title_calls: u32,
        titles: Vec<String>,
    }

    impl Renderer for Recorder {
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

    impl Observer for Recorder {
        fn terminal_copy(&mut self, _text: &str, _selection: Selection) {}
        fn terminal_paste(&mut self, _selection: Selection) {}
        fn terminal_resize_local_font(&mut self, _delta: i32) {}
        fn terminal_resize_global_font(&mut self, _delta: i32) {}
        fn terminal_reset_title_and_icon(&mut self) {}
        fn terminal_set_window_title(&mut self, title: &str, _transient: bool) {
            self.title_calls += 1;
            self.titles.push(title.to_owned());
        }
        fn terminal_set_icon_name(&mut self, _name: &str) {}
        fn terminal_bell(&mut self) {
            self.bell_calls += 1;
        }
        fn terminal_resize_buffer(&mut self, _rows: u16, _cols: u16) {}
        fn terminal_fix_damage_begin(&mut self) -> bool {
            true
        }
        fn terminal_draw_scrollbar(&mut self, _total_rows: u32, _history_offset: u32, _visible_rows: u16) {}
        fn terminal_fix_damage_end(&mut self, _damage: Region, _scrollbar: bool) {}
        fn terminal_reaped(&mut self, _status: i32) {}
    }

    fn terminal() -> Terminal<InMemoryDeduper> {
        Terminal::new(5, 10, &crate::config::Config::default(), InMemoryDeduper::new(), InMemoryDeduper::new())
    }

    #[test]
    fn csi_cursor_position_moves_cursor() {
        // Scenario 3 (spec.md §8).
        let mut term = terminal();
        let mut observer = Recorder::default();
        term.feed(b"\x1b[3;4HX", &mut observer);
        assert_eq!(term.active().cursor().pos, Pos::new(2, 4));
    }

    #[test]
    fn bell_control_byte_notifies_observer() {
        let mut term = terminal();
        let mut observer = Recorder::default();
        term.feed(b"\x07", &mut observer);
        assert_eq!(observer.bell_calls, 1);
    }

    #[test]
    fn osc_0_sets_window_title() {
        let mut term = terminal();
        let mut observer = Recorder::default();
        term.feed(b"\x1b]0;hello\x07", &mut observer);
        assert_eq!(observer.titles, vec!["hello".to_owned()]);
    }

    #[test]
    fn sgr_red_then_reset_updates_cursor_style() {
        let mut term = terminal();
        let mut observer = Recorder::default();
        term.feed(b"\x1b[31m", &mut observer);
        assert_eq!(term.active().cursor_style().fg, crate::style::UColor::Indexed(1));
        term.feed(b"\x1b[0m", &mut observer);
        assert_eq!(term.active().cursor_style().fg, crate::style::UColor::default_fg());
    }

    #[test]
    fn private_mode_1049_switches_to_alt_screen_and_back() {
        let mut term = terminal();
        let mut observer = Recorder::default();
        term.feed(b"X", &mut observer);
        term.feed(b"\x1b[?1049h", &mut observer);
        assert!(term.is_alt_screen());
        term.feed(b"\x1b[?1049l", &mut observer);
        assert!(!term.is_alt_screen());
    }

    #[test]
    fn ris_resets_cursor_position() {
        let mut term = terminal();
        let mut observer = Recorder::default();
        term.feed(b"\x1b[3;4H\x1bc", &mut observer);
        assert_eq!(term.active().cursor().pos, Pos::new(0, 0));
    }
}
