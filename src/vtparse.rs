//! C2: the VT/ANSI state machine (spec.md §4.2).
//!
//! terminol hand-rolls the canonical DEC "Williams" parser diagram itself
//! (`common/machine.hxx`); the teacher's `ansi_parser` module instead builds
//! on the `vte` crate (the same state machine, maintained independently and
//! shared with Alacritty) and layers its own `Handler`/`Perform` glue on
//! top. `vtcore` follows the teacher: `vte::Parser` drives the byte
//! classification and UTF-8 recognition, and this module's `Performer`
//! turns `vte::Perform` callbacks into the flat [`Event`] enum spec.md §4.2
//! names, so `Terminal` (C7) consumes the same vocabulary
//! (`Normal`/`Control`/`SimpleEsc`/`CsiEsc`/`DcsEsc`/`OscEsc`) the spec
//! describes rather than `vte`'s own trait shape.

use smallvec::SmallVec;
use vte::{Params, Perform};

/// A CSI/ESC private marker byte (`<`, `=`, `>`, `?`), retained alongside
/// the parameter list (spec.md §4.2 "Private-marker bytes").
pub type Intermediates = SmallVec<[u8; 2]>;

/// One parsed unit of the byte stream (spec.md §4.2 "Emitted events").
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A single grapheme's worth of printable text: `seq[..len]` holds its
    /// UTF-8 bytes.
    Normal { seq: [u8; 4], len: u8 },
    /// A C0/C1 control byte (BS, HT, LF, CR, BEL, ...).
    Control(u8),
    /// `ESC` followed by optional intermediates and a final byte, outside
    /// CSI/OSC/DCS (e.g. `ESC 7`, `ESC c`, `ESC ( B`).
    SimpleEsc { inters: Intermediates, code: u8 },
    /// `CSI ... final`. `priv_marker` is the `< = > ?` byte preceding the
    /// parameters, when present. `args` is the flattened, semicolon
    /// separated parameter list (spec.md §4.2: "empty arguments are
    /// absent"); colon-separated subparameters collapse to their first
    /// value, which covers every sequence this core recognises.
    CsiEsc { priv_marker: Option<u8>, args: SmallVec<[u16; 8]>, inters: Intermediates, mode: char },
    /// `DCS ... ST`: the raw passthrough payload between `hook` and
    /// `unhook`. The core has no DCS consumer (spec.md §1 Non-goals); this
    /// is retained so a host can still observe/log it.
    DcsEsc { seq: Vec<u8> },
    /// `OSC ... (BEL|ST)`, split on `;` (spec.md §4.2 "OSC termination").
    OscEsc { args: Vec<String> },
}

/// Wraps a `vte::Parser`, translating its callback-shaped API into a
/// pulled sequence of [`Event`]s, which is what `Buffer`/`Terminal`'s own
/// tests and `Terminal::feed` want to iterate over.
#[derive(Default)]
pub struct Machine {
    parser: vte::Parser,
}

impl Machine {
    pub fn new() -> Self {
        Self { parser: vte::Parser::new() }
    }

    /// Feed a chunk of bytes from the child, returning every [`Event`] it
    /// produced, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Event> {
        let mut performer = Performer::default();
        self.parser.advance(&mut performer, bytes);
        performer.events
    }
}

#[derive(Default)]
struct Performer {
    events: Vec<Event>,
    dcs_buf: Vec<u8>,
}

fn priv_marker(intermediates: &[u8]) -> (Option<u8>, &[u8]) {
    match intermediates.first() {
        Some(&b) if matches!(b, b'<' | b'=' | b'>' | b'?') => (Some(b), &intermediates[1..]),
        _ => (None, intermediates),
    }
}

fn flatten_params(params: &Params) -> SmallVec<[u16; 8]> {
    params.iter().map(|sub| *sub.first().unwrap_or(&0)).collect()
}

impl Perform for Performer {
    fn print(&mut self, c: char) {
        let mut seq = [0u8; 4];
        let len = c.encode_utf8(&mut seq).len() as u8;
        self.events.push(Event::Normal { seq, len });
    }

    fn execute(&mut self, byte: u8) {
        // `ESC` itself never reaches `execute`; CAN/SUB are swallowed
        // silently by `vte` (it resets to ground), matching spec.md §4.2's
        // "emit nothing, return to GROUND".
        self.events.push(Event::Control(byte));
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _action: char) {
        self.dcs_buf.clear();
    }

    fn put(&mut self, byte: u8) {
        self.dcs_buf.push(byte);
    }

    fn unhook(&mut self) {
        self.events.push(Event::DcsEsc { seq: std::mem::take(&mut self.dcs_buf) });
    }

    fn osc_dispatch(&mut self, params: &[&[u8]], _bell_terminated: bool) {
        let args = params.iter().map(|p| String::from_utf8_lossy(p).into_owned()).collect();
        self.events.push(Event::OscEsc { args });
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        if ignore {
            return;
        }
        let (priv_marker, inters) = priv_marker(intermediates);
        self.events.push(Event::CsiEsc {
            priv_marker,
            args: flatten_params(params),
            inters: Intermediates::from_slice(inters),
            mode: action,
        });
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], ignore: bool, byte: u8) {
        if ignore {
            return;
        }
        self.events.push(Event::SimpleEsc { inters: Intermediates::from_slice(intermediates), code: byte });
    }
}

/// Fetch the `n`th argument (0-based), or `fallback` if absent or present
/// but zero — the convention xterm-class CSI handlers use throughout
/// (spec.md §4.2 "callers use `nth_arg(n, fallback)`").
pub fn nth_arg(args: &[u16], n: usize, fallback: u16) -> u16 {
    match args.get(n) {
        Some(&0) | None => fallback,
        Some(&v) => v,
    }
}

/// Like [`nth_arg`] but `0` is a legitimate value (used for SGR colour
/// indices and similar, where a genuine zero parameter must not be
/// reinterpreted as "absent").
pub fn nth_arg_raw(args: &[u16], n: usize, fallback: u16) -> u16 {
    args.get(n).copied().unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_text_emits_one_event_per_codepoint() {
        let mut machine = Machine::new();
        let events = machine.feed("AB".as_bytes());
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::Normal { seq: [b'A', 0, 0, 0], len: 1 }));
    }

    #[test]
    fn control_bytes_are_reported_individually() {
        let mut machine = Machine::new();
        let events = machine.feed(b"\n\t");
        assert_eq!(events, vec![Event::Control(b'\n'), Event::Control(b'\t')]);
    }

    #[test]
    fn csi_cursor_move_parses_args_and_final() {
        let mut machine = Machine::new();
        let events = machine.feed(b"\x1b[3;4H");
        match &events[0] {
            Event::CsiEsc { priv_marker, args, mode, .. } => {
                assert_eq!(*priv_marker, None);
                assert_eq!(args.as_slice(), &[3, 4]);
                assert_eq!(*mode, 'H');
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn csi_private_mode_retains_marker() {
        let mut machine = Machine::new();
        let events = machine.feed(b"\x1b[?1049h");
        match &events[0] {
            Event::CsiEsc { priv_marker, args, mode, .. } => {
                assert_eq!(*priv_marker, Some(b'?'));
                assert_eq!(args.as_slice(), &[1049]);
                assert_eq!(*mode, 'h');
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn osc_splits_on_semicolon() {
        let mut machine = Machine::new();
        let events = machine.feed(b"\x1b]0;my title\x07");
        assert_eq!(events, vec![Event::OscEsc { args: vec!["0".to_owned(), "my title".to_owned()] }]);
    }

    #[test]
    fn simple_esc_carries_intermediates() {
        let mut machine = Machine::new();
        let events = machine.feed(b"\x1b(B");
        assert_eq!(events, vec![Event::SimpleEsc { inters: Intermediates::from_slice(b"("), code: b'B' }]);
    }

    #[test]
    fn nth_arg_falls_back_on_absent_or_zero() {
        let args: SmallVec<[u16; 8]> = SmallVec::from_slice(&[0, 5]);
        assert_eq!(nth_arg(&args, 0, 1), 1);
        assert_eq!(nth_arg(&args, 1, 1), 5);
        assert_eq!(nth_arg(&args, 2, 7), 7);
    }
}
