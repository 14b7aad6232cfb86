//! Per-row damage tracking and the dispatch pass (spec.md §3 "Damage", §4.4
//! "Damage and rendering contract"). Kept as a small standalone type so
//! `Buffer`'s mutators can each call `damage.add` without juggling a raw
//! `Vec<Option<(i16, i16)>>` inline.

use super::Buffer;
use crate::deduper::Deduper;
use crate::geometry::Pos;
use crate::renderer::Renderer;
use crate::style::{AttrSet, StockColor, UColor};

/// Half-open `[begin, end)` column ranges needing repaint, one slot per
/// viewport row. `None` means the row is clean.
#[derive(Debug, Clone)]
pub struct Damage {
    rows: Vec<Option<(i16, i16)>>,
}

impl Damage {
    pub fn new(rows: i16) -> Self {
        Self { rows: vec![None; rows.max(0) as usize] }
    }

    pub fn resize(&mut self, rows: i16) {
        self.rows.resize(rows.max(0) as usize, None);
    }

    /// Overwrite this row's damage range.
    pub fn set(&mut self, row: i16, begin: i16, end: i16) {
        if let Some(slot) = self.rows.get_mut(row.max(0) as usize) {
            *slot = Some((begin, end));
        }
    }

    /// Union this range into the row's existing damage.
    pub fn add(&mut self, row: i16, begin: i16, end: i16) {
        if begin >= end {
            return;
        }
        if let Some(slot) = self.rows.get_mut(row.max(0) as usize) {
            *slot = Some(match *slot {
                Some((b, e)) => (b.min(begin), e.max(end)),
                None => (begin, end),
            });
        }
    }

    pub fn set_all(&mut self, cols: i16) {
        for slot in &mut self.rows {
            *slot = Some((0, cols));
        }
    }

    pub fn reset(&mut self) {
        self.rows.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn row(&self, row: i16) -> Option<(i16, i16)> {
        self.rows.get(row.max(0) as usize).copied().flatten()
    }

    pub fn is_clean(&self) -> bool {
        self.rows.iter().all(Option::is_none)
    }
}

impl<D: Deduper> Buffer<D> {
    pub fn damage_set_all(&mut self) {
        self.damage.set_all(self.cols);
    }

    pub fn damage_reset(&mut self) {
        self.damage.reset();
    }

    pub fn damage_is_clean(&self) -> bool {
        self.damage.is_clean()
    }

    /// Fill `out` with the content of viewport row `row`: active content if
    /// `row - scroll_offset >= 0`, else the corresponding historical
    /// segment (spec.md §4.4 "resolve the underlying line... via
    /// `get_line`"). Returns `(cont, wrap)`.
    pub fn get_line(&self, row: i16, out: &mut Vec<crate::cell::Cell>) -> (bool, i16) {
        let apos_row = i32::from(row) - i32::from(self.scroll_offset);
        if apos_row >= 0 {
            let line = &self.active[apos_row as usize];
            out.clear();
            out.extend_from_slice(&line.cells);
            (line.cont, line.wrap)
        } else {
            self.get_historical_line(apos_row, out)
        }
    }

    pub(super) fn get_historical_line(&self, apos_row: i32, out: &mut Vec<crate::cell::Cell>) -> (bool, i16) {
        out.clear();
        let back_index = (-apos_row - 1) as usize;
        let Some(&h) = self.history.len().checked_sub(1 + back_index).and_then(|i| self.history.get(i)) else {
            out.resize(self.cols.max(0) as usize, crate::cell::Cell::default());
            return (false, 0);
        };
        let tag_idx = (h.index - self.lost_tags) as usize;
        let Some(&tag) = self.tags.get(tag_idx) else {
            out.resize(self.cols.max(0) as usize, crate::cell::Cell::default());
            return (false, 0);
        };
        let invalid = self.deduper.invalid_tag();
        let offset = usize::from(h.seqnum) * self.cols.max(0) as usize;
        let (mut cont, mut wrap) = (false, 0i16);
        if tag == invalid {
            let end = (offset + self.cols.max(0) as usize).min(self.pending.len());
            if offset <= self.pending.len() {
                out.extend_from_slice(&self.pending[offset..end]);
            }
            wrap = out.len() as i16;
            cont = end < self.pending.len();
        } else {
            self.deduper.lookup_segment(tag, offset as u32, self.cols.max(0) as u16, out, &mut cont, &mut wrap);
        }
        out.resize(self.cols.max(0) as usize, crate::cell::Cell::default());
        (cont, wrap)
    }

    /// Paint every damaged viewport row through `renderer`, background runs
    /// first and the cursor last (spec.md §4.4, §5 ordering guarantee),
    /// then clear all damage. `reverse` is the global `REVERSE` mode, which
    /// XORs with each cell's own `INVERSE` attribute.
    pub fn dispatch(&mut self, reverse: bool, show_cursor: bool, renderer: &mut impl Renderer) {
        self.dispatching.set(true);
        let mut scratch = Vec::with_capacity(self.cols.max(0) as usize);

        for row in 0..self.rows {
            let Some((begin, end)) = self.damage.row(row) else { continue };
            self.get_line(row, &mut scratch);
            dispatch_bg(row, begin, end, &scratch, reverse, self.selected_range(), renderer);
        }
        for row in 0..self.rows {
            let Some((begin, end)) = self.damage.row(row) else { continue };
            self.get_line(row, &mut scratch);
            dispatch_fg(row, begin, end, &scratch, reverse, self.selected_range(), renderer);
        }

        if show_cursor && self.scroll_offset == 0 {
            let Cursor { pos, style, wrap_next, .. } = self.cursor;
            let mut bytes = [0u8; 4];
            self.get_line(pos.row, &mut scratch);
            let cell = scratch.get(pos.col.max(0) as usize).copied().unwrap_or_default();
            let len = cell.len() as usize;
            bytes[..len].copy_from_slice(&cell.seq[..len]);
            renderer.buffer_draw_cursor(
                pos,
                UColor::Stock(StockColor::CursorText),
                UColor::Stock(StockColor::CursorFill),
                style.attrs,
                &bytes,
                len,
                wrap_next,
            );
        }

        self.damage.reset();
        self.dispatching.set(false);
    }
}

use super::Cursor;

fn dispatch_bg(
    row: i16,
    begin: i16,
    end: i16,
    cells: &[crate::cell::Cell],
    reverse: bool,
    selection: Option<super::SelectionRange>,
    renderer: &mut impl Renderer,
) {
    let mut col = begin;
    while col < end {
        let color = resolve_bg(row, col, cells, reverse, selection);
        let run_start = col;
        col += 1;
        while col < end && resolve_bg(row, col, cells, reverse, selection) == color {
            col += 1;
        }
        renderer.buffer_draw_bg(Pos::new(row, run_start), col - run_start, color);
    }
}

fn resolve_bg(
    row: i16,
    col: i16,
    cells: &[crate::cell::Cell],
    reverse: bool,
    selection: Option<super::SelectionRange>,
) -> UColor {
    let cell = cells.get(col as usize).copied().unwrap_or_default();
    let selected = selection.is_some_and(|s| s.contains(row, col));
    let inverted = reverse ^ cell.style.attrs.contains(AttrSet::INVERSE);
    if selected {
        return UColor::Stock(StockColor::SelectBg);
    }
    if inverted { cell.style.fg } else { cell.style.bg }
}

fn dispatch_fg(
    row: i16,
    begin: i16,
    end: i16,
    cells: &[crate::cell::Cell],
    reverse: bool,
    selection: Option<super::SelectionRange>,
    renderer: &mut impl Renderer,
) {
    let mut col = begin;
    let mut bytes = [0u8; 64];
    while col < end {
        let (color, attrs) = resolve_fg(row, col, cells, reverse, selection);
        let run_start = col;
        let mut len = 0usize;
        let mut count = 0i16;
        loop {
            let cell = cells.get(col as usize).copied().unwrap_or_default();
            let glyph_len = cell.len() as usize;
            if len + glyph_len > bytes.len() {
                break;
            }
            bytes[len..len + glyph_len].copy_from_slice(&cell.seq[..glyph_len]);
            len += glyph_len;
            count += 1;
            col += 1;
            // Break the run on any multi-byte glyph (spec.md §4.4 "to avoid
            // advance-width assumptions"), and whenever style changes.
            if glyph_len > 1 || col >= end || resolve_fg(row, col, cells, reverse, selection) != (color, attrs) {
                break;
            }
        }
        renderer.buffer_draw_fg(Pos::new(row, run_start), count, color, attrs, &bytes, len);
    }
}

fn resolve_fg(
    row: i16,
    col: i16,
    cells: &[crate::cell::Cell],
    reverse: bool,
    selection: Option<super::SelectionRange>,
) -> (UColor, AttrSet) {
    let cell = cells.get(col as usize).copied().unwrap_or_default();
    let selected = selection.is_some_and(|s| s.contains(row, col));
    let inverted = reverse ^ cell.style.attrs.contains(AttrSet::INVERSE);
    let color = if selected {
        UColor::Stock(StockColor::SelectFg)
    } else if inverted {
        cell.style.bg
    } else {
        cell.style.fg
    };
    (color, cell.style.attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduper::InMemoryDeduper;

    struct Recorder {
        bg_runs: Vec<(Pos, i16, UColor)>,
        fg_runs: Vec<(Pos, i16)>,
        cursor_drawn: bool,
    }

    impl Renderer for Recorder {
        fn buffer_draw_bg(&mut self, pos: Pos, count: i16, color: UColor) {
            self.bg_runs.push((pos, count, color));
        }
        fn buffer_draw_fg(&mut self, pos: Pos, count: i16, _color: UColor, _attrs: AttrSet, _bytes: &[u8], _size: usize) {
            self.fg_runs.push((pos, count));
        }
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
            self.cursor_drawn = true;
        }
    }

    #[test]
    fn dispatch_emits_one_run_per_damaged_row_and_clears_damage() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(2, 4, 10, InMemoryDeduper::new());
        buf.write([b'A', 0, 0, 0], 1, true, false).unwrap();
        let mut recorder = Recorder { bg_runs: Vec::new(), fg_runs: Vec::new(), cursor_drawn: false };
        buf.dispatch(false, true, &mut recorder);
        assert!(!recorder.bg_runs.is_empty());
        assert!(!recorder.fg_runs.is_empty());
        assert!(recorder.cursor_drawn);
        assert!(buf.damage_is_clean());
    }

    #[test]
    fn dispatch_skips_cursor_when_scrolled_back() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(2, 4, 10, InMemoryDeduper::new());
        buf.write([b'A', 0, 0, 0], 1, true, false).unwrap();
        buf.forward_index(true);
        buf.forward_index(true); // scrolls the first row into history
        buf.set_scroll_offset(1);
        let mut recorder = Recorder { bg_runs: Vec::new(), fg_runs: Vec::new(), cursor_drawn: false };
        buf.dispatch(false, true, &mut recorder);
        assert!(!recorder.cursor_drawn);
    }
}
