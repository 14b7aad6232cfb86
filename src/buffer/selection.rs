//! Selection: mark/delimit/expand and the damage/rendering glue that turns
//! `select_mark`/`select_delim` into highlighted cells (spec.md §4.4
//! "Selection"). Grounded in terminol's `Buffer::markSelection`,
//! `delimitSelection`, `expandSelection`, `clearSelection`,
//! `getSelectedText` and `isCellSelected` (`common/buffer.cxx`).
//!
//! One deliberate simplification versus terminol (recorded in DESIGN.md):
//! word expansion (`expand_selection` level 2) stops at the row boundary
//! rather than crossing a `cont`-wrapped line, and cell-selected tests
//! (`SelectionRange::contains`) don't special-case highlighting the
//! implicit trailing newline past a short `wrap`.

use regex::Regex;

use super::Buffer;
use crate::cell::Cell;
use crate::deduper::Deduper;
use crate::geometry::{APos, Pos};

/// A normalised `[begin, end)` selection span in viewport coordinates, as
/// returned by `Buffer::selected_range` for the damage dispatch pass.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRange {
    begin: Pos,
    end: Pos,
}

impl SelectionRange {
    pub fn contains(&self, row: i16, col: i16) -> bool {
        if row < self.begin.row || row > self.end.row {
            return false;
        }
        if row == self.begin.row && col < self.begin.col {
            return false;
        }
        if row == self.end.row && col >= self.end.col {
            return false;
        }
        true
    }
}

fn cell_str(cell: &Cell) -> &str {
    std::str::from_utf8(&cell.seq[..cell.len() as usize]).unwrap_or(" ")
}

impl<D: Deduper> Buffer<D> {
    fn normalise_selection(&self) -> Option<(APos, APos)> {
        if self.select_mark == self.select_delim {
            None
        } else if self.select_mark < self.select_delim {
            Some((self.select_mark, self.select_delim))
        } else {
            Some((self.select_delim, self.select_mark))
        }
    }

    /// The current selection, converted to viewport coordinates, for
    /// `dispatch`'s bg/fg runs. `None` when there's no selection, or when
    /// it's entirely scrolled out of view.
    pub fn selected_range(&self) -> Option<SelectionRange> {
        let (begin, end) = self.normalise_selection()?;
        let to_pos = |a: APos| Pos::new((a.row + i32::from(self.scroll_offset)) as i16, a.col);
        Some(SelectionRange { begin: to_pos(begin), end: to_pos(end) })
    }

    pub(super) fn damage_selection(&mut self) {
        if let Some(range) = self.selected_range() {
            let lo = range.begin.row.max(0);
            let hi = (range.end.row).min(self.rows - 1);
            for row in lo..=hi {
                self.damage.add(row, 0, self.cols);
            }
        }
    }

    fn apos_to_offset(&self, a: APos) -> i64 {
        i64::from(a.row) * i64::from(self.cols.max(1)) + i64::from(a.col)
    }

    fn offset_to_apos(&self, offset: i64) -> APos {
        let cols = i64::from(self.cols.max(1));
        APos::new((offset.div_euclid(cols)) as i32, offset.rem_euclid(cols) as i16)
    }

    fn cell_at(&self, apos: APos) -> Option<Cell> {
        let viewport_row = apos.row + i32::from(self.scroll_offset);
        if viewport_row < 0 || viewport_row >= i32::from(self.rows) {
            return None;
        }
        let mut scratch = Vec::new();
        let (_, wrap) = self.get_line(viewport_row as i16, &mut scratch);
        if apos.col < 0 || apos.col >= wrap {
            return None;
        }
        scratch.get(apos.col as usize).copied()
    }

    fn paragraph_start(&self, row: i32) -> i32 {
        let mut r = row;
        loop {
            let prev = r - 1;
            let viewport_row = prev + i32::from(self.scroll_offset);
            let prev_cont = if viewport_row < 0 || viewport_row >= i32::from(self.rows) {
                false
            } else {
                let mut scratch = Vec::new();
                self.get_line(viewport_row as i16, &mut scratch).0
            };
            if !prev_cont {
                return r;
            }
            r = prev;
        }
    }

    fn paragraph_end(&self, row: i32) -> i32 {
        let mut r = row;
        loop {
            let viewport_row = r + i32::from(self.scroll_offset);
            let cont = if viewport_row < 0 || viewport_row >= i32::from(self.rows) {
                false
            } else {
                let mut scratch = Vec::new();
                self.get_line(viewport_row as i16, &mut scratch).0
            };
            if !cont {
                return r;
            }
            r += 1;
        }
    }

    /// `markSelection`: start a fresh selection at a clicked/pressed
    /// position, collapsed to a single point.
    pub fn mark_selection(&mut self, pos: Pos) {
        self.damage_selection();
        let apos = APos::from_viewport(pos, self.scroll_offset);
        self.select_mark = apos;
        self.select_delim = apos;
        self.damage_selection();
    }

    /// `delimitSelection`: extend/shrink the selection by dragging its far
    /// endpoint to `pos`. On the initial drag tick (`initial`), the mark and
    /// delimiter are first ordered, then swapped if `pos` falls on the
    /// mark's side of their midpoint, so dragging past the original anchor
    /// extends from the *other* end rather than collapsing.
    pub fn delimit_selection(&mut self, pos: Pos, initial: bool) {
        self.damage_selection();
        let apos = APos::from_viewport(pos, self.scroll_offset);
        if initial {
            if self.select_mark > self.select_delim {
                std::mem::swap(&mut self.select_mark, &mut self.select_delim);
            }
            let mark_off = self.apos_to_offset(self.select_mark);
            let delim_off = self.apos_to_offset(self.select_delim);
            let centre = self.offset_to_apos(mark_off + (delim_off - mark_off) / 2);
            if apos < centre {
                std::mem::swap(&mut self.select_mark, &mut self.select_delim);
            }
        }
        self.select_delim = apos;
        self.damage_selection();
    }

    /// `expandSelection`: click-count driven selection granularity.
    /// `level % 4`: 1 = single cell, 2 = word (via `cut_chars`), 3 (or
    /// landing on whitespace/off-buffer) = whole paragraph.
    pub fn expand_selection(&mut self, pos: Pos, level: u32, cut_chars: &str) {
        let level = level % 4;
        self.damage_selection();
        if self.select_mark > self.select_delim {
            std::mem::swap(&mut self.select_mark, &mut self.select_delim);
        }
        let apos = APos::from_viewport(pos, self.scroll_offset);

        if level == 1 {
            self.select_mark = apos;
            self.select_delim = apos;
        } else {
            let re = Regex::new(&format!("[{cut_chars}]")).ok();
            let at_boundary = match self.cell_at(apos) {
                Some(cell) => cell.is_blank() || re.as_ref().is_some_and(|re| re.is_match(cell_str(&cell))),
                None => true,
            };
            if level == 3 || at_boundary {
                self.select_mark = APos::new(self.paragraph_start(apos.row), 0);
                self.select_delim = APos::new(self.paragraph_end(apos.row), self.cols);
            } else if let Some(re) = re {
                let is_word = |cell: Cell| !cell.is_blank() && !re.is_match(cell_str(&cell));
                let mut col = apos.col;
                while col > 0 {
                    match self.cell_at(APos::new(apos.row, col - 1)) {
                        Some(cell) if is_word(cell) => col -= 1,
                        _ => break,
                    }
                }
                self.select_mark = APos::new(apos.row, col);

                let mut col = apos.col;
                loop {
                    match self.cell_at(APos::new(apos.row, col)) {
                        Some(cell) if is_word(cell) => col += 1,
                        _ => break,
                    }
                }
                self.select_delim = APos::new(apos.row, col);
            }
        }
        self.damage_selection();
    }

    /// `clearSelection`: collapse the selection to nothing. If the mark had
    /// already scrolled off the retained history, it's reset to the origin
    /// rather than left dangling.
    pub fn clear_selection(&mut self) {
        self.damage_selection();
        if mark_fell_off_history(self.history.len(), self.select_mark.row) {
            self.select_mark = APos::default();
        }
        self.select_delim = self.select_mark;
    }

    /// Drop the current selection if it overlaps `[begin, end)` (absolute
    /// coordinates) — called by every cell/line mutator so edited text never
    /// carries a stale highlight (spec.md §4.4 "mutation clears any
    /// selection it touches").
    pub(super) fn clear_selection_overlapping(&mut self, begin: APos, end: APos) {
        let Some((sel_begin, sel_end)) = self.normalise_selection() else { return };
        if begin < sel_end && sel_begin < end {
            self.clear_selection();
        }
    }

    /// `getSelectedText`: the selected text, rows joined with `\n`. `None`
    /// if there's no selection.
    pub fn get_selected_text(&self) -> Option<String> {
        let (begin, end) = self.normalise_selection()?;
        let mut text = String::new();
        let mut scratch = Vec::new();
        for row in begin.row..=end.row {
            let viewport_row = row + i32::from(self.scroll_offset);
            if viewport_row < 0 || viewport_row >= i32::from(self.rows) {
                continue;
            }
            let (_, wrap) = self.get_line(viewport_row as i16, &mut scratch);
            let start_col = if row == begin.row { begin.col } else { 0 };
            let end_col = if row == end.row { end.col } else { self.cols };
            let mut hit_wrap = false;
            for col in start_col..end_col {
                if col >= wrap {
                    hit_wrap = true;
                    break;
                }
                if let Some(cell) = scratch.get(col as usize) {
                    text.push_str(cell_str(cell));
                }
            }
            if hit_wrap {
                text.push('\n');
            }
        }
        Some(text)
    }
}

/// `history.len() + mark.row < 0`: the mark fell entirely off the retained
/// history after an eviction.
fn mark_fell_off_history(history_len: usize, mark_row: i32) -> bool {
    history_len as i32 + mark_row < 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduper::InMemoryDeduper;
    use pretty_assertions::assert_eq;

    fn write_str(buf: &mut Buffer<InMemoryDeduper>, s: &str) {
        for c in s.chars() {
            let mut seq = [0u8; 4];
            let len = c.encode_utf8(&mut seq).len() as u8;
            buf.write(seq, len, true, false).unwrap();
        }
    }

    #[test]
    fn mark_then_delimit_selects_a_range() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(1, 20, 10, InMemoryDeduper::new());
        write_str(&mut buf, "hello world");
        buf.mark_selection(Pos::new(0, 0));
        buf.delimit_selection(Pos::new(0, 5), true);
        assert_eq!(buf.get_selected_text().unwrap(), "hello");
    }

    #[test]
    fn expand_word_stops_at_cut_chars() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(1, 20, 10, InMemoryDeduper::new());
        write_str(&mut buf, "foo.bar baz");
        buf.expand_selection(Pos::new(0, 1), 2, ",.\"'`()[]{}<>:;|\\ \t");
        assert_eq!(buf.get_selected_text().unwrap(), "foo");
    }

    #[test]
    fn expand_paragraph_selects_whole_wrapped_line() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(3, 3, 10, InMemoryDeduper::new());
        write_str(&mut buf, "abcdef");
        buf.expand_selection(Pos::new(1, 0), 3, "");
        assert_eq!(buf.get_selected_text().unwrap(), "abcdef");
    }

    #[test]
    fn writing_over_a_selected_cell_clears_the_selection() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(1, 10, 10, InMemoryDeduper::new());
        write_str(&mut buf, "hello");
        buf.mark_selection(Pos::new(0, 0));
        buf.delimit_selection(Pos::new(0, 4), true);
        buf.move_cursor(Pos::new(0, 2), false).unwrap();
        write_str(&mut buf, "Z");
        assert!(buf.get_selected_text().is_none());
    }
}
