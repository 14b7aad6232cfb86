//! C6: the active-rows-plus-scroll-back screen buffer (spec.md §4.4), the
//! richest module in the core (spec.md §2 puts it at 45% of the budget).
//! Laid out the way the teacher splits its own large modules into a
//! directory of cooperating files under one `mod.rs` (see
//! `examples/r3bl-org-r3bl-open-core`'s `ansi_parser`/`osc` directories in
//! the teacher reference): this file owns the `Buffer` struct and the
//! cursor-local editing operations; the scroll-back model, reflow
//! algorithm, selection, damage dispatch, paragraph iteration, and search
//! each get their own file, all `impl`ing the same `Buffer<D>`.

mod damage;
mod iter;
mod reflow;
mod scrollback;
mod search;
mod selection;

pub use damage::Damage;
pub use iter::{BufferIter, ParaIter};
pub use search::Search;
pub use selection::SelectionRange;

use std::cell::Cell as StdCell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::cell::{ALine, Cell, HLine};
use crate::charset::{CharSet, CharSub, CharSubArray};
use crate::deduper::{Deduper, Tag};
use crate::error::{Result, VtCoreError};
use crate::geometry::{APos, Pos};
use crate::queue::AsyncDestroyer;
use crate::style::{AttrSet, Style};

/// The cursor: position, pending style, char-set register, and the
/// "about to wrap" latch (spec.md §3 "Cursor and saved cursor").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub pos: Pos,
    pub style: Style,
    pub wrap_next: bool,
    pub charset: CharSet,
}

impl Default for Cursor {
    fn default() -> Self {
        Self { pos: Pos::new(0, 0), style: Style::default(), wrap_next: false, charset: CharSet::G0 }
    }
}

/// Snapshot taken by `ESC 7` / `CSI s` and restored by `ESC 8` / `CSI u`:
/// the cursor plus the substitution table presently loaded into its
/// active `CharSet` register (spec.md §3 "Cursor and saved cursor").
#[derive(Debug, Clone, Copy)]
pub struct SavedCursor {
    pub cursor: Cursor,
    pub charsub: &'static CharSub,
}

/// C6: active rows plus scroll-back, margins, tabs, selection, and damage.
/// Generic over the [`Deduper`] so the in-memory reference implementation
/// (tests) and a production content-addressed store are interchangeable.
pub struct Buffer<D: Deduper> {
    cols: i16,
    rows: i16,

    active: VecDeque<ALine>,
    history: VecDeque<HLine>,
    tags: VecDeque<Tag>,
    lost_tags: u32,
    pending: Vec<Cell>,

    history_limit: u32,
    scroll_with_history: bool,
    traditional_wrapping: bool,

    cursor: Cursor,
    saved_cursor: Option<SavedCursor>,
    charsets: CharSubArray,

    margin_begin: i16,
    margin_end: i16,
    tabs: Vec<bool>,

    select_mark: APos,
    select_delim: APos,
    scroll_offset: u32,

    damage: Damage,
    dispatching: StdCell<bool>,

    search: Option<Search>,

    deduper: D,
}

impl<D: Deduper> Buffer<D> {
    /// Build a fresh buffer. `history_limit == 0` (as the alt screen always
    /// uses) disables scroll-back entirely: `add_line` just drops the top
    /// row instead of bumping it (spec.md §7 "alt has zero history limit").
    pub fn new(rows: i16, cols: i16, history_limit: u32, deduper: D) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let mut buffer = Self {
            cols,
            rows,
            active: (0..rows).map(|_| ALine::new(cols)).collect(),
            history: VecDeque::new(),
            tags: VecDeque::new(),
            lost_tags: 0,
            pending: Vec::new(),
            history_limit,
            scroll_with_history: false,
            traditional_wrapping: false,
            cursor: Cursor::default(),
            saved_cursor: None,
            charsets: CharSubArray::default(),
            margin_begin: 0,
            margin_end: rows,
            tabs: Vec::new(),
            select_mark: APos::default(),
            select_delim: APos::default(),
            scroll_offset: 0,
            damage: Damage::new(rows),
            dispatching: StdCell::new(false),
            search: None,
            deduper,
        };
        buffer.reset_tabs();
        buffer
    }

    pub fn rows(&self) -> i16 {
        self.rows
    }

    pub fn cols(&self) -> i16 {
        self.cols
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn set_cursor_style(&mut self, style: Style) {
        self.cursor.style = style;
    }

    pub fn cursor_style(&self) -> Style {
        self.cursor.style
    }

    pub fn cursor_charset(&self) -> CharSet {
        self.cursor.charset
    }

    pub fn set_cursor_charset(&mut self, set: CharSet) {
        self.cursor.charset = set;
    }

    pub fn designate_charset(&mut self, set: CharSet, sub: &'static CharSub) {
        self.charsets.set(set, sub);
    }

    pub fn margins(&self) -> (i16, i16) {
        (self.margin_begin, self.margin_end)
    }

    pub fn set_scroll_with_history(&mut self, enabled: bool) {
        self.scroll_with_history = enabled;
    }

    pub fn set_traditional_wrapping(&mut self, enabled: bool) {
        self.traditional_wrapping = enabled;
    }

    pub fn set_history_limit(&mut self, limit: u32) {
        self.history_limit = limit;
        self.enforce_history_limit();
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: u32) {
        self.scroll_offset = offset.min(self.history.len() as u32);
        self.damage.reset();
        self.damage.set_all(self.rows);
    }

    pub fn byte_stats(&self) -> (usize, usize) {
        self.deduper.get_byte_stats()
    }

    pub fn line_stats(&self) -> (usize, usize) {
        self.deduper.get_line_stats()
    }

    fn guard_not_dispatching(&self) -> Result<()> {
        if self.dispatching.get() {
            return Err(VtCoreError::Reentrant);
        }
        Ok(())
    }

    fn active_row(&self, row: i16) -> &ALine {
        &self.active[row.max(0) as usize]
    }

    fn active_row_mut(&mut self, row: i16) -> &mut ALine {
        &mut self.active[row.max(0) as usize]
    }

    /// Map an active-row index to the viewport row it's currently drawn at
    /// (spec.md §3 "Viewport damage is stored relative to the viewport...
    /// not the underlying row index"), or `None` if scrolled out of view.
    fn active_to_viewport(&self, row: i16) -> Option<i16> {
        let v = i32::from(row) + self.scroll_offset as i32;
        if (0..i32::from(self.rows)).contains(&v) {
            Some(v as i16)
        } else {
            None
        }
    }

    fn damage_active_row(&mut self, row: i16, begin: i16, end: i16) {
        if let Some(v) = self.active_to_viewport(row) {
            self.damage.add(v, begin, end);
        }
    }

    // ---- Tab stops (spec.md §3 "Tabs and margins") ----------------------

    pub fn reset_tabs(&mut self) {
        let cols = self.cols.max(0) as usize;
        self.tabs = (0..cols).map(|c| c % 8 == 0).collect();
    }

    pub fn clear_tab(&mut self, col: i16) {
        if let Some(stop) = self.tabs.get_mut(col.max(0) as usize) {
            *stop = false;
        }
    }

    pub fn clear_all_tabs(&mut self) {
        self.tabs.iter_mut().for_each(|stop| *stop = false);
    }

    pub fn set_tab(&mut self, col: i16) {
        if let Some(stop) = self.tabs.get_mut(col.max(0) as usize) {
            *stop = true;
        }
    }

    pub fn tab_forward(&mut self, n: u32) {
        let mut col = self.cursor.pos.col;
        for _ in 0..n.max(1) {
            let mut next = col + 1;
            while (next as usize) < self.tabs.len() && !self.tabs[next as usize] {
                next += 1;
            }
            col = next.min(self.cols - 1);
        }
        self.cursor.wrap_next = false;
        self.cursor.pos.col = col;
    }

    pub fn tab_backward(&mut self, n: u32) {
        let mut col = self.cursor.pos.col;
        for _ in 0..n.max(1) {
            let mut prev = col - 1;
            while prev > 0 && !self.tabs[prev as usize] {
                prev -= 1;
            }
            col = prev.max(0);
        }
        self.cursor.wrap_next = false;
        self.cursor.pos.col = col;
    }

    // ---- Margins ----------------------------------------------------------

    pub fn set_margins(&mut self, begin: i16, end: i16) {
        let begin = begin.clamp(0, self.rows - 1);
        let end = end.clamp(begin + 1, self.rows);
        self.margin_begin = begin;
        self.margin_end = end;
    }

    pub fn reset_margins(&mut self) {
        self.margin_begin = 0;
        self.margin_end = self.rows;
    }

    // ---- Cursor movement ----------------------------------------------------

    /// `pos` is screen-relative; if `margin_relative` (origin mode), it's
    /// added to `margin_begin` and clamped to `margin_end - 1` rather than
    /// `rows - 1` (spec.md §4.4 `move_cursor`).
    pub fn move_cursor(&mut self, pos: Pos, margin_relative: bool) -> Result<()> {
        self.guard_not_dispatching()?;
        self.cursor.wrap_next = false;
        let (row_lo, row_hi, row) = if margin_relative {
            (self.margin_begin, self.margin_end - 1, self.margin_begin + pos.row)
        } else {
            (0, self.rows - 1, pos.row)
        };
        self.cursor.pos.row = row.clamp(row_lo, row_hi);
        self.cursor.pos.col = pos.col.clamp(0, self.cols - 1);
        Ok(())
    }

    pub fn move_cursor_relative(&mut self, d_row: i16, d_col: i16) {
        self.cursor.wrap_next = false;
        let row = (self.cursor.pos.row + d_row).clamp(0, self.rows - 1);
        let col = (self.cursor.pos.col + d_col).clamp(0, self.cols - 1);
        self.cursor.pos.row = row;
        self.cursor.pos.col = col;
    }

    /// Line feed (spec.md §4.4 `forward_index`): scrolls at the bottom
    /// margin, else moves down; `reset_col` implements NEL (`CSI E`/`ESC E`).
    pub fn forward_index(&mut self, reset_col: bool) {
        self.cursor.wrap_next = false;
        if self.cursor.pos.row == self.margin_end - 1 {
            self.scroll_up_margins(1);
        } else {
            self.cursor.pos.row = (self.cursor.pos.row + 1).min(self.rows - 1);
        }
        if reset_col {
            self.cursor.pos.col = 0;
        }
    }

    /// `ESC M` (spec.md §4.4 `reverse_index`): inserts a blank line at the
    /// top margin, or simply moves up.
    pub fn reverse_index(&mut self) {
        self.cursor.wrap_next = false;
        if self.cursor.pos.row == self.margin_begin {
            self.scroll_down_margins(1);
        } else {
            self.cursor.pos.row = (self.cursor.pos.row - 1).max(0);
        }
    }

    pub fn backspace(&mut self, auto_wrap: bool) {
        self.cursor.wrap_next = false;
        if self.cursor.pos.col == 0 {
            if !self.traditional_wrapping && auto_wrap && self.cursor.pos.row > self.margin_begin {
                self.cursor.pos.row -= 1;
                self.cursor.pos.col = self.cols - 1;
            }
        } else {
            self.cursor.pos.col -= 1;
        }
    }

    // ---- Writing ------------------------------------------------------------

    /// The combination of "is this the last active row" and "would it
    /// actually scroll on a line feed" that decides whether wrapping here
    /// is allowed to mark `cont = true` (spec.md §4.4 `write`, §9 "`cont`
    /// vs `wrap`"): if it's the final screen row *and* it sits below the
    /// scroll margin (so it will never itself be scrolled away), latching
    /// `cont` on it would violate the "last active row never has
    /// `cont == true`" invariant forever. In every other case, wrapping
    /// scrolls the buffer (or isn't the last row at all) and the flag gets
    /// cleared again by the resulting `add_line`/cursor move.
    fn wrap_would_strand_cont(&self) -> bool {
        let row = self.cursor.pos.row;
        row == self.rows - 1 && row != self.margin_end - 1
    }

    fn do_wrap(&mut self) {
        let row = self.cursor.pos.row;
        if !self.wrap_would_strand_cont() {
            self.active_row_mut(row).cont = true;
            self.damage_active_row(row, 0, self.cols);
        }
        self.cursor.wrap_next = false;
        self.cursor.pos.col = 0;
        self.forward_index(false);
    }

    /// Place one glyph at the cursor (spec.md §4.4 `write`).
    pub fn write(&mut self, mut seq: [u8; 4], len: u8, auto_wrap: bool, insert: bool) -> Result<()> {
        self.guard_not_dispatching()?;
        if self.cursor.wrap_next && auto_wrap {
            self.do_wrap();
        }

        let charsub = self.charsets.get(self.cursor.charset);
        if len == 1 {
            charsub.translate(&mut seq);
        }
        let mut style = self.cursor.style;
        if charsub.is_special() {
            style.unset_attr(AttrSet::BOLD | AttrSet::ITALIC);
        }

        let row = self.cursor.pos.row;
        let col = self.cursor.pos.col;
        if insert {
            self.insert_cells(1);
        }

        let line = self.active_row_mut(row);
        line.cells[col as usize] = Cell { seq, style };
        line.wrap = line.wrap.max(col + 1);
        self.clear_selection_overlapping(APos::new(i32::from(row), col), APos::new(i32::from(row), col + 1));
        self.damage_active_row(row, col, col + 1);

        if col + 1 >= self.cols {
            self.cursor.wrap_next = true;
        } else {
            self.cursor.pos.col = col + 1;
        }
        Ok(())
    }

    /// `CSI b` (REP): repeat the last written `Normal` sequence `n` times.
    pub fn repeat_last(&mut self, seq: [u8; 4], len: u8, n: u32, auto_wrap: bool, insert: bool) {
        for _ in 0..n {
            let _ = self.write(seq, len, auto_wrap, insert);
        }
    }

    // ---- In-line cell editing ------------------------------------------------

    pub fn insert_cells(&mut self, n: i16) {
        let row = self.cursor.pos.row;
        let col = self.cursor.pos.col;
        let style = self.cursor.style;
        let cols = self.cols;
        let line = self.active_row_mut(row);
        let n = n.clamp(0, cols - col);
        if n <= 0 {
            return;
        }
        let cut = (cols - n) as usize;
        line.cells.truncate(cut.max(col as usize));
        for _ in 0..n {
            line.cells.insert(col as usize, Cell::blank(style));
        }
        line.cells.resize(cols as usize, Cell::blank(style));
        line.wrap = cols.min(line.wrap + n);
        self.clear_selection_overlapping(APos::new(i32::from(row), col), APos::new(i32::from(row), cols));
        self.damage_active_row(row, col, cols);
    }

    pub fn erase_cells(&mut self, n: i16) {
        let row = self.cursor.pos.row;
        let col = self.cursor.pos.col;
        let style = self.cursor.style;
        let cols = self.cols;
        let line = self.active_row_mut(row);
        let n = n.clamp(0, cols - col);
        if n <= 0 {
            return;
        }
        line.cells.drain(col as usize..(col + n) as usize);
        for _ in 0..n {
            line.cells.push(Cell::blank(style));
        }
        line.wrap = (line.wrap - n).clamp(0, cols);
        self.clear_selection_overlapping(APos::new(i32::from(row), col), APos::new(i32::from(row), cols));
        self.damage_active_row(row, col, cols);
    }

    pub fn blank_cells(&mut self, n: i16) {
        let row = self.cursor.pos.row;
        let col = self.cursor.pos.col;
        let style = self.cursor.style;
        let cols = self.cols;
        let end = (col + n.max(0)).min(cols);
        let line = self.active_row_mut(row);
        for cell in &mut line.cells[col as usize..end as usize] {
            *cell = Cell::blank(style);
        }
        line.wrap = line.wrap.max(end);
        self.clear_selection_overlapping(APos::new(i32::from(row), col), APos::new(i32::from(row), end));
        self.damage_active_row(row, col, end);
    }

    pub fn clear_line(&mut self) {
        let row = self.cursor.pos.row;
        let style = self.cursor.style;
        let cols = self.cols;
        self.active_row_mut(row).clear(style);
        self.clear_selection_overlapping(APos::new(i32::from(row), 0), APos::new(i32::from(row), cols));
        self.damage_active_row(row, 0, cols);
    }

    pub fn clear_line_left(&mut self) {
        let row = self.cursor.pos.row;
        let col = self.cursor.pos.col;
        let style = self.cursor.style;
        let line = self.active_row_mut(row);
        for cell in &mut line.cells[..=col.max(0) as usize] {
            *cell = Cell::blank(style);
        }
        self.clear_selection_overlapping(APos::new(i32::from(row), 0), APos::new(i32::from(row), col + 1));
        self.damage_active_row(row, 0, col + 1);
    }

    pub fn clear_line_right(&mut self) {
        let row = self.cursor.pos.row;
        let col = self.cursor.pos.col;
        let style = self.cursor.style;
        let cols = self.cols;
        let line = self.active_row_mut(row);
        for cell in &mut line.cells[col as usize..] {
            *cell = Cell::blank(style);
        }
        line.wrap = line.wrap.min(col);
        line.cont = false;
        self.clear_selection_overlapping(APos::new(i32::from(row), col), APos::new(i32::from(row), cols));
        self.damage_active_row(row, col, cols);
    }

    pub fn clear(&mut self) {
        let style = self.cursor.style;
        let cols = self.cols;
        for row in 0..self.rows {
            self.active_row_mut(row).clear(style);
            self.damage_active_row(row, 0, cols);
        }
        self.clear_selection();
    }

    pub fn clear_above(&mut self) {
        let row = self.cursor.pos.row;
        let col = self.cursor.pos.col;
        let style = self.cursor.style;
        let cols = self.cols;
        for r in 0..row {
            self.active_row_mut(r).clear(style);
            self.damage_active_row(r, 0, cols);
        }
        {
            let line = self.active_row_mut(row);
            for cell in &mut line.cells[..=col.max(0) as usize] {
                *cell = Cell::blank(style);
            }
        }
        self.damage_active_row(row, 0, col + 1);
        self.clear_selection_overlapping(APos::new(0, 0), APos::new(i32::from(row), col + 1));
    }

    pub fn clear_below(&mut self) {
        let row = self.cursor.pos.row;
        let col = self.cursor.pos.col;
        let style = self.cursor.style;
        let cols = self.cols;
        {
            let line = self.active_row_mut(row);
            for cell in &mut line.cells[col as usize..] {
                *cell = Cell::blank(style);
            }
            line.wrap = line.wrap.min(col);
            line.cont = false;
        }
        self.damage_active_row(row, col, cols);
        for r in (row + 1)..self.rows {
            self.active_row_mut(r).clear(style);
            self.damage_active_row(r, 0, cols);
        }
        self.clear_selection_overlapping(APos::new(i32::from(row), col), APos::new(i32::from(self.rows), 0));
    }

    // ---- Line-level editing within margins ----------------------------------

    /// `CSI L` (spec.md §4.4 `insert_lines`): blank lines appear at the
    /// cursor row; rows below, within the margin, shift down and the
    /// bottom-most ones that fall off are discarded (never bumped — this
    /// is a local shove, not scroll-back growth).
    pub fn insert_lines(&mut self, n: i16) {
        let row = self.cursor.pos.row;
        if row < self.margin_begin || row >= self.margin_end {
            return;
        }
        let n = n.clamp(0, self.margin_end - row);
        for _ in 0..n {
            self.active.remove((self.margin_end - 1) as usize);
            self.active.insert(row as usize, ALine::new(self.cols));
        }
        if let Some(last) = self.active.get_mut((self.margin_end - 1) as usize) {
            last.cont = false;
        }
        self.clear_selection_overlapping(APos::new(i32::from(row), 0), APos::new(i32::from(self.margin_end), 0));
        for r in row..self.margin_end {
            self.damage_active_row(r, 0, self.cols);
        }
    }

    /// `CSI M` (spec.md §4.4 `erase_lines`).
    pub fn erase_lines(&mut self, n: i16) {
        let row = self.cursor.pos.row;
        if row < self.margin_begin || row >= self.margin_end {
            return;
        }
        let n = n.clamp(0, self.margin_end - row);
        for _ in 0..n {
            self.active.remove(row as usize);
            self.active.insert((self.margin_end - 1) as usize, ALine::new(self.cols));
        }
        if let Some(last) = self.active.get_mut((self.margin_end - 1) as usize) {
            last.cont = false;
        }
        self.clear_selection_overlapping(APos::new(i32::from(row), 0), APos::new(i32::from(self.margin_end), 0));
        for r in row..self.margin_end {
            self.damage_active_row(r, 0, self.cols);
        }
    }

    /// `CSI S`: scroll the margin region up by `n`, bumping evicted rows
    /// into history only when the region is the whole screen (spec.md
    /// §4.4 `scroll_up_margins`; this is also what a bottom-margin line
    /// feed calls).
    pub fn scroll_up_margins(&mut self, n: i16) {
        let whole_screen = self.margin_begin == 0 && self.margin_end == self.rows;
        let n = n.clamp(0, self.margin_end - self.margin_begin);
        for _ in 0..n {
            if whole_screen {
                self.add_line();
            } else {
                self.active.remove(self.margin_begin as usize);
                self.active.insert((self.margin_end - 1) as usize, ALine::new(self.cols));
                if let Some(last) = self.active.get_mut((self.margin_end - 1) as usize) {
                    last.cont = false;
                }
            }
        }
        self.clear_selection_overlapping(APos::new(i32::from(self.margin_begin), 0), APos::new(i32::from(self.margin_end), 0));
        for r in self.margin_begin..self.margin_end {
            self.damage_active_row(r, 0, self.cols);
        }
    }

    /// `CSI T`: scroll the margin region down by `n` (spec.md §4.4
    /// `scroll_down_margins`); never touches history.
    pub fn scroll_down_margins(&mut self, n: i16) {
        let n = n.clamp(0, self.margin_end - self.margin_begin);
        for _ in 0..n {
            self.active.remove((self.margin_end - 1) as usize);
            self.active.insert(self.margin_begin as usize, ALine::new(self.cols));
        }
        if let Some(last) = self.active.get_mut((self.margin_end - 1) as usize) {
            last.cont = false;
        }
        self.clear_selection_overlapping(APos::new(i32::from(self.margin_begin), 0), APos::new(i32::from(self.margin_end), 0));
        for r in self.margin_begin..self.margin_end {
            self.damage_active_row(r, 0, self.cols);
        }
    }

    // ---- Cursor save/restore --------------------------------------------

    pub fn save_cursor(&mut self) {
        let charsub = self.charsets.get(self.cursor.charset);
        self.saved_cursor = Some(SavedCursor { cursor: self.cursor, charsub });
    }

    pub fn restore_cursor(&mut self) {
        if let Some(saved) = self.saved_cursor {
            self.cursor = saved.cursor;
            self.charsets.set(self.cursor.charset, saved.charsub);
        }
    }

}

impl<D: Deduper> Drop for Buffer<D> {
    /// Hands any paragraphs this buffer still holds a reference to off to
    /// an [`AsyncDestroyer`] rather than calling `deduper.remove` for each
    /// one on the dropping thread (spec.md §4.4 "Dedupe teardown
    /// (asynchronous)"). The destroyer's join is skipped deliberately: once
    /// every tag has been queued and the queue is finalised, the worker
    /// thread is left to drain it in the background.
    fn drop(&mut self) {
        if self.tags.is_empty() {
            return;
        }
        let deduper = std::mem::take(&mut self.deduper);
        let destroyer = AsyncDestroyer::new(Arc::new(Mutex::new(deduper)) as Arc<Mutex<dyn Deduper + Send>>);
        for tag in self.tags.drain(..) {
            destroyer.add(tag);
        }
        destroyer.finalise();
        std::mem::forget(destroyer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduper::InMemoryDeduper;
    use pretty_assertions::assert_eq;

    fn buffer(rows: i16, cols: i16) -> Buffer<InMemoryDeduper> {
        Buffer::new(rows, cols, 100, InMemoryDeduper::new())
    }

    fn write_str(buf: &mut Buffer<InMemoryDeduper>, s: &str, auto_wrap: bool) {
        for c in s.chars() {
            let mut seq = [0u8; 4];
            let len = c.encode_utf8(&mut seq).len() as u8;
            buf.write(seq, len, auto_wrap, false).unwrap();
        }
    }

    fn row_text(buf: &Buffer<InMemoryDeduper>, row: i16) -> String {
        buf.active[row as usize].cells.iter().map(|c| std::str::from_utf8(&c.seq[..c.len() as usize]).unwrap()).collect()
    }

    #[test]
    fn dropping_a_buffer_with_history_hands_its_tags_to_an_async_destroyer() {
        let mut buf = buffer(1, 4);
        write_str(&mut buf, "abcd", true);
        buf.forward_index(true);
        assert!(!buf.tags.is_empty());
        drop(buf); // must return promptly, not block on synchronous removal.
    }

    #[test]
    fn dropping_a_buffer_with_no_history_spawns_no_destroyer() {
        let buf = buffer(1, 4);
        assert!(buf.tags.is_empty());
        drop(buf);
    }

    /// Scenario 1 (spec.md §8): plain text wrap.
    #[test]
    fn plain_text_wrap() {
        let mut buf = buffer(5, 5);
        write_str(&mut buf, "abcdefg", true);
        assert_eq!(row_text(&buf, 0), "abcde");
        assert!(buf.active[0].cont);
        assert_eq!(row_text(&buf, 1), "fg   ");
        assert_eq!(buf.active[1].wrap, 2);
        assert_eq!(buf.cursor.pos, Pos::new(1, 2));
    }

    /// Scenario 3 (spec.md §8): cursor move then write.
    #[test]
    fn cursor_move_then_write() {
        let mut buf = buffer(5, 10);
        buf.move_cursor(Pos::new(2, 3), false).unwrap();
        write_str(&mut buf, "X", true);
        assert_eq!(buf.active[2].cells[3].seq[0], b'X');
        assert_eq!(buf.cursor.pos, Pos::new(2, 4));
    }

    #[test]
    fn wrap_next_latches_at_last_column_without_advancing() {
        let mut buf = buffer(3, 3);
        write_str(&mut buf, "abc", true);
        assert!(buf.cursor.wrap_next);
        assert_eq!(buf.cursor.pos, Pos::new(0, 2));
    }

    #[test]
    fn write_without_auto_wrap_overprints_last_column() {
        let mut buf = buffer(3, 3);
        write_str(&mut buf, "abc", false);
        write_str(&mut buf, "Z", false);
        assert_eq!(row_text(&buf, 0), "abZ");
        assert!(!buf.active[0].cont);
    }

    #[test]
    fn insert_mode_shifts_cells_right() {
        let mut buf = buffer(1, 5);
        write_str(&mut buf, "abc", true);
        buf.move_cursor(Pos::new(0, 0), false).unwrap();
        let mut seq = [0u8; 4];
        let len = 'X'.encode_utf8(&mut seq).len() as u8;
        buf.write(seq, len, true, true).unwrap();
        assert_eq!(row_text(&buf, 0), "Xabc ");
    }

    #[test]
    fn backspace_wraps_to_previous_row_when_not_traditional() {
        let mut buf = buffer(3, 5);
        buf.move_cursor(Pos::new(1, 0), false).unwrap();
        buf.backspace(true);
        assert_eq!(buf.cursor.pos, Pos::new(0, 4));
    }

    #[test]
    fn backspace_stops_at_column_zero_with_traditional_wrapping() {
        let mut buf = buffer(3, 5);
        buf.set_traditional_wrapping(true);
        buf.move_cursor(Pos::new(1, 0), false).unwrap();
        buf.backspace(true);
        assert_eq!(buf.cursor.pos, Pos::new(1, 0));
    }

    #[test]
    fn clear_line_blanks_the_whole_row() {
        let mut buf = buffer(1, 5);
        write_str(&mut buf, "abcde", false);
        buf.clear_line();
        assert_eq!(row_text(&buf, 0), "     ");
    }

    #[test]
    fn insert_lines_pushes_bottom_rows_out_of_the_margin() {
        let mut buf = buffer(3, 3);
        write_str(&mut buf, "aaa", true);
        buf.forward_index(true);
        write_str(&mut buf, "bbb", true);
        buf.forward_index(true);
        write_str(&mut buf, "ccc", true);
        buf.move_cursor(Pos::new(0, 0), false).unwrap();
        buf.insert_lines(1);
        assert_eq!(row_text(&buf, 0), "   ");
        assert_eq!(row_text(&buf, 1), "aaa");
        assert_eq!(row_text(&buf, 2), "bbb");
    }

    #[test]
    fn tab_forward_stops_every_eight_columns_by_default() {
        let mut buf = buffer(1, 20);
        buf.tab_forward(1);
        assert_eq!(buf.cursor.pos.col, 8);
        buf.tab_forward(1);
        assert_eq!(buf.cursor.pos.col, 16);
    }

    #[test]
    fn save_and_restore_cursor_round_trips_position_and_style() {
        let mut buf = buffer(5, 5);
        buf.move_cursor(Pos::new(2, 2), false).unwrap();
        buf.cursor.style.set_attr(AttrSet::BOLD);
        buf.save_cursor();
        buf.move_cursor(Pos::new(0, 0), false).unwrap();
        buf.cursor.style = Style::default();
        buf.restore_cursor();
        assert_eq!(buf.cursor.pos, Pos::new(2, 2));
        assert!(buf.cursor.style.attrs.contains(AttrSet::BOLD));
    }

    #[test]
    fn dec_special_graphics_masks_bold_and_italic() {
        let mut buf = buffer(1, 5);
        buf.designate_charset(CharSet::G0, &crate::charset::CS_SPECIAL);
        buf.cursor.style.set_attr(AttrSet::BOLD | AttrSet::ITALIC);
        let mut seq = [0u8; 4];
        let len = '`'.encode_utf8(&mut seq).len() as u8;
        buf.write(seq, len, true, false).unwrap();
        assert!(!buf.active[0].cells[0].style.attrs.contains(AttrSet::BOLD));
        assert!(!buf.active[0].cells[0].style.attrs.contains(AttrSet::ITALIC));
    }
}
