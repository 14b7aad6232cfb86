//! `ParaIter`/`BufferIter` (spec.md §4.4 "ParaIter and BufferIter"): the
//! cursors over a `Buffer`'s content used by word/paragraph selection
//! expansion and by search. Both walk `APos`-addressed rows without caring
//! whether the row is active or historical, by going through
//! `Buffer::get_line` exactly as `dispatch` does.

use super::Buffer;
use crate::cell::Cell;
use crate::deduper::Deduper;
use crate::geometry::APos;

/// Yields the cells of one paragraph starting at `apos`, following `cont`
/// across wrap boundaries. Exhausted once a row with `cont == false` has
/// been consumed or an out-of-range row is reached.
pub struct ParaIter<'a, D: Deduper> {
    buffer: &'a Buffer<D>,
    row: i32,
    col: i16,
    wrap: i16,
    cont: bool,
    scratch: Vec<Cell>,
    done: bool,
}

impl<'a, D: Deduper> ParaIter<'a, D> {
    pub fn new(buffer: &'a Buffer<D>, apos: APos) -> Self {
        let mut iter =
            Self { buffer, row: apos.row, col: apos.col, wrap: 0, cont: false, scratch: Vec::new(), done: false };
        iter.load_row();
        iter
    }

    fn load_row(&mut self) {
        let viewport_row = (self.row + i32::from(self.buffer.scroll_offset)) as i16;
        if viewport_row < 0 || viewport_row >= self.buffer.rows {
            self.done = true;
            return;
        }
        let (cont, wrap) = self.buffer.get_line(viewport_row, &mut self.scratch);
        self.cont = cont;
        self.wrap = wrap;
    }

    /// The current position, for callers that need to know where iteration
    /// stopped (word/paragraph expansion anchors on this).
    pub fn pos(&self) -> APos {
        APos::new(self.row, self.col)
    }
}

impl<D: Deduper> Iterator for ParaIter<'_, D> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.done {
            return None;
        }
        loop {
            if self.col >= self.wrap {
                if !self.cont {
                    self.done = true;
                    return None;
                }
                self.row += 1;
                self.col = 0;
                self.load_row();
                if self.done {
                    return None;
                }
                continue;
            }
            let cell = self.scratch.get(self.col as usize).copied().unwrap_or_default();
            self.col += 1;
            return Some(cell);
        }
    }
}

/// Walks paragraph *starts*: rows whose predecessor is not a continuation
/// (spec.md §4.4 "BufferIter"). Used to find the next/previous whole
/// paragraph when expanding a selection or searching.
pub struct BufferIter<'a, D: Deduper> {
    buffer: &'a Buffer<D>,
    row: i32,
}

impl<'a, D: Deduper> BufferIter<'a, D> {
    pub fn new(buffer: &'a Buffer<D>, row: i32) -> Self {
        Self { buffer, row }
    }

    pub fn row(&self) -> i32 {
        self.row
    }

    fn predecessor_continues(&self, row: i32) -> bool {
        let prev = row - 1;
        let viewport_row = (prev + i32::from(self.buffer.scroll_offset)) as i16;
        if viewport_row < 0 || viewport_row >= self.buffer.rows {
            return false;
        }
        let mut scratch = Vec::new();
        self.buffer.get_line(viewport_row, &mut scratch).0
    }

    fn in_range(&self, row: i32) -> bool {
        let viewport_row = row + i32::from(self.buffer.scroll_offset);
        (0..i32::from(self.buffer.rows)).contains(&viewport_row)
            || row < 0 && (-row) as usize <= self.buffer.history_len()
    }

    /// Move to the start of the next paragraph; returns `false` once there
    /// is no further content.
    pub fn move_forward(&mut self) -> bool {
        loop {
            self.row += 1;
            if !self.in_range(self.row) {
                return false;
            }
            if !self.predecessor_continues(self.row) {
                return true;
            }
        }
    }

    /// Move to the start of the previous paragraph.
    pub fn move_backward(&mut self) -> bool {
        let history_floor = -(self.buffer.history_len() as i32);
        loop {
            if self.row <= history_floor {
                return false;
            }
            self.row -= 1;
            if !self.predecessor_continues(self.row) {
                return true;
            }
        }
    }
}
