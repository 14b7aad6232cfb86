//! Resize strategies (spec.md §4.4 "Resize"): `resize_clip` just
//! pads/truncates rows in place (used by the alt screen, which has no
//! history to reflow into), while `resize_reflow` re-wraps every paragraph
//! at the new column width, carrying the cursor's logical stream position
//! across the reflow. Transcribed from terminol's `Buffer::resizeClip` and
//! `Buffer::resizeReflow` (`common/buffer.cxx`), which is also where the
//! `cursorOffset`/`cursorTagIndex` bookkeeping below comes from.

use super::Buffer;
use crate::cell::ALine;
use crate::deduper::Deduper;
use crate::error::{Result, VtCoreError};

impl<D: Deduper> Buffer<D> {
    /// Resize without reflowing: rows are padded with blanks or truncated,
    /// columns are padded/truncated in place. Used for the alt screen,
    /// which keeps no scroll-back to reflow into (spec.md §7).
    pub fn resize_clip(&mut self, rows: i16, cols: i16) -> Result<()> {
        if rows <= 0 || cols <= 0 {
            return Err(VtCoreError::InvalidGeometry { rows: i32::from(rows), cols: i32::from(cols) });
        }
        tracing::trace!(old_rows = self.rows, old_cols = self.cols, rows, cols, "resize_clip");
        self.clear_selection();

        if cols != self.cols {
            for line in &mut self.active {
                line.resize(cols);
            }
        }
        match (self.active.len() as i16).cmp(&rows) {
            std::cmp::Ordering::Less => self.active.resize(rows as usize, ALine::new(cols)),
            std::cmp::Ordering::Greater => self.active.truncate(rows as usize),
            std::cmp::Ordering::Equal => {}
        }

        self.cols = cols;
        self.rows = rows;
        self.reset_margins();
        self.tabs.resize(cols.max(0) as usize, false);
        self.reset_tabs();

        self.cursor.pos.row = self.cursor.pos.row.min(rows - 1);
        self.cursor.pos.col = self.cursor.pos.col.min(cols - 1);
        self.cursor.wrap_next = false;
        if let Some(saved) = &mut self.saved_cursor {
            saved.cursor.pos.row = saved.cursor.pos.row.min(rows - 1);
            saved.cursor.pos.col = saved.cursor.pos.col.min(cols - 1);
        }

        self.damage.resize(rows);
        self.damage_set_all();
        Ok(())
    }

    /// Resize by reflowing: every active row is pushed into history (which
    /// is then rebuilt at the new column width), and rows are pulled back
    /// out to refill the active region. The cursor's position in the
    /// logical character stream is tracked through this round trip
    /// (`cursor_offset`/`cursor_tag_index`) so it lands in the same place
    /// relative to the text, not the same `(row, col)`.
    pub fn resize_reflow(&mut self, rows: i16, cols: i16) -> Result<()> {
        if rows <= 0 || cols <= 0 {
            return Err(VtCoreError::InvalidGeometry { rows: i32::from(rows), cols: i32::from(cols) });
        }
        tracing::trace!(old_rows = self.rows, old_cols = self.cols, rows, cols, "resize_reflow");
        self.clear_selection();

        while self.active.len() as i16 > rows
            && i32::from(self.cursor.pos.row) < self.active.len() as i32 - 1
            && self.active.back().is_some_and(ALine::is_blank)
        {
            self.active.pop_back();
            if let Some(last) = self.active.back_mut() {
                last.cont = false;
            }
        }

        if cols != self.cols {
            let mut done_cursor = false;
            let mut cursor_tag_index: u32 = 0;
            let mut cursor_offset: i64 = 0;

            while !self.active.is_empty() {
                let s = self.pending.len() as i64;
                self.bump();
                if !done_cursor {
                    if self.cursor.pos.row == 0 {
                        cursor_tag_index = self.tags.len() as u32 - 1 + self.lost_tags;
                        cursor_offset = s + i64::from(self.cursor.pos.col);
                        done_cursor = true;
                    } else {
                        self.cursor.pos.row -= 1;
                    }
                }
            }
            if self.cursor.wrap_next {
                cursor_offset += 1;
                self.cursor.wrap_next = false;
            }

            self.cols = cols;
            self.rebuild_history();

            let mut done_cursor = false;
            while (self.active.len() as i16) < rows && !self.history.is_empty() {
                if done_cursor {
                    self.cursor.pos.row += 1;
                } else if let Some(h) = self.history.back() {
                    if h.index == cursor_tag_index {
                        let offset = i64::from(h.seqnum) * i64::from(cols);
                        if cursor_offset == offset + i64::from(cols) {
                            self.cursor.pos.row = 0;
                            self.cursor.pos.col = (cursor_offset - offset) as i16;
                            self.cursor.wrap_next = true;
                            done_cursor = true;
                        } else if cursor_offset < offset + i64::from(cols) {
                            self.cursor.pos.row = 0;
                            self.cursor.pos.col = (cursor_offset - offset).max(0) as i16;
                            done_cursor = true;
                        }
                    }
                }
                self.unbump();
            }
            if !done_cursor {
                self.cursor.pos.row = 0;
                self.cursor.pos.col = 0;
            }
            if (self.active.len() as i16) < rows {
                self.active.resize(rows as usize, ALine::new(cols));
            }
        } else {
            match (self.active.len() as i16).cmp(&rows) {
                std::cmp::Ordering::Less => {
                    while (self.active.len() as i16) < rows && !self.history.is_empty() {
                        self.cursor.pos.row += 1;
                        self.unbump();
                    }
                    if (self.active.len() as i16) < rows {
                        self.active.resize(rows as usize, ALine::new(cols));
                    }
                }
                std::cmp::Ordering::Greater => {
                    while self.active.len() as i16 > rows {
                        if self.cursor.pos.row > 0 {
                            self.cursor.pos.row -= 1;
                        }
                        self.bump();
                    }
                }
                std::cmp::Ordering::Equal => {}
            }
        }

        self.scroll_offset = self.scroll_offset.min(self.history.len() as u32);
        self.cols = cols;
        self.rows = rows;
        self.reset_margins();
        self.tabs.resize(cols.max(0) as usize, false);
        self.reset_tabs();

        self.cursor.pos.row = self.cursor.pos.row.min(rows - 1);
        self.cursor.pos.col = self.cursor.pos.col.min(cols - 1);
        if let Some(saved) = &mut self.saved_cursor {
            saved.cursor.pos.row = saved.cursor.pos.row.min(rows - 1);
            saved.cursor.pos.col = saved.cursor.pos.col.min(cols - 1);
        }

        self.damage.resize(rows);
        self.damage_set_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduper::InMemoryDeduper;
    use crate::geometry::Pos;
    use pretty_assertions::assert_eq;

    fn write_str(buf: &mut Buffer<InMemoryDeduper>, s: &str) {
        for c in s.chars() {
            let mut seq = [0u8; 4];
            let len = c.encode_utf8(&mut seq).len() as u8;
            buf.write(seq, len, true, false).unwrap();
        }
    }

    fn row_text(buf: &Buffer<InMemoryDeduper>, row: i16) -> String {
        buf.active[row as usize].cells.iter().map(|c| std::str::from_utf8(&c.seq[..c.len() as usize]).unwrap()).collect()
    }

    #[test]
    fn resize_clip_pads_new_rows_blank() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(2, 4, 10, InMemoryDeduper::new());
        write_str(&mut buf, "ab");
        buf.resize_clip(4, 4).unwrap();
        assert_eq!(buf.rows(), 4);
        assert_eq!(row_text(&buf, 2), "    ");
    }

    #[test]
    fn resize_clip_truncates_columns_without_touching_history() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(2, 6, 10, InMemoryDeduper::new());
        write_str(&mut buf, "abcdef");
        buf.resize_clip(2, 3).unwrap();
        assert_eq!(row_text(&buf, 0), "abc");
        assert_eq!(buf.history_len(), 0);
    }

    #[test]
    fn reflow_narrower_rewraps_into_more_rows() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(4, 6, 10, InMemoryDeduper::new());
        write_str(&mut buf, "abcdef");
        buf.resize_reflow(4, 3).unwrap();
        assert_eq!(buf.cols(), 3);
        assert_eq!(row_text(&buf, 0), "abc");
        assert_eq!(row_text(&buf, 1), "def");
    }

    #[test]
    fn reflow_wider_rejoins_wrapped_rows() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(4, 3, 10, InMemoryDeduper::new());
        write_str(&mut buf, "abcdef");
        buf.resize_reflow(4, 6).unwrap();
        assert_eq!(buf.cols(), 6);
        assert_eq!(row_text(&buf, 0), "abcdef");
    }

    #[test]
    fn reflow_preserves_cursor_position_in_the_logical_stream() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(4, 6, 10, InMemoryDeduper::new());
        write_str(&mut buf, "abcdef");
        buf.move_cursor(Pos::new(0, 4), false).unwrap();
        buf.resize_reflow(4, 3).unwrap();
        // "abcdef" reflowed at width 3 puts the 5th character ('e') at row 1, col 1.
        assert_eq!(buf.cursor().pos, Pos::new(1, 1));
    }
}
