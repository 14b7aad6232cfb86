//! The scroll-back model (spec.md §4.4 "Scroll-back model", §6.1): moving
//! rows between the active region and history (`bump`/`unbump`), growing
//! the active region at the bottom margin (`add_line`), and evicting the
//! oldest paragraphs once `history_limit` is exceeded
//! (`enforce_history_limit`). Transcribed from terminol's
//! `Buffer::bump`/`unbump`/`addLine`/`enforceHistoryLimit`
//! (`common/buffer.cxx`), which is also where the `pending`/`INVALID_TAG`
//! continuation scheme this module leans on is defined.

use super::Buffer;
use crate::cell::{ALine, HLine};
use crate::deduper::Deduper;
use crate::geometry::APos;

impl<D: Deduper> Buffer<D> {
    /// Move the topmost active row into history, storing (or extending) its
    /// paragraph in the deduper. A row whose `cont` flag is set means the
    /// paragraph isn't finished yet: its cells are stashed in `pending`
    /// under a placeholder `invalid_tag` HLine until the row that completes
    /// it is bumped too.
    pub(super) fn bump(&mut self) {
        let line = self.active.pop_front().expect("bump called with no active rows");
        let wrap = line.wrap.max(0) as usize;
        let cont = line.cont;

        if self.pending.is_empty() {
            let tag = if cont { self.deduper.invalid_tag() } else { self.deduper.store(&line.cells[..wrap]) };
            if cont {
                self.pending = line.cells[..wrap].to_vec();
            }
            self.tags.push_back(tag);
            let index = self.tags.len() as u32 - 1 + self.lost_tags;
            self.history.push_back(HLine::new(index, 0));
        } else {
            let seqnum = self.history.back().map_or(0, |h| h.seqnum) + 1;
            self.pending.extend_from_slice(&line.cells[..wrap]);
            let index = self.tags.len() as u32 - 1 + self.lost_tags;
            self.history.push_back(HLine::new(index, seqnum));
            if !cont {
                let tag = self.deduper.store(&self.pending);
                self.pending.clear();
                *self.tags.back_mut().expect("continuation implies a placeholder tag") = tag;
            }
        }
    }

    /// Undo one `bump`: pull the newest historical row segment back into
    /// the active region's front. The inverse of `bump`, used by reflow
    /// when the viewport grows.
    pub(super) fn unbump(&mut self) {
        let hline = self.history.pop_back().expect("unbump called with empty history");

        let cont = !self.pending.is_empty();
        if !cont {
            let tag = *self.tags.back().expect("unbump called with no tags");
            let mut full = Vec::new();
            self.deduper.lookup(tag, &mut full);
            self.deduper.remove(tag);
            self.pending = full;
        }

        let offset = usize::from(hline.seqnum) * self.cols.max(0) as usize;
        let offset = offset.min(self.pending.len());
        let cells = self.pending[offset..].to_vec();
        self.pending.truncate(offset);

        let wrap = cells.len() as i16;
        self.active.push_front(ALine::from_cells(cells, cont, wrap, self.cols));

        let paragraph_done = match self.history.back() {
            None => true,
            Some(h) => h.index != self.tags.len() as u32 - 1 + self.lost_tags,
        };
        if paragraph_done {
            self.tags.pop_back();
        }
    }

    /// Re-derive `history` from `tags`, re-chunking each paragraph at the
    /// buffer's *current* column width (spec.md §4.4 `resize_reflow`:
    /// "history is rebuilt because the historical segmentation depends on
    /// the column width"). Called by `resize_reflow` after every active row
    /// has been bumped and `cols` updated.
    pub(super) fn rebuild_history(&mut self) {
        self.history.clear();
        let invalid = self.deduper.invalid_tag();
        let cols = self.cols.max(1) as usize;
        for (i, &tag) in self.tags.iter().enumerate() {
            let index = i as u32 + self.lost_tags;
            let length = if tag == invalid { self.pending.len() } else { self.deduper.lookup_length(tag) };
            let mut seqnum: u16 = 0;
            let mut offset = 0usize;
            loop {
                self.history.push_back(HLine::new(index, seqnum));
                seqnum += 1;
                offset += cols;
                if offset >= length {
                    break;
                }
            }
        }
    }

    /// Grow the active region by one row at the bottom margin, bumping the
    /// top row into history first (spec.md §4.4 `add_line`; called only
    /// when the margins span the whole screen — see `scroll_up_margins`).
    /// The alt screen (`history_limit == 0`) just drops the top row.
    pub(super) fn add_line(&mut self) {
        if self.history_limit == 0 {
            self.active.pop_front();
        } else {
            self.bump();
            // If the viewport isn't following new output, keep it pinned to
            // the same historical content rather than letting it silently
            // drift as rows shift underneath it (spec.md SPEC_FULL.md B.2
            // "`scroll_with_history`").
            if !self.scroll_with_history && self.scroll_offset != 0 && self.scroll_offset != self.history.len() as u32
            {
                self.scroll_offset += 1;
            }
            self.enforce_history_limit();
        }
        self.active.push_back(ALine::new(self.cols));

        if self.select_mark != self.select_delim {
            if self.select_mark.row == -(self.history.len() as i32) {
                self.clear_selection();
            } else {
                self.select_mark.row -= 1;
                self.select_delim.row -= 1;
            }
        } else if self.select_mark.row > -(self.history.len() as i32) {
            self.select_mark.row -= 1;
            self.select_delim.row -= 1;
        }
    }

    /// Evict the oldest paragraphs until `tags.len() <= history_limit`
    /// (spec.md §4.4 `enforce_history_limit`).
    pub(super) fn enforce_history_limit(&mut self) {
        while self.tags.len() as u32 > self.history_limit {
            while let Some(h) = self.history.front().copied() {
                if h.index != self.lost_tags {
                    break;
                }
                if self.scroll_offset as usize == self.history.len() {
                    self.scroll_offset -= 1;
                }
                self.history.pop_front();
            }
            if let Some(tag) = self.tags.pop_front() {
                self.deduper.remove(tag);
            }
            self.lost_tags += 1;
        }

        if self.select_mark != self.select_delim {
            let history_len = self.history.len() as i32;
            if history_len + self.select_mark.row < 0 {
                tracing::warn!("enforce_history_limit evicted a paragraph with a live selection endpoint");
                self.select_mark = APos::default();
                self.select_delim = APos::default();
            }
        }
    }
}
