//! Incremental regex search over scroll-back (spec.md §4.4 "Search").
//! terminol's `nextSearch`/`prevSearch` (`common/buffer.cxx`) are stubs
//! marked `NYI` in the original; this is a from-scratch implementation
//! (recorded in DESIGN.md) built the same way the rest of the buffer model
//! walks paragraphs, via `BufferIter`/`ParaIter`.

use regex::Regex;

use super::iter::{BufferIter, ParaIter};
use super::Buffer;
use crate::deduper::Deduper;
use crate::geometry::APos;

/// An in-progress search: the compiled pattern and the paragraph currently
/// highlighted as the match (`anchor_row`, an `APos::row`).
#[derive(Debug, Clone)]
pub struct Search {
    pattern: String,
    regex: Regex,
    anchor_row: i32,
}

impl<D: Deduper> Buffer<D> {
    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    pub fn search_pattern(&self) -> Option<&str> {
        self.search.as_ref().map(|s| s.pattern.as_str())
    }

    /// Begin a new search, replacing any search in progress. An invalid
    /// regex is logged and leaves searching off. The first match is sought
    /// starting at the newest paragraph (row `0`) and walking backward into
    /// history, same as terminol anchors a fresh search at the bottom of
    /// the buffer.
    pub fn begin_search(&mut self, pattern: &str) {
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(err) => {
                tracing::warn!(pattern, %err, "invalid search pattern");
                return;
            }
        };
        self.search = Some(Search { pattern: pattern.to_owned(), regex, anchor_row: 0 });
        self.damage_set_all();
        self.seek_match(0, false, true);
    }

    /// Jump to the next (more recent) match.
    pub fn next_search(&mut self) {
        let Some(anchor_row) = self.search.as_ref().map(|s| s.anchor_row) else { return };
        self.seek_match(anchor_row, true, false);
    }

    /// Jump to the previous (older) match.
    pub fn prev_search(&mut self) {
        let Some(anchor_row) = self.search.as_ref().map(|s| s.anchor_row) else { return };
        self.seek_match(anchor_row, false, false);
    }

    pub fn end_search(&mut self) {
        if self.search.take().is_some() {
            self.clear_selection();
            self.damage_set_all();
        }
    }

    fn paragraph_text(&self, row: i32) -> String {
        ParaIter::new(self, APos::new(row, 0))
            .map(|cell| std::str::from_utf8(&cell.seq[..cell.len() as usize]).unwrap_or(" ").to_owned())
            .collect()
    }

    /// Walk paragraphs from `start_row` (inclusive if `include_start`) in
    /// the given direction, selecting the first one whose text matches the
    /// search pattern. No-op if stepping runs out of buffer.
    fn seek_match(&mut self, start_row: i32, forward: bool, include_start: bool) {
        let Some(search) = self.search.clone() else { return };

        let mut iter = BufferIter::new(self, start_row);
        let mut row = start_row;
        let mut first = true;

        loop {
            let check = first && include_start;
            first = false;
            if check {
                if let Some(found) = search.regex.find(&self.paragraph_text(row)) {
                    self.apply_match(row, found.start() as i16, found.end() as i16);
                    return;
                }
            }
            let moved = if forward { iter.move_forward() } else { iter.move_backward() };
            if !moved {
                return;
            }
            row = iter.row();
            if let Some(found) = search.regex.find(&self.paragraph_text(row)) {
                self.apply_match(row, found.start() as i16, found.end() as i16);
                return;
            }
        }
    }

    fn apply_match(&mut self, row: i32, start_col: i16, end_col: i16) {
        if let Some(search) = &mut self.search {
            search.anchor_row = row;
        }
        self.damage_selection();
        self.select_mark = APos::new(row, start_col);
        self.select_delim = APos::new(row, end_col);
        self.damage_selection();
    }
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
    fn begin_search_finds_a_match_in_the_active_region() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(1, 20, 10, InMemoryDeduper::new());
        write_str(&mut buf, "hello world");
        buf.begin_search("wor");
        assert!(buf.is_searching());
        assert_eq!(buf.get_selected_text().unwrap(), "wor");
    }

    #[test]
    fn begin_search_with_invalid_pattern_does_not_start_searching() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(1, 20, 10, InMemoryDeduper::new());
        write_str(&mut buf, "hello");
        buf.begin_search("[unterminated");
        assert!(!buf.is_searching());
    }

    #[test]
    fn next_search_advances_to_an_older_match_in_history() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(1, 10, 10, InMemoryDeduper::new());
        write_str(&mut buf, "foo");
        buf.forward_index(true);
        write_str(&mut buf, "bar");
        buf.forward_index(true);
        write_str(&mut buf, "foo");
        buf.begin_search("foo");
        let first = buf.get_selected_text().unwrap();
        assert_eq!(first, "foo");
        buf.prev_search();
        assert_eq!(buf.get_selected_text().unwrap(), "foo");
    }

    #[test]
    fn end_search_clears_the_match_highlight() {
        let mut buf: Buffer<InMemoryDeduper> = Buffer::new(1, 20, 10, InMemoryDeduper::new());
        write_str(&mut buf, "hello world");
        buf.begin_search("world");
        assert!(buf.get_selected_text().is_some());
        buf.end_search();
        assert!(!buf.is_searching());
        assert!(buf.get_selected_text().is_none());
    }
}
