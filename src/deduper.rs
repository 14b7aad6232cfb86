//! C5: the external, content-addressed paragraph store `Buffer` consults
//! whenever a row is evicted into history (spec.md §6.1). The production
//! storage engine is explicitly out of scope (spec.md §1 Non-goals); what
//! lives here is the `Deduper` trait `Buffer` is generic over, the opaque
//! `Tag` handle, and a minimal in-memory implementation used by this
//! crate's own `Buffer`/`Terminal` tests (not a deployable store).

use std::collections::HashMap;

use crate::cell::Cell;

/// Opaque content-addressed handle to a paragraph in the deduper. `0` is
/// the reserved sentinel returned by [`Deduper::invalid_tag`]; `store` never
/// returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u64);

/// External paragraph store consumed by `Buffer` (spec.md §6.1). Paragraphs
/// are stored at most once regardless of how many `ALine`s render them.
///
/// `Default + Send + 'static` so a `Buffer` being torn down can move its
/// deduper into an [`crate::queue::AsyncDestroyer`] and finish releasing
/// tags on a background thread instead of blocking the dropping thread.
pub trait Deduper: Default + Send + 'static {
    /// Store `cells` as a new paragraph, returning its tag. Never returns
    /// [`Deduper::invalid_tag`].
    fn store(&mut self, cells: &[Cell]) -> Tag;

    /// Fill `out` with the complete paragraph `tag` refers to.
    fn lookup(&self, tag: Tag, out: &mut Vec<Cell>);

    /// Fill `out` with the `cols`-wide segment of `tag`'s paragraph starting
    /// at `offset`, and report whether the paragraph continues past this
    /// segment (`cont`) and how many of the segment's cells were written
    /// (`wrap`).
    fn lookup_segment(&self, tag: Tag, offset: u32, cols: u16, out: &mut Vec<Cell>, cont: &mut bool, wrap: &mut i16);

    /// Number of cells in the paragraph `tag` refers to.
    fn lookup_length(&self, tag: Tag) -> usize;

    /// Release this buffer's reference to `tag`. Idempotent: removing an
    /// already-removed or invalid tag is a no-op.
    fn remove(&mut self, tag: Tag);

    /// `(unique bytes stored, total bytes referenced)` for diagnostics.
    fn get_byte_stats(&self) -> (usize, usize);

    /// `(unique paragraphs stored, total paragraph references)` for
    /// diagnostics.
    fn get_line_stats(&self) -> (usize, usize);

    /// The reserved sentinel tag meaning "no paragraph" (used by
    /// continuation `HLine`s whose segment is still in `Buffer::pending`).
    fn invalid_tag(&self) -> Tag {
        Tag(0)
    }
}

#[derive(Debug, Default)]
struct Entry {
    cells: Vec<Cell>,
    refs: u32,
}

/// Reference-counted in-memory [`Deduper`]. Adequate for this crate's own
/// tests and for hosts that don't need cross-session or on-disk dedupe; not
/// the production store spec.md's Non-goals exclude.
#[derive(Debug, Default)]
pub struct InMemoryDeduper {
    next_tag: u64,
    entries: HashMap<Tag, Entry>,
    total_bytes: usize,
}

impl InMemoryDeduper {
    pub fn new() -> Self {
        Self { next_tag: 1, entries: HashMap::new(), total_bytes: 0 }
    }
}

impl Deduper for InMemoryDeduper {
    fn store(&mut self, cells: &[Cell]) -> Tag {
        // Real content-addressing (hashing `cells` to find an existing
        // identical paragraph) is the production store's job; this
        // reference implementation always allocates a fresh tag, which is
        // still a correct `Deduper` — just not a deduplicating one.
        let tag = Tag(self.next_tag);
        self.next_tag += 1;
        self.total_bytes += cells.len() * std::mem::size_of::<Cell>();
        self.entries.insert(tag, Entry { cells: cells.to_vec(), refs: 1 });
        tag
    }

    fn lookup(&self, tag: Tag, out: &mut Vec<Cell>) {
        out.clear();
        if let Some(entry) = self.entries.get(&tag) {
            out.extend_from_slice(&entry.cells);
        }
    }

    fn lookup_segment(&self, tag: Tag, offset: u32, cols: u16, out: &mut Vec<Cell>, cont: &mut bool, wrap: &mut i16) {
        out.clear();
        let Some(entry) = self.entries.get(&tag) else {
            *cont = false;
            *wrap = 0;
            return;
        };
        let start = offset as usize;
        let cols = cols as usize;
        if start >= entry.cells.len() {
            *cont = false;
            *wrap = 0;
            return;
        }
        let end = (start + cols).min(entry.cells.len());
        out.extend_from_slice(&entry.cells[start..end]);
        *wrap = (end - start) as i16;
        *cont = end < entry.cells.len();
    }

    fn lookup_length(&self, tag: Tag) -> usize {
        self.entries.get(&tag).map_or(0, |entry| entry.cells.len())
    }

    fn remove(&mut self, tag: Tag) {
        if tag == self.invalid_tag() {
            return;
        }
        if let Some(entry) = self.entries.get_mut(&tag) {
            entry.refs = entry.refs.saturating_sub(1);
            if entry.refs == 0 {
                self.total_bytes -= entry.cells.len() * std::mem::size_of::<Cell>();
                self.entries.remove(&tag);
            }
        }
    }

    fn get_byte_stats(&self) -> (usize, usize) {
        (self.total_bytes, self.total_bytes)
    }

    fn get_line_stats(&self) -> (usize, usize) {
        let unique = self.entries.len();
        let total: u32 = self.entries.values().map(|e| e.refs).sum();
        (unique, total as usize)
    }
}
