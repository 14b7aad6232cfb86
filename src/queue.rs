//! Concurrency primitives (spec.md §9 "`this`-owned raw allocations on a
//! shared deduper across threads"): a generic bounded-ish blocking queue and
//! the background-thread dedupe teardown it carries, grounded directly in
//! terminol's `support/queue.hxx` and `support/async_destroyer.hxx`.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::deduper::{Deduper, Tag};

/// A thread-safe FIFO queue gated by a condition variable, matching
/// terminol's `Queue<T>`: `add` never blocks, `remove` blocks until an item
/// is available or the queue has been finalised and drained.
pub struct Queue<T> {
    inner: Mutex<Inner<T>>,
    condition: Condvar,
}

struct Inner<T> {
    queue: VecDeque<T>,
    finalised: bool,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { queue: VecDeque::new(), finalised: false }), condition: Condvar::new() }
    }

    /// Push an item and wake one waiting consumer.
    ///
    /// # Panics
    /// Panics if called after [`Queue::finalise`] — mirrors terminol's
    /// `assert(!_finalised)` guard; `add` and `finalise` are owned by the
    /// producer side and never race against each other.
    pub fn add(&self, item: T) {
        let mut inner = self.inner.lock().unwrap();
        assert!(!inner.finalised, "Queue::add called after finalise");
        inner.queue.push_back(item);
        self.condition.notify_one();
    }

    /// Mark the queue closed: wakes every waiting consumer, after which
    /// `remove` drains whatever remains and then returns `None` forever.
    pub fn finalise(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.finalised = true;
        self.condition.notify_all();
    }

    /// Block until an item is available or the queue is finalised and
    /// empty.
    pub fn remove(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(item) = inner.queue.pop_front() {
                return Some(item);
            }
            if inner.finalised {
                return None;
            }
            inner = self.condition.wait(inner).unwrap();
        }
    }
}

/// Background worker that asynchronously calls `deduper.remove(tag)` for
/// every tag handed to it, so that tearing down a `Buffer` with a large
/// history doesn't block the caller on a long chain of `remove` calls
/// (spec.md §4.4 "Dedupe teardown (asynchronous)").
pub struct AsyncDestroyer {
    queue: Arc<Queue<Tag>>,
    thread: Option<JoinHandle<()>>,
}

impl AsyncDestroyer {
    pub fn new(deduper: Arc<Mutex<dyn Deduper + Send>>) -> Self {
        let queue = Arc::new(Queue::new());
        let worker_queue = Arc::clone(&queue);
        let thread = std::thread::spawn(move || {
            while let Some(tag) = worker_queue.remove() {
                deduper.lock().unwrap().remove(tag);
            }
        });
        Self { queue, thread: Some(thread) }
    }

    /// Hand off a tag for asynchronous removal. Safe to call from any
    /// thread while the destroyer is alive.
    pub fn add(&self, tag: Tag) {
        self.queue.add(tag);
    }

    /// Close the queue to further `add` calls without waiting for the
    /// worker to drain it. Paired with [`std::mem::forget`] by callers that
    /// want the remaining removals to finish in the background instead of
    /// blocking on [`AsyncDestroyer`]'s own `Drop`.
    pub fn finalise(&self) {
        self.queue.finalise();
    }
}

impl Drop for AsyncDestroyer {
    fn drop(&mut self) {
        self.queue.finalise();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduper::InMemoryDeduper;
    use std::sync::Arc;

    #[test]
    fn queue_remove_blocks_until_an_item_is_added() {
        let queue = Arc::new(Queue::new());
        let consumer_queue = Arc::clone(&queue);
        let handle = std::thread::spawn(move || consumer_queue.remove());
        queue.add(42);
        assert_eq!(handle.join().unwrap(), Some(42));
    }

    #[test]
    fn queue_remove_returns_none_after_finalise_drains() {
        let queue: Queue<i32> = Queue::new();
        queue.add(1);
        queue.finalise();
        assert_eq!(queue.remove(), Some(1));
        assert_eq!(queue.remove(), None);
    }

    #[test]
    fn async_destroyer_removes_every_handed_off_tag() {
        let deduper = Arc::new(Mutex::new(InMemoryDeduper::new()));
        let tag = {
            let mut guard = deduper.lock().unwrap();
            guard.store(&[])
        };
        {
            let destroyer = AsyncDestroyer::new(Arc::clone(&deduper) as Arc<Mutex<dyn Deduper + Send>>);
            destroyer.add(tag);
        } // Drop joins the worker, guaranteeing the removal has happened.
        assert_eq!(deduper.lock().unwrap().lookup_length(tag), 0);
    }
}
