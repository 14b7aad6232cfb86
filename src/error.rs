//! Error taxonomy for `vtcore` (spec.md §7).
//!
//! Most of the conditions spec.md lists under "error handling" are not
//! errors at all from this crate's point of view: malformed UTF-8, bad
//! escape sequences, and out-of-range SGR parameters are dropped or
//! clamped silently (with a `tracing` warning where useful) and never
//! reach the caller as a `Result::Err`. `VtCoreError` only covers the
//! handful of conditions where continuing would be a caller bug rather
//! than a byte-stream quirk.

use thiserror::Error;

/// Errors surfaced by the public API of `vtcore`.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum VtCoreError {
    /// A `Buffer` mutation was attempted while a `dispatch` pass was in
    /// progress, outside of the "may resize during dispatch" contract
    /// `Terminal` uses for font-size changes.
    #[error("buffer mutated re-entrantly during dispatch")]
    Reentrant,

    /// A resize was requested with a non-positive row or column count.
    #[error("invalid geometry: rows={rows}, cols={cols}")]
    InvalidGeometry {
        /// Requested row count.
        rows: i32,
        /// Requested column count.
        cols: i32,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VtCoreError>;
