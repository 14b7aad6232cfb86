//! vtcore: the reusable core of a VT-style terminal emulator (spec.md
//! §OVERVIEW) — UTF-8 decoding, ANSI/VT sequence parsing, a deduplicated
//! scroll-back screen buffer, and the `Terminal` façade that ties them
//! together behind a host-supplied `Renderer`/`Observer` pair. Laid out the
//! way the teacher splits a multi-crate terminal core into cooperating
//! top-level modules rather than one flat file per concern.
//!
//! Host integration (windowing, PTY spawning, font rendering, key-binding
//! tables, config-file parsing) is explicitly out of scope (spec.md §1
//! Non-goals) — this crate is the part that is the same across hosts.

pub mod buffer;
pub mod cell;
pub mod charset;
pub mod config;
pub mod deduper;
pub mod error;
pub mod geometry;
pub mod observer;
pub mod queue;
pub mod renderer;
pub mod style;
pub mod terminal;
pub mod utf8;
pub mod vtparse;

pub use buffer::Buffer;
pub use config::Config;
pub use deduper::{Deduper, InMemoryDeduper};
pub use error::{Result, VtCoreError};
pub use observer::Observer;
pub use renderer::Renderer;
pub use terminal::Terminal;
