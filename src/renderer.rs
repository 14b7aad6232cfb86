//! C6's output interface (spec.md §6.2): the trait a host implements to
//! paint a `Buffer`'s damaged region. Modelled directly on terminol's
//! `Buffer::I_Renderer` and, in idiom, on the teacher's `Perform`-style
//! trait-at-the-seam approach to avoiding a back-reference from the
//! engine into its host.

use crate::geometry::Pos;
use crate::style::{AttrSet, UColor};

/// Consumed by `Buffer::dispatch_bg` / `dispatch_fg` / `dispatch_cursor`
/// during a damage-driven render pass. Implementations own pixel/cell
/// painting; `vtcore` never touches a framebuffer directly.
pub trait Renderer {
    /// Paint `count` cells starting at `pos` with background `color`.
    fn buffer_draw_bg(&mut self, pos: Pos, count: i16, color: UColor);

    /// Paint `count` cells' worth of foreground glyphs starting at `pos`.
    /// `bytes[..size]` holds `count` concatenated grapheme runs.
    fn buffer_draw_fg(&mut self, pos: Pos, count: i16, color: UColor, attrs: AttrSet, bytes: &[u8], size: usize);

    /// Paint the cursor cell, which carries its own colours independent of
    /// the underlying cell's style.
    fn buffer_draw_cursor(
        &mut self,
        pos: Pos,
        fg: UColor,
        bg: UColor,
        attrs: AttrSet,
        bytes: &[u8],
        size: usize,
        wrap_next: bool,
    );
}
