//! C7's output interface (spec.md §6.3): everything a `Terminal` asks its
//! host to do that isn't buffer painting — clipboard, window chrome,
//! resize requests, child-process reaping. Mirrors terminol's
//! `Terminal::I_Observer` one-for-one; like [`crate::renderer::Renderer`],
//! this exists so `Terminal` never holds a concrete reference to its host.

use crate::geometry::Region;
use crate::renderer::Renderer;

/// Which X11-style selection a copy/paste request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Primary,
    Clipboard,
}

/// Host-provided sink for everything `Terminal` needs done outside the
/// buffer itself.
pub trait Observer: Renderer {
    /// The child wrote `text` destined for `selection` (OSC 52 or an
    /// explicit selection gesture).
    fn terminal_copy(&mut self, text: &str, selection: Selection);

    /// The child is requesting the current contents of `selection`.
    fn terminal_paste(&mut self, selection: Selection);

    /// `ESC ] 666` / "resize font" private sequences, relative to the
    /// window (`local`) or every window of the host application
    /// (`global`); `delta` is in whatever unit the host's font stepping
    /// uses.
    fn terminal_resize_local_font(&mut self, delta: i32);
    fn terminal_resize_global_font(&mut self, delta: i32);

    fn terminal_reset_title_and_icon(&mut self);
    fn terminal_set_window_title(&mut self, title: &str, transient: bool);
    fn terminal_set_icon_name(&mut self, name: &str);

    fn terminal_bell(&mut self);

    /// The child requested a size change via a private escape (rather than
    /// the host's own window-resize path).
    fn terminal_resize_buffer(&mut self, rows: u16, cols: u16);

    /// Called before a damage-driven render pass begins; `false` aborts the
    /// pass (e.g. the window isn't currently visible).
    fn terminal_fix_damage_begin(&mut self) -> bool;

    fn terminal_draw_scrollbar(&mut self, total_rows: u32, history_offset: u32, visible_rows: u16);

    /// Called after a damage-driven render pass completes.
    fn terminal_fix_damage_end(&mut self, damage: Region, scrollbar: bool);

    /// The child process has exited; `status` is its wait(2) status.
    fn terminal_reaped(&mut self, status: i32);
}
