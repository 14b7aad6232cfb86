//! Configuration consumed by `Terminal` (spec.md §6.4). Parsing a config
//! file or CLI flags into this struct is explicitly out of scope (spec.md
//! §1 Non-goals) — the host constructs `Config` itself and passes it by
//! reference into `Terminal::new`, the same embedding split terminol's
//! `Config` / `Terminal` and the teacher's library/binary split both use.

/// Plain data, field-for-field matching spec.md §6.4.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub scroll_back_history: usize,
    pub unlimited_scroll_back: bool,

    pub scroll_with_history: bool,
    pub scroll_on_tty_output: bool,
    pub scroll_on_tty_key_press: bool,
    pub scroll_on_paste: bool,
    pub scroll_on_resize: bool,

    /// Toggles the xterm wrap-next quirk (spec.md §4.4 `backspace`).
    pub traditional_wrapping: bool,

    /// Word-selection regex class body, consulted by
    /// `Buffer::expand_selection` at level 2 (spec.md §4.4).
    pub cut_chars: String,

    pub custom_select_fg_color: bool,
    pub custom_select_bg_color: bool,
    pub custom_cursor_fill_color: bool,
    pub custom_cursor_text_color: bool,

    pub initial_rows: u16,
    pub initial_cols: u16,
}

impl Config {
    /// The effective scroll-back limit, honouring `unlimited_scroll_back`
    /// (terminol passes `std::numeric_limits<int32_t>::max()` for the
    /// primary buffer in this case; the alternate screen buffer always
    /// keeps `0` regardless of this setting).
    pub fn effective_history_limit(&self) -> u32 {
        if self.unlimited_scroll_back {
            i32::MAX as u32
        } else {
            self.scroll_back_history as u32
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scroll_back_history: 1_000,
            unlimited_scroll_back: false,
            scroll_with_history: false,
            scroll_on_tty_output: true,
            scroll_on_tty_key_press: true,
            scroll_on_paste: true,
            scroll_on_resize: true,
            traditional_wrapping: false,
            cut_chars: ",.\"'`()[]{}<>:;|\\ \t".to_owned(),
            custom_select_fg_color: false,
            custom_select_bg_color: false,
            custom_cursor_fill_color: false,
            custom_cursor_text_color: false,
            initial_rows: 24,
            initial_cols: 80,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_scroll_back_overrides_the_numeric_limit() {
        let config = Config { unlimited_scroll_back: true, scroll_back_history: 10, ..Config::default() };
        assert_eq!(config.effective_history_limit(), i32::MAX as u32);
    }

    #[test]
    fn default_matches_terminol_defaults() {
        let config = Config::default();
        assert!(!config.traditional_wrapping);
        assert_eq!(config.initial_rows, 24);
        assert_eq!(config.initial_cols, 80);
    }
}
