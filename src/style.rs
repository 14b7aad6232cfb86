//! C3: the cell styling model (spec.md §3, "Style").
//!
//! `AttrSet` follows the teacher's `sgr_ops.rs`/`TuiStyleAttribs` precedent
//! of a `bitflags` set over the SGR toggle attributes rather than a struct
//! of bools, since attributes are combined and compared as a set far more
//! often than inspected field-by-field.

use bitflags::bitflags;

bitflags! {
    /// SGR toggle attributes. Each bit corresponds to one `Attr` member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrSet: u8 {
        const BOLD      = 0b0000_0001;
        const FAINT     = 0b0000_0010;
        const ITALIC    = 0b0000_0100;
        const UNDERLINE = 0b0000_1000;
        const BLINK     = 0b0001_0000;
        const INVERSE   = 0b0010_0000;
        const CONCEAL   = 0b0100_0000;
    }
}

/// Named "stock" colour slots a renderer resolves against its own theme,
/// rather than a fixed RGB triple (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockColor {
    TextFg,
    TextBg,
    SelectFg,
    SelectBg,
    CursorFill,
    CursorText,
}

/// A colour reference: a themed stock slot, an indexed palette entry (16
/// system colours + 6×6×6 colour cube + 24 greys), or a direct RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UColor {
    Stock(StockColor),
    Indexed(u8),
    Direct(u8, u8, u8),
}

impl UColor {
    /// `ESC[30..37m` / `ESC[90..97m` and the default SGR reset colour slots
    /// resolve to this rather than an indexed entry, matching terminol's
    /// default-colour handling (distinct from `INDEXED(0)`/`INDEXED(7)`,
    /// which are explicit palette picks).
    pub const fn default_fg() -> Self {
        UColor::Stock(StockColor::TextFg)
    }

    pub const fn default_bg() -> Self {
        UColor::Stock(StockColor::TextBg)
    }
}

/// A cell's full visual style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style {
    pub fg: UColor,
    pub bg: UColor,
    pub attrs: AttrSet,
}

impl Default for Style {
    fn default() -> Self {
        Self { fg: UColor::default_fg(), bg: UColor::default_bg(), attrs: AttrSet::empty() }
    }
}

impl Style {
    pub fn set_attr(&mut self, attr: AttrSet) {
        self.attrs.insert(attr);
    }

    pub fn unset_attr(&mut self, attr: AttrSet) {
        self.attrs.remove(attr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_uses_stock_text_colors() {
        let style = Style::default();
        assert_eq!(style.fg, UColor::Stock(StockColor::TextFg));
        assert_eq!(style.bg, UColor::Stock(StockColor::TextBg));
        assert!(style.attrs.is_empty());
    }

    #[test]
    fn sgr_reset_clears_attrs_and_restores_default_colors() {
        let mut style = Style { fg: UColor::Indexed(1), bg: UColor::Indexed(4), attrs: AttrSet::BOLD };
        style = Style::default();
        assert_eq!(style.fg, UColor::default_fg());
        assert!(!style.attrs.contains(AttrSet::BOLD));
    }
}
