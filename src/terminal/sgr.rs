//! SGR (`CSI ... m`) handling (spec.md §4.3 "SGR handling"). Processes the
//! flattened argument list `vtparse` hands back, sequentially, the same way
//! the teacher's `sgr_ops.rs` walks each `Params` entry against a match
//! table rather than building an intermediate AST.

use crate::style::{AttrSet, Style, UColor};
use crate::vtparse::nth_arg_raw;

/// Apply one full `CSI ... m` parameter list to `style` in place. Unknown
/// codes are ignored (spec.md §4.3 "Unknown codes are ignored"); an empty
/// argument list is treated as a single implicit `0` (reset), matching
/// xterm's `CSI m` shorthand.
pub fn apply_sgr(style: &mut Style, args: &[u16]) {
    if args.is_empty() {
        *style = Style::default();
        return;
    }

    let mut i = 0;
    while i < args.len() {
        let code = args[i];
        match code {
            0 => *style = Style::default(),
            1 => style.set_attr(AttrSet::BOLD),
            2 => style.set_attr(AttrSet::FAINT),
            3 => style.set_attr(AttrSet::ITALIC),
            4 => style.set_attr(AttrSet::UNDERLINE),
            5 | 6 => style.set_attr(AttrSet::BLINK),
            7 => style.set_attr(AttrSet::INVERSE),
            8 => style.set_attr(AttrSet::CONCEAL),
            22 => style.unset_attr(AttrSet::BOLD | AttrSet::FAINT),
            23 => style.unset_attr(AttrSet::ITALIC),
            24 => style.unset_attr(AttrSet::UNDERLINE),
            25 => style.unset_attr(AttrSet::BLINK),
            27 => style.unset_attr(AttrSet::INVERSE),
            28 => style.unset_attr(AttrSet::CONCEAL),
            30..=37 => style.fg = UColor::Indexed((code - 30) as u8),
            38 => {
                let (color, consumed) = extended_color(&args[i + 1..]);
                if let Some(color) = color {
                    style.fg = color;
                }
                i += consumed;
            }
            39 => style.fg = UColor::default_fg(),
            40..=47 => style.bg = UColor::Indexed((code - 40) as u8),
            48 => {
                let (color, consumed) = extended_color(&args[i + 1..]);
                if let Some(color) = color {
                    style.bg = color;
                }
                i += consumed;
            }
            49 => style.bg = UColor::default_bg(),
            90..=97 => style.fg = UColor::Indexed((code - 90 + 8) as u8),
            100..=107 => style.bg = UColor::Indexed((code - 100 + 8) as u8),
            _ => {}
        }
        i += 1;
    }
}

/// Parse the `5;n` (indexed) or `2;r;g;b` (direct) tail that follows a `38`
/// or `48` code, returning the resolved colour and how many trailing
/// arguments were consumed beyond the `38`/`48` itself.
fn extended_color(rest: &[u16]) -> (Option<UColor>, usize) {
    match rest.first() {
        Some(&5) => {
            let index = nth_arg_raw(rest, 1, 0).min(255) as u8;
            (Some(UColor::Indexed(index)), 2)
        }
        Some(&2) => {
            let r = nth_arg_raw(rest, 1, 0) as u8;
            let g = nth_arg_raw(rest, 2, 0) as u8;
            let b = nth_arg_raw(rest, 3, 0) as u8;
            (Some(UColor::Direct(r, g, b)), 4)
        }
        _ => (None, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn reset_restores_default_style() {
        let mut style = Style { fg: UColor::Indexed(1), bg: UColor::Indexed(2), attrs: AttrSet::BOLD };
        apply_sgr(&mut style, &[0]);
        assert_eq!(style, Style::default());
    }

    #[test]
    fn empty_args_means_implicit_reset() {
        let mut style = Style { fg: UColor::Indexed(1), ..Style::default() };
        apply_sgr(&mut style, &[]);
        assert_eq!(style.fg, UColor::default_fg());
    }

    #[test_case(&[31], UColor::Indexed(1); "basic red")]
    #[test_case(&[91], UColor::Indexed(9); "bright red")]
    #[test_case(&[38, 5, 200], UColor::Indexed(200); "indexed 256")]
    #[test_case(&[38, 2, 10, 20, 30], UColor::Direct(10, 20, 30); "direct rgb")]
    fn sets_foreground_colour(args: &[u16], expected: UColor) {
        let mut style = Style::default();
        apply_sgr(&mut style, args);
        assert_eq!(style.fg, expected);
    }

    #[test]
    fn sgr_reset_then_bold_then_plain_b_scenario() {
        // Scenario 2 (spec.md §8): "\x1b[31mA\x1b[0mB".
        let mut style = Style::default();
        apply_sgr(&mut style, &[31]);
        assert_eq!(style.fg, UColor::Indexed(1));
        apply_sgr(&mut style, &[0]);
        assert_eq!(style.fg, UColor::default_fg());
    }

    #[test]
    fn unknown_codes_are_ignored_without_disturbing_other_attrs() {
        let mut style = Style::default();
        style.set_attr(AttrSet::BOLD);
        apply_sgr(&mut style, &[58, 2, 1, 2, 3]);
        assert!(style.attrs.contains(AttrSet::BOLD));
    }

    #[test]
    fn clearing_bold_also_clears_faint_per_xterm_convention() {
        let mut style = Style::default();
        apply_sgr(&mut style, &[1, 2]);
        apply_sgr(&mut style, &[22]);
        assert!(!style.attrs.contains(AttrSet::BOLD));
        assert!(!style.attrs.contains(AttrSet::FAINT));
    }
}
