//! C4: per-register ASCII→UTF-8 substitution tables (spec.md §3 "SavedCursor",
//! §4.3 "CharSet"), grounded in terminol's `CharSub`/`CharSubArray`
//! (`common/buffer.hxx`) and the three concrete tables `Terminal` installs
//! (`common/terminal.cxx`): US-ASCII (identity), UK (`#` → `£`), and DEC
//! Special Graphics (the `` ` ``–`~` line-drawing set).

/// One of the four character-set registers a cursor can select between via
/// `SI`/`SO`/`LS2`/`LS3` and designate via `ESC ( / ) / * / +`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharSet {
    G0,
    G1,
    G2,
    G3,
}

/// A translation table substituting a contiguous run of ASCII codes with
/// UTF-8 sequences. A dummy `CharSub` (the default, `CS_US`) performs no
/// substitution at all.
#[derive(Debug, Clone, Copy)]
pub struct CharSub {
    seqs: &'static [[u8; 4]],
    offset: u8,
    special: bool,
}

impl CharSub {
    const fn identity() -> Self {
        Self { seqs: &[], offset: 0, special: false }
    }

    const fn new(seqs: &'static [[u8; 4]], offset: u8, special: bool) -> Self {
        Self { seqs, offset, special }
    }

    /// Replace `seq` in place if `seq`'s lead byte falls within this
    /// table's substitution range. Single-byte ASCII input only: multi-byte
    /// sequences are never members of any substitution table's domain.
    pub fn translate(&self, seq: &mut [u8; 4]) {
        if self.seqs.is_empty() {
            return;
        }
        let byte = seq[0];
        if byte < self.offset {
            return;
        }
        let index = (byte - self.offset) as usize;
        if let Some(replacement) = self.seqs.get(index) {
            *seq = *replacement;
        }
    }

    /// True for DEC Special Graphics: glyphs in this set mask off BOLD and
    /// ITALIC when written (spec.md §4.4).
    pub fn is_special(&self) -> bool {
        self.special
    }
}

const UK_SEQS: [[u8; 4]; 1] = [
    [0xC2, 0xA3, 0, 0], // POUND: £
];

const SPECIAL_SEQS: [[u8; 4]; 31] = [
    [0xE2, 0x99, 0xA6, 0], // diamond: ♦
    [0xE2, 0x96, 0x92, 0], // 50% cell: ▒
    [0xE2, 0x90, 0x89, 0], // HT: ␉
    [0xE2, 0x90, 0x8C, 0], // FF: ␌
    [0xE2, 0x90, 0x8D, 0], // CR: ␍
    [0xE2, 0x90, 0x8A, 0], // LF: ␊
    [0xC2, 0xB0, 0, 0],    // Degree: °
    [0xC2, 0xB1, 0, 0],    // Plus/Minus: ±
    [0xE2, 0x90, 0xA4, 0], // NL: ␤
    [0xE2, 0x90, 0x8B, 0], // VT: ␋
    [0xE2, 0x94, 0x98, 0], // CN_RB: ┘
    [0xE2, 0x94, 0x90, 0], // CN_RT: ┐
    [0xE2, 0x94, 0x8C, 0], // CN_LT: ┌
    [0xE2, 0x94, 0x94, 0], // CN_LB: └
    [0xE2, 0x94, 0xBC, 0], // CROSS: ┼
    [0xE2, 0x8E, 0xBA, 0], // Horiz. Scan Line 1: ⎺
    [0xE2, 0x8E, 0xBB, 0], // Horiz. Scan Line 3: ⎻
    [0xE2, 0x94, 0x80, 0], // Horiz. Scan Line 5: ─
    [0xE2, 0x8E, 0xBC, 0], // Horiz. Scan Line 7: ⎼
    [0xE2, 0x8E, 0xBD, 0], // Horiz. Scan Line 9: ⎽
    [0xE2, 0x94, 0x9C, 0], // TR: ├
    [0xE2, 0x94, 0xA4, 0], // TL: ┤
    [0xE2, 0x94, 0xB4, 0], // TU: ┴
    [0xE2, 0x94, 0xAC, 0], // TD: ┬
    [0xE2, 0x94, 0x82, 0], // V: │
    [0xE2, 0x89, 0xA4, 0], // LE: ≤
    [0xE2, 0x89, 0xA5, 0], // GE: ≥
    [0xCF, 0x80, 0, 0],    // PI: π
    [0xE2, 0x89, 0xA0, 0], // NEQ: ≠
    [0xC2, 0xA3, 0, 0],    // POUND: £
    [0xE2, 0x8B, 0x85, 0], // DOT: ⋅
];

pub static CS_US: CharSub = CharSub::identity();
pub static CS_UK: CharSub = CharSub::new(&UK_SEQS, b'#', false);
pub static CS_SPECIAL: CharSub = CharSub::new(&SPECIAL_SEQS, b'`', true);

/// Resolve a `scs` designator code (the byte following `ESC ( ` etc.) to a
/// substitution table. `None` for recognised-but-unimplemented designators
/// (national variants terminol itself never implemented) and unknown codes.
pub fn lookup(code: u8) -> Option<&'static CharSub> {
    match code {
        b'0' => Some(&CS_SPECIAL),
        b'A' => Some(&CS_UK),
        b'B' => Some(&CS_US),
        _ => None,
    }
}

/// The four character-set registers and which `CharSub` is loaded into
/// each. Constructed once per `Buffer` and snapshotted into `SavedCursor`.
#[derive(Debug, Clone, Copy)]
pub struct CharSubArray {
    subs: [&'static CharSub; 4],
}

impl CharSubArray {
    pub const fn new(
        g0: &'static CharSub,
        g1: &'static CharSub,
        g2: &'static CharSub,
        g3: &'static CharSub,
    ) -> Self {
        Self { subs: [g0, g1, g2, g3] }
    }

    /// terminol's default: G0/G2/G3 plain ASCII, G1 DEC Special Graphics
    /// (ready for an immediate `SO`/`LS1`).
    pub const fn default_set() -> Self {
        Self::new(&CS_US, &CS_SPECIAL, &CS_US, &CS_US)
    }

    pub fn set(&mut self, set: CharSet, sub: &'static CharSub) {
        self.subs[set as usize] = sub;
    }

    pub fn get(&self, set: CharSet) -> &'static CharSub {
        self.subs[set as usize]
    }
}

impl Default for CharSubArray {
    fn default() -> Self {
        Self::default_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uk_table_substitutes_hash_for_pound() {
        let mut seq = [b'#', 0, 0, 0];
        CS_UK.translate(&mut seq);
        assert_eq!(seq, [0xC2, 0xA3, 0, 0]);
    }

    #[test]
    fn us_table_is_identity() {
        let mut seq = [b'#', 0, 0, 0];
        CS_US.translate(&mut seq);
        assert_eq!(seq, [b'#', 0, 0, 0]);
    }

    #[test]
    fn special_table_maps_backtick_to_diamond_and_is_marked_special() {
        let mut seq = [b'`', 0, 0, 0];
        CS_SPECIAL.translate(&mut seq);
        assert_eq!(seq, [0xE2, 0x99, 0xA6, 0]);
        assert!(CS_SPECIAL.is_special());
        assert!(!CS_US.is_special());
    }

    #[test]
    fn special_table_covers_full_backtick_to_tilde_range() {
        let mut seq = [b'~', 0, 0, 0];
        CS_SPECIAL.translate(&mut seq);
        assert_eq!(seq, [0xE2, 0x8B, 0x85, 0]);
    }

    #[test]
    fn char_sub_array_defaults_put_special_graphics_in_g1() {
        let array = CharSubArray::default();
        assert!(std::ptr::eq(array.get(CharSet::G1), &CS_SPECIAL));
        assert!(std::ptr::eq(array.get(CharSet::G0), &CS_US));
    }
}
