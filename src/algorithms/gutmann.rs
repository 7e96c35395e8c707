use super::PassSpec;

/// Peter Gutmann's 35-pass table (1996).
///
/// Passes 1-4 and 32-35 are random. Passes 5-31 target MFM and RLL(2,7)
/// encodings. The order is a published table and must not be recomputed.
pub(crate) const GUTMANN_PASSES: [PassSpec; 35] = [
    PassSpec::random("Random pass 1"),
    PassSpec::random("Random pass 2"),
    PassSpec::random("Random pass 3"),
    PassSpec::random("Random pass 4"),
    PassSpec::pattern(&[0x55], "0x55 (MFM/RLL)"), // 5
    PassSpec::pattern(&[0xAA], "0xAA (MFM/RLL)"), // 6
    PassSpec::pattern(&[0x92, 0x49, 0x24], "0x92 0x49 0x24 (MFM)"), // 7
    PassSpec::pattern(&[0x49, 0x24, 0x92], "0x49 0x24 0x92 (MFM)"), // 8
    PassSpec::pattern(&[0x24, 0x92, 0x49], "0x24 0x92 0x49 (MFM)"), // 9
    PassSpec::pattern(&[0x00], "0x00 sweep"), // 10
    PassSpec::pattern(&[0x11], "0x11 sweep"),
    PassSpec::pattern(&[0x22], "0x22 sweep"),
    PassSpec::pattern(&[0x33], "0x33 sweep"),
    PassSpec::pattern(&[0x44], "0x44 sweep"),
    PassSpec::pattern(&[0x55], "0x55 sweep"),
    PassSpec::pattern(&[0x66], "0x66 sweep"),
    PassSpec::pattern(&[0x77], "0x77 sweep"),
    PassSpec::pattern(&[0x88], "0x88 sweep"),
    PassSpec::pattern(&[0x99], "0x99 sweep"),
    PassSpec::pattern(&[0xAA], "0xAA sweep"),
    PassSpec::pattern(&[0xBB], "0xBB sweep"),
    PassSpec::pattern(&[0xCC], "0xCC sweep"),
    PassSpec::pattern(&[0xDD], "0xDD sweep"),
    PassSpec::pattern(&[0xEE], "0xEE sweep"),
    PassSpec::pattern(&[0xFF], "0xFF sweep"), // 25
    PassSpec::pattern(&[0x92, 0x49, 0x24], "0x92 0x49 0x24 (RLL 2,7)"), // 26
    PassSpec::pattern(&[0x49, 0x24, 0x92], "0x49 0x24 0x92 (RLL 2,7)"), // 27
    PassSpec::pattern(&[0x24, 0x92, 0x49], "0x24 0x92 0x49 (RLL 2,7)"), // 28
    PassSpec::pattern(&[0x6D, 0xB6, 0xDB], "0x6D 0xB6 0xDB (RLL 2,7)"), // 29
    PassSpec::pattern(&[0xB6, 0xDB, 0x6D], "0xB6 0xDB 0x6D (RLL 2,7)"), // 30
    PassSpec::pattern(&[0xDB, 0x6D, 0xB6], "0xDB 0x6D 0xB6 (RLL 2,7)"), // 31
    PassSpec::random("Random pass 32"),
    PassSpec::random("Random pass 33"),
    PassSpec::random("Random pass 34"),
    PassSpec::random("Random pass 35"),
];
