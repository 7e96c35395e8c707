use super::PassSpec;

/// DoD 5220.22-M extended seven-pass sequence.
pub(crate) const DOD_7_PASSES: [PassSpec; 7] = [
    PassSpec::pattern(&[0x00], "0x00 fill"),
    PassSpec::pattern(&[0xFF], "0xFF fill"),
    PassSpec::random("Random fill"),
    PassSpec::pattern(&[0x00], "0x00 fill"),
    PassSpec::pattern(&[0xFF], "0xFF fill"),
    PassSpec::random("Random fill"),
    PassSpec::random("Random fill (final)"),
];
