use super::PassSpec;

pub(crate) const ZERO_PASSES: [PassSpec; 1] = [PassSpec::pattern(&[0x00], "Zero fill")];
