use super::PassSpec;

/// Bruce Schneier's method, also used for the DoD short form.
pub(crate) const SCHNEIER_PASSES: [PassSpec; 3] = [
    PassSpec::random("Random pass 1"),
    PassSpec::random("Random pass 2"),
    PassSpec::random("Random pass 3"),
];

pub(crate) const RANDOM_PASSES: [PassSpec; 1] = [PassSpec::random("Cryptographic random")];
