//! Pass planning: maps a [`WipeAlgorithm`] to its ordered list of passes.
//!
//! Nothing here touches a device. The tables are immutable and every call to
//! [`pass_plan`] hands back a fresh copy.

pub mod dod;
pub mod gutmann;
pub mod random;
pub mod zero;


use crate::WipeAlgorithm;

/// One sweep over the device.
///
/// Invariant: a non-random pass carries a 1- or 3-byte repeating pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSpec {
    pub is_random: bool,
    pub pattern: &'static [u8],
    pub description: &'static str,
}

impl PassSpec {
    pub const fn random(description: &'static str) -> Self {
        Self {
            is_random: true,
            pattern: &[],
            description,
        }
    }

    pub const fn pattern(pattern: &'static [u8], description: &'static str) -> Self {
        Self {
            is_random: false,
            pattern,
            description,
        }
    }

    pub fn is_deterministic(&self) -> bool {
        !self.is_random
    }

    pub fn is_valid(&self) -> bool {
        if self.is_random {
            self.pattern.is_empty()
        } else {
            matches!(self.pattern.len(), 1 | 3)
        }
    }
}

/// Ordered passes for `algorithm`. `VerifyOnly` has none.
pub fn pass_plan(algorithm: WipeAlgorithm) -> Vec<PassSpec> {
    let table: &[PassSpec] = match algorithm {
        WipeAlgorithm::Gutmann35 => &gutmann::GUTMANN_PASSES,
        WipeAlgorithm::Dod7 => &dod::DOD_7_PASSES,
        WipeAlgorithm::DodShort3 => &random::SCHNEIER_PASSES,
        WipeAlgorithm::Random1 => &random::RANDOM_PASSES,
        WipeAlgorithm::Zero1 => &zero::ZERO_PASSES,
        WipeAlgorithm::VerifyOnly => &[],
    };
    table.to_vec()
}

/// Fill `buf` with `pattern`, phased so that the byte at absolute device
/// offset `o` is `pattern[o % pattern.len()]`.
pub fn fill_pattern(buf: &mut [u8], pattern: &[u8], offset: u64) {
    if pattern.is_empty() {
        buf.fill(0);
        return;
    }
    if pattern.len() == 1 {
        buf.fill(pattern[0]);
        return;
    }
    let phase = (offset % pattern.len() as u64) as usize;
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = pattern[(phase + i) % pattern.len()];
    }
}

/// Offset of the first byte in `actual` that differs from the pattern
/// expected at `offset`.
pub fn find_pattern_mismatch(actual: &[u8], pattern: &[u8], offset: u64) -> Option<u64> {
    if pattern.is_empty() {
        return None;
    }
    let phase = (offset % pattern.len() as u64) as usize;
    actual
        .iter()
        .enumerate()
        .find(|(i, &b)| b != pattern[(phase + i) % pattern.len()])
        .map(|(i, _)| offset + i as u64)
}
