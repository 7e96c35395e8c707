//! Cryptographically secure randomness for random passes and discard-only
//! encryption keys.

use crate::error::{WipeError, WipeErrorResult};
use rand::rngs::OsRng;
use rand::RngCore;
use ring::rand::{SecureRandom, SystemRandom};

/// Source of secure random bytes.
pub trait RandomSource: Send + Sync {
    /// Fill the whole buffer or fail; partial fills are never reported as success.
    fn fill_random(&self, dest: &mut [u8]) -> WipeErrorResult<()>;
    /// Source name for logging
    fn name(&self) -> &str;
}

/// ring's `SystemRandom` (getrandom / BCryptGenRandom / SecRandomCopyBytes)
pub struct RingSystemRNG {
    rng: SystemRandom,
}

impl Default for RingSystemRNG {
    fn default() -> Self {
        Self::new()
    }
}

impl RingSystemRNG {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl RandomSource for RingSystemRNG {
    fn fill_random(&self, dest: &mut [u8]) -> WipeErrorResult<()> {
        self.rng
            .fill(dest)
            .map_err(|_| WipeError::RandomSourceFailed("ring SystemRandom failed".to_string()))
    }

    fn name(&self) -> &str {
        "RingSystemRNG"
    }
}

/// Operating system RNG through the `rand` crate
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_random(&self, dest: &mut [u8]) -> WipeErrorResult<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| WipeError::RandomSourceFailed(format!("OsRng: {}", e)))
    }

    fn name(&self) -> &str {
        "OsRng"
    }
}

/// Default source: ring first, the OS RNG if ring refuses.
#[derive(Default)]
pub struct SystemRandomSource {
    primary: RingSystemRNG,
}

impl SystemRandomSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RandomSource for SystemRandomSource {
    fn fill_random(&self, dest: &mut [u8]) -> WipeErrorResult<()> {
        match self.primary.fill_random(dest) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Primary RNG failed, falling back to OsRng");
                OsRandom.fill_random(dest)
            }
        }
    }

    fn name(&self) -> &str {
        "SystemRandomSource"
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_RNG: SystemRandomSource = SystemRandomSource::new();
}

/// Fill `dest` from the process-wide secure source.
pub fn secure_random_bytes(dest: &mut [u8]) -> WipeErrorResult<()> {
    GLOBAL_RNG.fill_random(dest)
}
