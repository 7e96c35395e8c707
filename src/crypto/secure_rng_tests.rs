use super::secure_rng::*;
use crate::error::{WipeError, WipeErrorResult};

struct BrokenSource;

impl RandomSource for BrokenSource {
    fn fill_random(&self, _dest: &mut [u8]) -> WipeErrorResult<()> {
        Err(WipeError::RandomSourceFailed("entropy pool closed".into()))
    }

    fn name(&self) -> &str {
        "Broken"
    }
}

#[test]
fn test_ring_fills_whole_buffer() {
    let rng = RingSystemRNG::new();
    let mut buf = vec![0u8; 1 << 16];
    rng.fill_random(&mut buf).unwrap();
    // 64 KiB of zeros from a working CSPRNG is not a realistic outcome
    assert!(buf.iter().any(|&b| b != 0));
}

#[test]
fn test_os_random_fills_buffer() {
    let mut buf = [0u8; 256];
    OsRandom.fill_random(&mut buf).unwrap();
    assert!(buf.iter().any(|&b| b != 0));
}

#[test]
fn test_system_source_produces_distinct_output() {
    let source = SystemRandomSource::new();
    let mut a = [0u8; 64];
    let mut b = [0u8; 64];
    source.fill_random(&mut a).unwrap();
    source.fill_random(&mut b).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_failing_source_reports_random_source_failed() {
    let mut buf = [0u8; 16];
    let err = BrokenSource.fill_random(&mut buf).unwrap_err();
    assert!(matches!(err, WipeError::RandomSourceFailed(_)));
}

#[test]
fn test_global_helper() {
    let mut buf = [0u8; 32];
    secure_random_bytes(&mut buf).unwrap();
    assert!(buf.iter().any(|&b| b != 0));
}
