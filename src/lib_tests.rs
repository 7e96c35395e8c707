// Tests for lib.rs core types: interrupt flag, algorithm naming and parsing,
// drive type helpers and result bookkeeping.

use super::*;
use serial_test::serial;
use test_case::test_case;

// ==================== INTERRUPT HANDLING TESTS ====================

#[test]
#[serial]
fn test_interrupt_initially_not_set() {
    reset_interrupted();
    assert!(
        !is_interrupted(),
        "Interrupt flag should initially be not set"
    );
}

#[test]
#[serial]
fn test_set_interrupt_flag() {
    reset_interrupted();
    set_interrupted();
    assert!(is_interrupted(), "Interrupt flag should be set");
    reset_interrupted();
}

// ==================== ALGORITHM TESTS ====================

#[test_case("gutmann", WipeAlgorithm::Gutmann35 ; "gutmann")]
#[test_case("dod522022m", WipeAlgorithm::Dod7 ; "dod canonical")]
#[test_case("DoD", WipeAlgorithm::Dod7 ; "dod alias any case")]
#[test_case("dodshort", WipeAlgorithm::DodShort3 ; "dodshort")]
#[test_case("schneier", WipeAlgorithm::DodShort3 ; "schneier alias")]
#[test_case(" random ", WipeAlgorithm::Random1 ; "random trimmed")]
#[test_case("zero", WipeAlgorithm::Zero1 ; "zero")]
#[test_case("verify", WipeAlgorithm::VerifyOnly ; "verify")]
fn test_algorithm_parse(input: &str, expected: WipeAlgorithm) {
    assert_eq!(input.parse::<WipeAlgorithm>().unwrap(), expected);
}

#[test]
fn test_algorithm_parse_unknown() {
    let err = "shred".parse::<WipeAlgorithm>().unwrap_err();
    assert!(err.contains("shred"));
}

#[test]
fn test_config_name_parses_back() {
    for algorithm in WipeAlgorithm::ALL {
        assert_eq!(
            algorithm.config_name().parse::<WipeAlgorithm>().unwrap(),
            algorithm
        );
    }
}

#[test_case(WipeAlgorithm::Gutmann35, 35)]
#[test_case(WipeAlgorithm::Dod7, 7)]
#[test_case(WipeAlgorithm::DodShort3, 3)]
#[test_case(WipeAlgorithm::Random1, 1)]
#[test_case(WipeAlgorithm::Zero1, 1)]
#[test_case(WipeAlgorithm::VerifyOnly, 0)]
fn test_published_pass_counts(algorithm: WipeAlgorithm, passes: usize) {
    assert_eq!(algorithm.pass_count(), passes);
}

#[test]
fn test_default_algorithm_is_gutmann() {
    assert_eq!(WipeAlgorithm::default(), WipeAlgorithm::Gutmann35);
}

// ==================== DRIVE TYPE TESTS ====================

#[test]
fn test_flash_media() {
    assert!(DriveType::SSD.is_flash());
    assert!(DriveType::NVMe.is_flash());
    assert!(!DriveType::HDD.is_flash());
    assert!(!DriveType::Unknown.is_flash());
}

#[test]
fn test_drive_type_serialization() {
    let json = serde_json::to_string(&DriveType::NVMe).unwrap();
    let back: DriveType = serde_json::from_str(&json).unwrap();
    assert_eq!(back, DriveType::NVMe);
}

// ==================== RESULT / PROGRESS TESTS ====================

#[test]
fn test_new_result_is_not_success() {
    let result = WipeResult::new(7);
    assert_eq!(result.passes_total, 7);
    assert_eq!(result.passes_completed, 0);
    assert!(!result.is_success());
}

#[test]
fn test_progress_percent() {
    let progress = WipeProgress {
        pass_index: 1,
        pass_count: 1,
        bytes_done: 256,
        bytes_total: 1024,
        speed: 0.0,
        eta: Duration::ZERO,
        description: String::new(),
        is_verify_phase: false,
    };
    assert!((progress.percent() - 25.0).abs() < f64::EPSILON);

    let empty = WipeProgress {
        bytes_total: 0,
        ..progress
    };
    assert_eq!(empty.percent(), 0.0);
}
