/// Dead-man trigger integration tests
///
/// The real wipe orchestrator runs against a simulated device; signals,
/// console, encryption and power are journaling fakes.
#[path = "common/mod.rs"]
mod common;

use common::fakes::{CountingShield, FakePower, Journal, NoEncryption, RecordingConsole};
use common::{all_bytes_are, orchestrator, SimulatedDevice};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use vault_wipe::config::VaultConfig;
use vault_wipe::deadman::{DeadManReport, DeadManState, DeadManTrigger};
use vault_wipe::{WipeAlgorithm, WipeError};

const TARGET: &str = "/dev/sim0";

struct Harness {
    journal: Journal,
    engaged: Arc<AtomicUsize>,
    powered_off: Arc<AtomicBool>,
}

impl Harness {
    fn new() -> Self {
        Self {
            journal: Journal::default(),
            engaged: Arc::new(AtomicUsize::new(0)),
            powered_off: Arc::new(AtomicBool::new(false)),
        }
    }

    fn fire(&self, config: VaultConfig, device: &SimulatedDevice, refuse_power: bool) -> DeadManReport {
        DeadManTrigger::new(
            config,
            Box::new(CountingShield {
                journal: self.journal.clone(),
                engaged: Arc::clone(&self.engaged),
            }),
            Box::new(RecordingConsole {
                journal: self.journal.clone(),
            }),
            Box::new(NoEncryption {
                journal: self.journal.clone(),
            }),
            Box::new(orchestrator(device)),
            Box::new(FakePower {
                journal: self.journal.clone(),
                refuse: refuse_power,
                powered_off: Arc::clone(&self.powered_off),
            }),
        )
        .fire()
    }
}

fn vault_config(algorithm: WipeAlgorithm) -> VaultConfig {
    VaultConfig {
        target_device: TARGET.to_string(),
        wipe_algorithm: algorithm,
        verify_passes: true,
        countdown_secs: 3,
        ..VaultConfig::default()
    }
}

#[test]
fn test_failed_wipe_falls_back_to_random_pass_and_powers_off() {
    let device = SimulatedDevice::new(256 * 1024);
    device.fail_writes_on_pass(3);
    let harness = Harness::new();

    let report = harness.fire(vault_config(WipeAlgorithm::Dod7), &device, false);

    assert!(matches!(
        report.primary.error,
        Some(WipeError::WriteError { pass: 3, .. })
    ));
    assert_eq!(report.primary.passes_completed, 2);

    let fallback = report.fallback.expect("fallback ran");
    assert!(fallback.is_success(), "{:?}", fallback.error);
    assert_eq!(fallback.passes_total, 1);

    // three primary passes started, then exactly one fallback pass
    assert_eq!(device.passes_started(), 4);
    // fallback is unverified
    assert_eq!(device.read_opens(), 2);
    assert!(!all_bytes_are(&device.snapshot(), 0xEE));

    assert!(harness.powered_off.load(Ordering::SeqCst));
    assert!(report.power_off_error.is_none());
    assert!(!report.pre_encrypted);
}

#[test]
fn test_successful_wipe_runs_once() {
    let device = SimulatedDevice::new(128 * 1024);
    let harness = Harness::new();

    let report = harness.fire(vault_config(WipeAlgorithm::Zero1), &device, false);

    assert!(report.primary.is_success());
    assert!(report.fallback.is_none());
    assert_eq!(device.passes_started(), 1);
    assert!(all_bytes_are(&device.snapshot(), 0x00));
    assert_eq!(report.states.last(), Some(&DeadManState::SyncedAndPoweringOff));
}

#[test]
fn test_sequence_order() {
    let device = SimulatedDevice::new(64 * 1024);
    let harness = Harness::new();

    harness.fire(vault_config(WipeAlgorithm::Random1), &device, false);

    let events = harness.journal.events();
    assert_eq!(events.first().map(String::as_str), Some("shield"));
    assert_eq!(events.last().map(String::as_str), Some("power_off"));
    assert_eq!(harness.engaged.load(Ordering::SeqCst), 1);

    let at = |prefix: &str| {
        harness
            .journal
            .position(prefix)
            .unwrap_or_else(|| panic!("missing {:?} in {:?}", prefix, events))
    };
    assert!(at("countdown 3") < at("unmount /vault"));
    assert!(at("unmount /vault") < at("close vault_crypt"));
    assert!(at("close vault_crypt") < at("wiping /dev/sim0"));
    assert!(at("wiping /dev/sim0") < at("sync"));
    assert!(at("sync") < at("status Wipe complete. Powering off..."));
    assert!(at("pause 2000ms") < at("power_off"));

    // encryption unavailable, so no format attempt
    assert!(harness.journal.position("format").is_none());
}

#[test]
fn test_unknown_size_still_ends_in_power_off() {
    let device = SimulatedDevice::new(64 * 1024);
    device.report_unknown_size();
    let harness = Harness::new();

    let report = harness.fire(vault_config(WipeAlgorithm::Gutmann35), &device, false);

    assert!(matches!(
        report.primary.error,
        Some(WipeError::DeviceSizeUnknown { .. })
    ));
    assert!(report.fallback.as_ref().map_or(false, |r| !r.is_success()));
    assert!(harness.powered_off.load(Ordering::SeqCst));
}

#[test]
fn test_refused_power_off_is_reported() {
    let device = SimulatedDevice::new(64 * 1024);
    let harness = Harness::new();

    let report = harness.fire(vault_config(WipeAlgorithm::Zero1), &device, true);

    assert!(report.power_off_error.is_some());
    assert!(!harness.powered_off.load(Ordering::SeqCst));
}
