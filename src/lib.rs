// Allow uppercase acronyms for industry-standard terms like HDD, SSD
#![allow(clippy::upper_case_acronyms)]

pub mod algorithms;
pub mod config;
pub mod crypto;
pub mod deadman;
pub mod drives;
pub mod encryption;
pub mod error;
pub mod io;
pub mod system;
pub mod ui;
pub mod wipe_orchestrator;

// Re-export the outward-facing operations for convenience
pub use deadman::deadman_trigger;
pub use drives::detection::detect_drive_type;
pub use error::{WipeError, WipeErrorResult};
pub use io::platform_specific::get_device_size;
pub use wipe_orchestrator::{vault_wipe_device, wipe_execute, WipeOrchestrator};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// Global flag for handling Ctrl+C interrupts in the standalone CLI
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Set the interrupt flag (called by signal handler)
pub fn set_interrupted() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Check if an interrupt has been received
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Reset the interrupt flag (primarily for testing)
pub fn reset_interrupted() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

/// Closed set of overwrite methods. Selected once per wipe invocation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WipeAlgorithm {
    #[default]
    Gutmann35,
    Dod7,
    /// DoD short form; identical to the Schneier three random passes.
    DodShort3,
    Random1,
    Zero1,
    VerifyOnly,
}

impl WipeAlgorithm {
    pub const ALL: [WipeAlgorithm; 6] = [
        WipeAlgorithm::Gutmann35,
        WipeAlgorithm::Dod7,
        WipeAlgorithm::DodShort3,
        WipeAlgorithm::Random1,
        WipeAlgorithm::Zero1,
        WipeAlgorithm::VerifyOnly,
    ];

    /// Human readable name used in reports and status screens.
    pub fn name(self) -> &'static str {
        match self {
            WipeAlgorithm::Gutmann35 => "Gutmann (35-pass)",
            WipeAlgorithm::Dod7 => "DoD 5220.22-M (7-pass)",
            WipeAlgorithm::DodShort3 => "DoD Short / Schneier (3-pass)",
            WipeAlgorithm::Random1 => "PRNG Stream (1-pass)",
            WipeAlgorithm::Zero1 => "Zero Fill (1-pass)",
            WipeAlgorithm::VerifyOnly => "Verify Only",
        }
    }

    /// Canonical name written to configuration files.
    pub fn config_name(self) -> &'static str {
        match self {
            WipeAlgorithm::Gutmann35 => "gutmann",
            WipeAlgorithm::Dod7 => "dod522022m",
            WipeAlgorithm::DodShort3 => "dodshort",
            WipeAlgorithm::Random1 => "random",
            WipeAlgorithm::Zero1 => "zero",
            WipeAlgorithm::VerifyOnly => "verify",
        }
    }

    pub fn pass_count(self) -> usize {
        algorithms::pass_plan(self).len()
    }
}

impl fmt::Display for WipeAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WipeAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gutmann" => Ok(WipeAlgorithm::Gutmann35),
            "dod522022m" | "dod" => Ok(WipeAlgorithm::Dod7),
            "dodshort" | "schneier" => Ok(WipeAlgorithm::DodShort3),
            "random" => Ok(WipeAlgorithm::Random1),
            "zero" => Ok(WipeAlgorithm::Zero1),
            "verify" => Ok(WipeAlgorithm::VerifyOnly),
            other => Err(format!("unknown wipe algorithm '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DriveType {
    HDD,
    SSD,
    NVMe,
    Unknown,
}

impl DriveType {
    pub fn name(self) -> &'static str {
        match self {
            DriveType::HDD => "HDD (Rotational)",
            DriveType::SSD => "SSD (Solid State)",
            DriveType::NVMe => "NVMe",
            DriveType::Unknown => "Unknown",
        }
    }

    /// Flash media where wear-leveling can keep stale blocks out of reach.
    pub fn is_flash(self) -> bool {
        matches!(self, DriveType::SSD | DriveType::NVMe)
    }
}

impl fmt::Display for DriveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipeConfig {
    pub device_path: String,
    pub algorithm: WipeAlgorithm,
    pub verify: bool,
}

impl WipeConfig {
    pub fn new(device_path: impl Into<String>, algorithm: WipeAlgorithm, verify: bool) -> Self {
        Self {
            device_path: device_path.into(),
            algorithm,
            verify,
        }
    }
}

/// Snapshot handed to the progress callback between chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct WipeProgress {
    /// 1-based pass number
    pub pass_index: usize,
    pub pass_count: usize,
    pub bytes_done: u64,
    pub bytes_total: u64,
    /// Bytes per second over the current phase
    pub speed: f64,
    pub eta: Duration,
    pub description: String,
    pub is_verify_phase: bool,
}

impl WipeProgress {
    pub fn percent(&self) -> f64 {
        if self.bytes_total == 0 {
            return 0.0;
        }
        self.bytes_done as f64 * 100.0 / self.bytes_total as f64
    }
}

/// Outcome of one wipe invocation. Built once, never mutated after return.
#[derive(Debug)]
pub struct WipeResult {
    pub passes_completed: usize,
    pub passes_total: usize,
    pub verification_failures: u32,
    pub bytes_written_total: u64,
    pub elapsed: Duration,
    pub detected_drive_type: DriveType,
    pub completed: bool,
    pub error: Option<WipeError>,
    /// Advisories raised during the run (wear-leveling caveat)
    pub warnings: Vec<String>,
}

impl WipeResult {
    pub fn new(passes_total: usize) -> Self {
        Self {
            passes_completed: 0,
            passes_total,
            verification_failures: 0,
            bytes_written_total: 0,
            elapsed: Duration::ZERO,
            detected_drive_type: DriveType::Unknown,
            completed: false,
            error: None,
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.completed && self.error.is_none()
    }
}

#[cfg(test)]
mod lib_tests;
