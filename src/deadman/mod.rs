//! Dead-man trigger.
//!
//! Runs once the authentication failure threshold is reached and walks a
//! fixed sequence of states:
//!
//! ```text
//! Armed -> SignalsBlocked -> Warned -> PreCleanup
//!       -> OptionallyPreEncrypted -> Wiping -> SyncedAndPoweringOff
//! ```
//!
//! After `SignalsBlocked` nothing can interrupt the sequence and nothing
//! waits for user input. A failed wipe is followed by exactly one
//! unverified single-pass random overwrite, and the sequence always ends by
//! powering the machine off.

mod signals;

pub use signals::{interrupt_signals, InterruptShield, ProcessSignals};

use crate::config::VaultConfig;
use crate::encryption::{Cryptsetup, DiskEncryption, VAULT_DM_NAME};
use crate::system::{PowerControl, PowerError, SystemPower};
use crate::ui::{ProgressBar, TerminalConsole};
use crate::wipe_orchestrator::WipeOrchestrator;
use crate::{WipeAlgorithm, WipeConfig, WipeProgress, WipeResult};
use std::ops::ControlFlow;
use std::time::Duration;

/// Pause between the final status message and power-off
pub const FINAL_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeadManState {
    Armed,
    SignalsBlocked,
    Warned,
    PreCleanup,
    OptionallyPreEncrypted,
    Wiping,
    SyncedAndPoweringOff,
}

/// Operator-facing output. Purely informational: nothing here can cancel.
#[cfg_attr(test, mockall::automock)]
pub trait DeadManConsole: Send {
    /// Show the warning banner and count down `seconds`.
    fn countdown(&mut self, seconds: u64);

    fn status(&mut self, message: &str);

    fn wiping(&mut self, device: &str, algorithm_name: &str);

    fn pause(&mut self, duration: Duration);
}

/// The wipe engine as seen by the trigger.
#[cfg_attr(test, mockall::automock)]
pub trait WipeRunner: Send + Sync {
    /// External tool first, direct I/O as fallback.
    fn wipe_device(&self, config: &WipeConfig) -> WipeResult;

    /// Direct I/O only.
    fn wipe_direct(&self, config: &WipeConfig) -> WipeResult;
}

/// What happened, for the rare case `fire` returns at all.
#[derive(Debug)]
pub struct DeadManReport {
    pub states: Vec<DeadManState>,
    pub pre_encrypted: bool,
    pub primary: WipeResult,
    pub fallback: Option<WipeResult>,
    pub power_off_error: Option<PowerError>,
}

pub struct DeadManTrigger {
    config: VaultConfig,
    shield: Box<dyn InterruptShield>,
    console: Box<dyn DeadManConsole>,
    encryption: Box<dyn DiskEncryption>,
    wiper: Box<dyn WipeRunner>,
    power: Box<dyn PowerControl>,
    states: Vec<DeadManState>,
}

impl DeadManTrigger {
    pub fn new(
        config: VaultConfig,
        shield: Box<dyn InterruptShield>,
        console: Box<dyn DeadManConsole>,
        encryption: Box<dyn DiskEncryption>,
        wiper: Box<dyn WipeRunner>,
        power: Box<dyn PowerControl>,
    ) -> Self {
        Self {
            config,
            shield,
            console,
            encryption,
            wiper,
            power,
            states: vec![DeadManState::Armed],
        }
    }

    /// Run the whole sequence. Returns only if power-off failed.
    pub fn fire(mut self) -> DeadManReport {
        let device = self.config.target_device.clone();
        tracing::warn!(device = %device, "Dead-man trigger fired");

        self.shield.engage();
        self.enter(DeadManState::SignalsBlocked);

        self.console.countdown(self.config.countdown_secs);
        self.enter(DeadManState::Warned);

        self.pre_cleanup(&device);
        self.enter(DeadManState::PreCleanup);

        let pre_encrypted = self.pre_encrypt(&device);
        self.enter(DeadManState::OptionallyPreEncrypted);

        let (primary, fallback) = self.wipe(&device);
        self.enter(DeadManState::Wiping);

        self.power.sync_filesystems();
        self.console.status("Wipe complete. Powering off...");
        self.console.pause(FINAL_PAUSE);
        self.enter(DeadManState::SyncedAndPoweringOff);

        let power_off_error = self.power.power_off().err();
        if let Some(e) = &power_off_error {
            tracing::error!(error = %e, "Power-off failed");
        }

        DeadManReport {
            states: self.states,
            pre_encrypted,
            primary,
            fallback,
            power_off_error,
        }
    }

    fn enter(&mut self, state: DeadManState) {
        tracing::info!(state = ?state, "Dead-man state");
        self.states.push(state);
    }

    /// Unmount and close whatever might hold the device open. Every step is
    /// best effort.
    fn pre_cleanup(&mut self, device: &str) {
        if let Err(e) = self.encryption.unmount(&self.config.mount_point) {
            tracing::debug!(mount_point = %self.config.mount_point, error = %e, "Vault unmount skipped");
        }
        if let Err(e) = self.encryption.close(VAULT_DM_NAME) {
            tracing::debug!(error = %e, "Vault mapping close skipped");
        }
        for mount_point in self.encryption.mounted_filesystems(device) {
            match self.encryption.unmount(&mount_point) {
                Ok(()) => tracing::info!(mount_point = %mount_point, "Unmounted"),
                Err(e) => tracing::warn!(mount_point = %mount_point, error = %e, "Unmount failed"),
            }
        }
        force_unmount_disk(device);
    }

    fn pre_encrypt(&mut self, device: &str) -> bool {
        if !self.config.encrypt_before_wipe || !self.encryption.is_available() {
            return false;
        }
        self.console.status("Encrypting drive with random key...");
        match self.encryption.format_with_random_key(device) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Pre-wipe encryption failed");
                self.console.status("Encryption failed, proceeding to wipe...");
                false
            }
        }
    }

    fn wipe(&mut self, device: &str) -> (WipeResult, Option<WipeResult>) {
        let algorithm = self.config.wipe_algorithm;
        self.console.wiping(device, algorithm.name());

        let primary = self.wiper.wipe_device(&WipeConfig::new(
            device,
            algorithm,
            self.config.verify_passes,
        ));
        if primary.is_success() {
            return (primary, None);
        }

        if let Some(e) = &primary.error {
            tracing::error!(error = %e, "Primary wipe failed");
        }
        self.console
            .status("Primary wipe failed, attempting raw overwrite...");
        let fallback = self
            .wiper
            .wipe_direct(&WipeConfig::new(device, WipeAlgorithm::Random1, false));
        if let Some(e) = &fallback.error {
            tracing::error!(error = %e, "Fallback overwrite failed");
        }
        (primary, Some(fallback))
    }
}

#[cfg(target_os = "macos")]
fn force_unmount_disk(device: &str) {
    let status = std::process::Command::new("diskutil")
        .args(["unmountDisk", "force", device])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();
    if let Err(e) = status {
        tracing::debug!(error = %e, "diskutil unmountDisk failed");
    }
}

#[cfg(not(target_os = "macos"))]
fn force_unmount_disk(_device: &str) {}

impl WipeRunner for WipeOrchestrator {
    fn wipe_device(&self, config: &WipeConfig) -> WipeResult {
        let mut bar = ProgressBar::default();
        WipeOrchestrator::wipe_device(self, config, &mut |p: &WipeProgress| {
            bar.render(p);
            ControlFlow::Continue(())
        })
    }

    fn wipe_direct(&self, config: &WipeConfig) -> WipeResult {
        let mut bar = ProgressBar::default();
        self.execute(config, &mut |p: &WipeProgress| {
            bar.render(p);
            ControlFlow::Continue(())
        })
    }
}

/// Fire the dead-man sequence against the configured target with the real
/// collaborators. Returns only if the machine could not be powered off.
pub fn deadman_trigger(config: &VaultConfig) -> DeadManReport {
    DeadManTrigger::new(
        config.clone(),
        Box::new(ProcessSignals),
        Box::new(TerminalConsole::new()),
        Box::new(Cryptsetup::new()),
        Box::new(WipeOrchestrator::new()),
        Box::new(SystemPower),
    )
    .fire()
}
