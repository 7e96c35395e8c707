// Hand-written collaborators for driving the dead-man trigger end to end

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vault_wipe::deadman::{DeadManConsole, InterruptShield};
use vault_wipe::encryption::{DiskEncryption, EncryptionError, EncryptionResult};
use vault_wipe::system::{PowerControl, PowerError};

/// Shared event log so ordering across collaborators can be asserted
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, event: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.events().iter().position(|e| e.starts_with(prefix))
    }
}

pub struct CountingShield {
    pub journal: Journal,
    pub engaged: Arc<AtomicUsize>,
}

impl InterruptShield for CountingShield {
    fn engage(&self) {
        self.engaged.fetch_add(1, Ordering::SeqCst);
        self.journal.record("shield");
    }
}

/// Console that records instead of sleeping
pub struct RecordingConsole {
    pub journal: Journal,
}

impl DeadManConsole for RecordingConsole {
    fn countdown(&mut self, seconds: u64) {
        self.journal.record(format!("countdown {}", seconds));
    }

    fn status(&mut self, message: &str) {
        self.journal.record(format!("status {}", message));
    }

    fn wiping(&mut self, device: &str, algorithm_name: &str) {
        self.journal
            .record(format!("wiping {} {}", device, algorithm_name));
    }

    fn pause(&mut self, duration: Duration) {
        self.journal.record(format!("pause {}ms", duration.as_millis()));
    }
}

/// Encryption backend with no cryptsetup and nothing mounted
pub struct NoEncryption {
    pub journal: Journal,
}

impl DiskEncryption for NoEncryption {
    fn is_available(&self) -> bool {
        false
    }

    fn format_with_random_key(&self, device: &str) -> EncryptionResult<()> {
        self.journal.record(format!("format {}", device));
        Err(EncryptionError::Unavailable)
    }

    fn open(&self, _device: &str, _passphrase: &str, _name: &str) -> EncryptionResult<()> {
        Err(EncryptionError::Unavailable)
    }

    fn close(&self, name: &str) -> EncryptionResult<()> {
        self.journal.record(format!("close {}", name));
        Err(EncryptionError::Unavailable)
    }

    fn unmount(&self, mount_point: &str) -> EncryptionResult<()> {
        self.journal.record(format!("unmount {}", mount_point));
        Ok(())
    }

    fn mounted_filesystems(&self, _device: &str) -> Vec<String> {
        Vec::new()
    }
}

pub struct FakePower {
    pub journal: Journal,
    pub refuse: bool,
    pub powered_off: Arc<AtomicBool>,
}

impl PowerControl for FakePower {
    fn sync_filesystems(&self) {
        self.journal.record("sync");
    }

    fn power_off(&self) -> Result<(), PowerError> {
        self.journal.record("power_off");
        if self.refuse {
            return Err(PowerError::Refused("not permitted".to_string()));
        }
        self.powered_off.store(true, Ordering::SeqCst);
        Ok(())
    }
}
