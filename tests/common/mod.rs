// Shared fixtures for the integration suites
#![allow(dead_code)]

pub mod fakes;
#[path = "../../src/io/simulated.rs"]
pub mod simulated;

pub use simulated::SimulatedDevice;

use std::io::Write;
use std::ops::ControlFlow;
use std::time::Duration;
use tempfile::NamedTempFile;
use vault_wipe::io::{DeviceBackend, RawDeviceChannel};
use vault_wipe::{DriveType, WipeOrchestrator, WipeProgress};

pub const MIB: usize = 1024 * 1024;

/// Small buffer so multi-chunk behavior shows up on small devices
pub const TEST_BUFFER: usize = 64 * 1024;

/// Orchestrator over `device` with direct I/O only
pub fn orchestrator(device: &SimulatedDevice) -> WipeOrchestrator {
    WipeOrchestrator::with_backend(device.clone())
        .buffer_size(TEST_BUFFER)
        .progress_interval(Duration::ZERO)
}

/// Progress callback that never aborts
pub fn keep_going(_: &WipeProgress) -> ControlFlow<()> {
    ControlFlow::Continue(())
}

/// Disk image file of `size` bytes filled with `fill`
pub fn disk_image(size: usize, fill: u8) -> NamedTempFile {
    let mut image = NamedTempFile::new().expect("create disk image");
    image.write_all(&vec![fill; size]).expect("fill disk image");
    image.flush().expect("flush disk image");
    image
}

pub fn all_bytes_are(data: &[u8], value: u8) -> bool {
    data.iter().all(|&b| b == value)
}
