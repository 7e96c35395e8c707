//! Whole-device I/O.
//!
//! The wipe executor only sees [`RawDeviceChannel`] handles produced by a
//! [`DeviceBackend`]. The platform backend opens real block devices (or disk
//! images). Tests swap in an in-memory backend.

pub mod buffer;
pub mod platform_specific;

#[cfg(test)]
#[allow(dead_code)]
pub(crate) mod simulated;

#[cfg(test)]
mod tests;

pub use buffer::{AlignedBuffer, PAGE_SIZE, SECTOR_SIZE};
pub use platform_specific::{get_device_size, resolve_raw_path, PlatformDevices};
#[cfg(test)]
pub(crate) use simulated::SimulatedDevice;

use crate::DriveType;
use std::io;

/// Default chunk size for wipe and verify passes
pub const WIPE_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Open handle on a whole device, exclusively owned by the running pass.
pub trait RawDeviceChannel: Send {
    /// Position the handle at `offset` bytes from the start of the device.
    fn seek(&mut self, offset: u64) -> io::Result<u64>;

    /// One write attempt; may accept fewer bytes than offered.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// One read attempt; `Ok(0)` means end of device.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Force everything written so far onto the physical media.
    fn sync(&mut self) -> io::Result<()>;

    /// Required multiple for transfer lengths (unbuffered Windows handles).
    fn alignment(&self) -> usize {
        1
    }

    /// Release the handle. Dropping has the same effect.
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

/// Factory for device handles and device facts.
pub trait DeviceBackend: Send + Sync {
    /// Platform raw/whole-device form of `device`.
    fn raw_path(&self, device: &str) -> String;

    /// Size in bytes of the device at `path`.
    fn device_size(&self, path: &str) -> io::Result<u64>;

    /// Open for direct/unbuffered writing.
    fn open_write(&self, path: &str) -> io::Result<Box<dyn RawDeviceChannel>>;

    /// Open read-only for verification.
    fn open_read(&self, path: &str) -> io::Result<Box<dyn RawDeviceChannel>>;

    /// Advisory media classification.
    fn drive_type(&self, device: &str) -> DriveType;

    fn name(&self) -> &str;
}
