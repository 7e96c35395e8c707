// In-memory device with fault injection, used by tests and benchmarks
//
// Not part of the library API: unit tests reach it as `crate::io::simulated`,
// integration tests and benches include this file with `#[path]`. The
// including module must have `DeviceBackend`, `RawDeviceChannel` and
// `DriveType` in scope.

use super::{DeviceBackend, DriveType, RawDeviceChannel};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default, Clone)]
struct Faults {
    fail_seek_on_pass: Option<usize>,
    fail_writes_on_pass: Option<usize>,
    fail_sync_on_pass: Option<usize>,
    interrupted_writes: usize,
    short_write_on_pass: Option<usize>,
    corrupt_after_pass: Option<(usize, u64)>,
    fail_open_write: bool,
    unknown_size: bool,
}

#[derive(Debug)]
struct DeviceState {
    data: Vec<u8>,
    drive_type: DriveType,
    alignment: usize,
    faults: Faults,
    /// Write passes started so far (a write handle seeking to offset 0)
    passes_started: usize,
    write_sizes: Vec<usize>,
    syncs: usize,
    write_opens: usize,
    read_opens: usize,
}

/// Shared handle on a simulated disk. Clones see the same backing store.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedDevice {
    /// Device of `size` bytes pre-filled with 0xEE as stand-in user data
    pub fn new(size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                data: vec![0xEE; size],
                drive_type: DriveType::HDD,
                alignment: 1,
                faults: Faults::default(),
                passes_started: 0,
                write_sizes: Vec::new(),
                syncs: 0,
                write_opens: 0,
                read_opens: 0,
            })),
        }
    }

    pub fn with_drive_type(self, drive_type: DriveType) -> Self {
        self.lock().drive_type = drive_type;
        self
    }

    /// Require transfers in multiples of `alignment` bytes
    pub fn with_alignment(self, alignment: usize) -> Self {
        self.lock().alignment = alignment.max(1);
        self
    }

    /// Every write of the given 1-based pass fails with an I/O error
    pub fn fail_writes_on_pass(&self, pass: usize) {
        self.lock().faults.fail_writes_on_pass = Some(pass);
    }

    /// Seeking to the start of the given pass fails
    pub fn fail_seek_on_pass(&self, pass: usize) {
        self.lock().faults.fail_seek_on_pass = Some(pass);
    }

    /// Flushing the given pass to media fails
    pub fn fail_sync_on_pass(&self, pass: usize) {
        self.lock().faults.fail_sync_on_pass = Some(pass);
    }

    /// The next write call returns `ErrorKind::Interrupted` without writing.
    /// Calls accumulate.
    pub fn interrupt_next_write(&self) {
        self.lock().faults.interrupted_writes += 1;
    }

    /// The first write of the given pass accepts only half the bytes
    pub fn short_write_on_pass(&self, pass: usize) {
        self.lock().faults.short_write_on_pass = Some(pass);
    }

    /// Flip one byte at `offset` when `pass` syncs, before any verification
    pub fn corrupt_after_pass(&self, pass: usize, offset: u64) {
        self.lock().faults.corrupt_after_pass = Some((pass, offset));
    }

    pub fn fail_open_for_write(&self) {
        self.lock().faults.fail_open_write = true;
    }

    pub fn report_unknown_size(&self) {
        self.lock().faults.unknown_size = true;
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.lock().data.clone()
    }

    pub fn passes_started(&self) -> usize {
        self.lock().passes_started
    }

    /// Length of every successful write call, in order
    pub fn write_sizes(&self) -> Vec<usize> {
        self.lock().write_sizes.clone()
    }

    pub fn sync_count(&self) -> usize {
        self.lock().syncs
    }

    pub fn write_opens(&self) -> usize {
        self.lock().write_opens
    }

    pub fn read_opens(&self) -> usize {
        self.lock().read_opens
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DeviceBackend for SimulatedDevice {
    fn raw_path(&self, device: &str) -> String {
        device.to_string()
    }

    fn device_size(&self, _path: &str) -> io::Result<u64> {
        let state = self.lock();
        if state.faults.unknown_size || state.data.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "simulated device has no size",
            ));
        }
        Ok(state.data.len() as u64)
    }

    fn open_write(&self, _path: &str) -> io::Result<Box<dyn RawDeviceChannel>> {
        let mut state = self.lock();
        if state.faults.fail_open_write {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        state.write_opens += 1;
        Ok(Box::new(SimulatedChannel {
            state: Arc::clone(&self.state),
            pos: 0,
            writable: true,
            current_pass: 0,
        }))
    }

    fn open_read(&self, _path: &str) -> io::Result<Box<dyn RawDeviceChannel>> {
        self.lock().read_opens += 1;
        Ok(Box::new(SimulatedChannel {
            state: Arc::clone(&self.state),
            pos: 0,
            writable: false,
            current_pass: 0,
        }))
    }

    fn drive_type(&self, _device: &str) -> DriveType {
        self.lock().drive_type
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

struct SimulatedChannel {
    state: Arc<Mutex<DeviceState>>,
    pos: u64,
    writable: bool,
    current_pass: usize,
}

impl SimulatedChannel {
    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RawDeviceChannel for SimulatedChannel {
    fn seek(&mut self, offset: u64) -> io::Result<u64> {
        let writable = self.writable;
        let mut state = self.lock();
        if offset > state.data.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek past end of device",
            ));
        }
        let pass = if writable && offset == 0 {
            state.passes_started += 1;
            Some(state.passes_started)
        } else {
            None
        };
        if pass.is_some() && state.faults.fail_seek_on_pass == pass {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected seek failure on pass {}", state.passes_started),
            ));
        }
        drop(state);

        if let Some(pass) = pass {
            self.current_pass = pass;
        }
        self.pos = offset;
        Ok(offset)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        let pass = self.current_pass;
        let pos = self.pos as usize;
        let mut state = self.lock();

        if state.faults.interrupted_writes > 0 {
            state.faults.interrupted_writes -= 1;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        if state.faults.fail_writes_on_pass == Some(pass) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected write failure on pass {}", pass),
            ));
        }
        if buf.len() % state.alignment != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unaligned transfer length",
            ));
        }

        let mut len = buf.len().min(state.data.len().saturating_sub(pos));
        if state.faults.short_write_on_pass == Some(pass) {
            state.faults.short_write_on_pass = None;
            len /= 2;
        }
        state.data[pos..pos + len].copy_from_slice(&buf[..len]);
        state.write_sizes.push(len);
        drop(state);

        self.pos += len as u64;
        Ok(len)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.pos as usize;
        let state = self.lock();
        let len = buf.len().min(state.data.len().saturating_sub(pos));
        buf[..len].copy_from_slice(&state.data[pos..pos + len]);
        drop(state);

        self.pos += len as u64;
        Ok(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        let pass = self.current_pass;
        let mut state = self.lock();
        state.syncs += 1;
        if state.faults.fail_sync_on_pass == Some(pass) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected flush failure on pass {}", pass),
            ));
        }
        if let Some((corrupt_pass, offset)) = state.faults.corrupt_after_pass {
            if corrupt_pass == pass {
                if let Some(byte) = state.data.get_mut(offset as usize) {
                    *byte ^= 0xFF;
                }
            }
        }
        Ok(())
    }

    fn alignment(&self) -> usize {
        self.lock().alignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_channels() {
        let device = SimulatedDevice::new(16);
        let mut writer = device.open_write("sim").unwrap();
        writer.seek(0).unwrap();
        assert_eq!(writer.write(&[0x11; 16]).unwrap(), 16);

        let mut reader = device.open_read("sim").unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).unwrap(), 16);
        assert_eq!(buf, [0x11; 16]);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_pass_counting_follows_write_seeks() {
        let device = SimulatedDevice::new(8);
        device.fail_writes_on_pass(2);
        let mut writer = device.open_write("sim").unwrap();

        writer.seek(0).unwrap();
        assert!(writer.write(&[0; 8]).is_ok());
        writer.seek(0).unwrap();
        assert!(writer.write(&[0; 8]).is_err());
        assert_eq!(device.passes_started(), 2);
    }

    #[test]
    fn test_corruption_applies_on_sync_of_target_pass() {
        let device = SimulatedDevice::new(8);
        device.corrupt_after_pass(1, 3);
        let mut writer = device.open_write("sim").unwrap();
        writer.seek(0).unwrap();
        writer.write(&[0; 8]).unwrap();
        writer.sync().unwrap();
        assert_eq!(device.snapshot()[3], 0xFF);
    }

    #[test]
    fn test_interrupted_write_leaves_data_untouched() {
        let device = SimulatedDevice::new(8);
        device.interrupt_next_write();
        let mut writer = device.open_write("sim").unwrap();
        writer.seek(0).unwrap();

        let err = writer.write(&[0; 8]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
        assert!(device.write_sizes().is_empty());
        assert_eq!(writer.write(&[0; 8]).unwrap(), 8);
    }

    #[test]
    fn test_seek_and_sync_faults_hit_only_their_pass() {
        let device = SimulatedDevice::new(8);
        device.fail_seek_on_pass(2);
        device.fail_sync_on_pass(1);
        let mut writer = device.open_write("sim").unwrap();

        writer.seek(0).unwrap();
        assert!(writer.sync().is_err());
        assert!(writer.seek(0).is_err());
        assert!(writer.seek(0).is_ok());
        assert_eq!(device.passes_started(), 3);
    }
}
