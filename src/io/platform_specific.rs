// Platform-specific whole-device channels
//
// Linux:   O_WRONLY | O_SYNC, fsync, BLKGETSIZE64
// macOS:   /dev/rdiskN, F_FULLFSYNC, DKIOCGETBLOCKCOUNT * DKIOCGETBLOCKSIZE
// Windows: FILE_FLAG_NO_BUFFERING | FILE_FLAG_WRITE_THROUGH, 512-byte
//          transfer multiples, IOCTL_DISK_GET_LENGTH_INFO, FlushFileBuffers

use super::{DeviceBackend, RawDeviceChannel};
use crate::drives::detection::detect_drive_type;
use crate::DriveType;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};

// ============= RAW PATH RESOLUTION =============

/// `/dev/diskN` becomes `/dev/rdiskN`; raw paths pass through unchanged.
pub fn macos_raw_path(device: &str) -> String {
    match device.rfind('/') {
        None => format!("/dev/r{}", device),
        Some(idx) => {
            let (dir, name) = device.split_at(idx + 1);
            if name.starts_with("rdisk") || !name.starts_with("disk") {
                device.to_string()
            } else {
                format!("{}r{}", dir, name)
            }
        }
    }
}

/// `PhysicalDrive1` becomes `\\.\PhysicalDrive1`.
pub fn windows_device_path(device: &str) -> String {
    if device.starts_with(r"\\.\") || device.starts_with("//./") {
        device.to_string()
    } else if device.to_ascii_lowercase().starts_with("physicaldrive") {
        format!(r"\\.\{}", device)
    } else {
        device.to_string()
    }
}

/// Raw/whole-device form of `device` for the current platform.
pub fn resolve_raw_path(device: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        macos_raw_path(device)
    }

    #[cfg(target_os = "windows")]
    {
        windows_device_path(device)
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        device.to_string()
    }
}

// ============= DEVICE SIZE =============

#[cfg(target_os = "linux")]
nix::ioctl_read!(blkgetsize64, 0x12, 114, u64);

#[cfg(target_os = "macos")]
nix::ioctl_read!(dkioc_get_block_size, b'd', 24, u32);
#[cfg(target_os = "macos")]
nix::ioctl_read!(dkioc_get_block_count, b'd', 25, u64);

/// Size in bytes of a block device, or of a regular file used as a disk image.
///
/// A size of zero is reported as an error: no wipe loop can be bounded by it.
pub fn get_device_size(path: &str) -> io::Result<u64> {
    let metadata = std::fs::metadata(path)?;
    let size = if metadata.is_file() {
        metadata.len()
    } else {
        block_device_size(path)?
    };

    if size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} reports a size of 0 bytes", path),
        ));
    }
    Ok(size)
}

#[cfg(target_os = "linux")]
fn block_device_size(path: &str) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    let file = File::open(path)?;
    let mut size: u64 = 0;
    // SAFETY: fd is open for the duration of the call, size is a valid u64
    unsafe { blkgetsize64(file.as_raw_fd(), &mut size) }.map_err(io::Error::from)?;
    Ok(size)
}

#[cfg(target_os = "macos")]
fn block_device_size(path: &str) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    let file = File::open(path)?;
    let fd = file.as_raw_fd();
    let mut block_count: u64 = 0;
    let mut block_size: u32 = 0;
    // SAFETY: fd is open for the duration of both calls
    unsafe {
        dkioc_get_block_count(fd, &mut block_count).map_err(io::Error::from)?;
        dkioc_get_block_size(fd, &mut block_size).map_err(io::Error::from)?;
    }
    Ok(block_count * block_size as u64)
}

#[cfg(target_os = "windows")]
fn block_device_size(path: &str) -> io::Result<u64> {
    use std::os::windows::fs::OpenOptionsExt;
    use std::os::windows::io::AsRawHandle;
    use winapi::shared::minwindef::{DWORD, LPVOID};
    use winapi::um::ioapiset::DeviceIoControl;
    use winapi::um::winioctl::{GET_LENGTH_INFORMATION, IOCTL_DISK_GET_LENGTH_INFO};
    use winapi::um::winnt::{FILE_SHARE_READ, FILE_SHARE_WRITE};

    let file = OpenOptions::new()
        .read(true)
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE)
        .open(path)?;

    // SAFETY: GET_LENGTH_INFORMATION is plain data
    let mut info: GET_LENGTH_INFORMATION = unsafe { std::mem::zeroed() };
    let mut returned: DWORD = 0;
    // SAFETY: handle is open, output buffer is sized for the structure
    let ok = unsafe {
        DeviceIoControl(
            file.as_raw_handle() as _,
            IOCTL_DISK_GET_LENGTH_INFO,
            std::ptr::null_mut(),
            0,
            &mut info as *mut GET_LENGTH_INFORMATION as LPVOID,
            std::mem::size_of::<GET_LENGTH_INFORMATION>() as DWORD,
            &mut returned,
            std::ptr::null_mut(),
        )
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: QuadPart is the full 64-bit view of the union
    let length = unsafe { *info.Length.QuadPart() };
    Ok(length as u64)
}

// ============= SHARED FILE HANDLE =============

fn seek_file(file: &mut File, offset: u64) -> io::Result<u64> {
    file.seek(SeekFrom::Start(offset))
}

// ============= LINUX IMPLEMENTATION =============

#[cfg(target_os = "linux")]
pub struct LinuxChannel {
    file: File,
}

#[cfg(target_os = "linux")]
impl LinuxChannel {
    pub fn open_write(path: &str) -> io::Result<Self> {
        use std::os::unix::fs::OpenOptionsExt;

        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)?;
        Ok(Self { file })
    }

    pub fn open_read(path: &str) -> io::Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }
}

#[cfg(target_os = "linux")]
impl RawDeviceChannel for LinuxChannel {
    fn seek(&mut self, offset: u64) -> io::Result<u64> {
        seek_file(&mut self.file, offset)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

// ============= MACOS IMPLEMENTATION =============

#[cfg(target_os = "macos")]
pub struct MacOSChannel {
    file: File,
}

#[cfg(target_os = "macos")]
impl MacOSChannel {
    pub fn open_write(path: &str) -> io::Result<Self> {
        use std::os::unix::fs::OpenOptionsExt;

        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)?;
        Ok(Self { file })
    }

    pub fn open_read(path: &str) -> io::Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }
}

#[cfg(target_os = "macos")]
impl RawDeviceChannel for MacOSChannel {
    fn seek(&mut self, offset: u64) -> io::Result<u64> {
        seek_file(&mut self.file, offset)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        // F_FULLFSYNC asks the drive to flush its own cache; not every
        // device supports it
        // SAFETY: fd is owned by self.file
        let rc = unsafe { libc::fcntl(self.file.as_raw_fd(), libc::F_FULLFSYNC) };
        if rc != 0 {
            tracing::debug!("F_FULLFSYNC unsupported, using fsync");
            return self.file.sync_all();
        }
        Ok(())
    }
}

// ============= WINDOWS IMPLEMENTATION =============

#[cfg(target_os = "windows")]
pub struct WindowsChannel {
    file: File,
    unbuffered: bool,
}

#[cfg(target_os = "windows")]
impl WindowsChannel {
    pub fn open_write(path: &str) -> io::Result<Self> {
        use std::os::windows::fs::OpenOptionsExt;
        use winapi::um::winbase::{FILE_FLAG_NO_BUFFERING, FILE_FLAG_WRITE_THROUGH};
        use winapi::um::winnt::{FILE_SHARE_READ, FILE_SHARE_WRITE};

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE)
            .custom_flags(FILE_FLAG_NO_BUFFERING | FILE_FLAG_WRITE_THROUGH)
            .open(path)?;
        Ok(Self {
            file,
            unbuffered: true,
        })
    }

    pub fn open_read(path: &str) -> io::Result<Self> {
        use std::os::windows::fs::OpenOptionsExt;
        use winapi::um::winnt::{FILE_SHARE_READ, FILE_SHARE_WRITE};

        let file = OpenOptions::new()
            .read(true)
            .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE)
            .open(path)?;
        Ok(Self {
            file,
            unbuffered: false,
        })
    }
}

#[cfg(target_os = "windows")]
impl RawDeviceChannel for WindowsChannel {
    fn seek(&mut self, offset: u64) -> io::Result<u64> {
        seek_file(&mut self.file, offset)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        // FlushFileBuffers
        self.file.sync_all()
    }

    fn alignment(&self) -> usize {
        if self.unbuffered {
            super::SECTOR_SIZE
        } else {
            1
        }
    }
}

// ============= PLATFORM BACKEND =============

#[cfg(target_os = "linux")]
type PlatformChannel = LinuxChannel;
#[cfg(target_os = "macos")]
type PlatformChannel = MacOSChannel;
#[cfg(target_os = "windows")]
type PlatformChannel = WindowsChannel;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
compile_error!("Unsupported platform");

/// Real devices on the running operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformDevices;

impl DeviceBackend for PlatformDevices {
    fn raw_path(&self, device: &str) -> String {
        resolve_raw_path(device)
    }

    fn device_size(&self, path: &str) -> io::Result<u64> {
        get_device_size(path)
    }

    fn open_write(&self, path: &str) -> io::Result<Box<dyn RawDeviceChannel>> {
        Ok(Box::new(PlatformChannel::open_write(path)?))
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn RawDeviceChannel>> {
        Ok(Box::new(PlatformChannel::open_read(path)?))
    }

    fn drive_type(&self, device: &str) -> DriveType {
        detect_drive_type(device)
    }

    fn name(&self) -> &str {
        #[cfg(target_os = "linux")]
        {
            "Linux (O_SYNC)"
        }
        #[cfg(target_os = "macos")]
        {
            "macOS (raw disk, F_FULLFSYNC)"
        }
        #[cfg(target_os = "windows")]
        {
            "Windows (unbuffered, write-through)"
        }
    }
}
