// Process and host facilities: privilege, memory locking, flushing, power

pub mod power;

pub use power::{PowerControl, PowerError, SystemPower};

/// Root on Unix, an elevated token on Windows.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(windows)]
pub fn is_elevated() -> bool {
    unsafe { winapi::um::shlobj::IsUserAnAdmin() != 0 }
}

/// Keep every current and future page of the process out of swap.
/// Best effort: failure is logged and ignored.
#[cfg(unix)]
pub fn lock_memory() -> bool {
    use nix::sys::mman::{mlockall, MlockAllFlags};

    match mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE) {
        Ok(()) => {
            tracing::debug!("Process memory locked");
            true
        }
        Err(errno) => {
            tracing::warn!(error = %errno, "mlockall failed; secrets may be swapped out");
            false
        }
    }
}

#[cfg(not(unix))]
pub fn lock_memory() -> bool {
    tracing::debug!("Memory locking not supported on this platform");
    false
}

/// Flush all filesystem buffers to their devices.
#[cfg(unix)]
pub fn sync_filesystems() {
    nix::unistd::sync();
}

#[cfg(not(unix))]
pub fn sync_filesystems() {}
