// Power-off
//
// On success none of these return: the machine is going down and the
// process exits right behind the request.

use std::io;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PowerError {
    #[error("power-off command failed: {0}")]
    Command(#[from] io::Error),

    #[error("power-off refused by the system: {0}")]
    Refused(String),
}

/// Host power and flush control.
#[cfg_attr(test, mockall::automock)]
pub trait PowerControl: Send + Sync {
    fn sync_filesystems(&self);

    /// Only returns if the machine could not be switched off.
    fn power_off(&self) -> Result<(), PowerError>;
}

pub struct SystemPower;

impl PowerControl for SystemPower {
    fn sync_filesystems(&self) {
        super::sync_filesystems();
    }

    fn power_off(&self) -> Result<(), PowerError> {
        tracing::warn!("Powering off");
        platform_power_off()
    }
}

#[cfg(target_os = "linux")]
fn platform_power_off() -> Result<(), PowerError> {
    use nix::sys::reboot::{reboot, RebootMode};

    super::sync_filesystems();
    match Command::new("poweroff").arg("-f").status() {
        Ok(status) if status.success() => std::process::exit(0),
        Ok(status) => tracing::warn!(%status, "poweroff -f failed, calling reboot(2)"),
        Err(e) => tracing::warn!(error = %e, "poweroff not runnable, calling reboot(2)"),
    }
    // Returns only on error
    match reboot(RebootMode::RB_POWER_OFF) {
        Ok(never) => match never {},
        Err(errno) => Err(PowerError::Refused(errno.to_string())),
    }
}

#[cfg(target_os = "macos")]
fn platform_power_off() -> Result<(), PowerError> {
    let status = Command::new("shutdown").args(["-h", "now"]).status()?;
    if status.success() {
        std::process::exit(0);
    }
    Err(PowerError::Refused(format!("shutdown exited with {}", status)))
}

#[cfg(windows)]
fn platform_power_off() -> Result<(), PowerError> {
    use winapi::um::winuser::{ExitWindowsEx, EWX_FORCE, EWX_POWEROFF};

    let ok = unsafe { ExitWindowsEx(EWX_POWEROFF | EWX_FORCE, 0) };
    if ok != 0 {
        std::process::exit(0);
    }
    Err(PowerError::Command(io::Error::last_os_error()))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
fn platform_power_off() -> Result<(), PowerError> {
    let status = Command::new("shutdown").args(["-p", "now"]).status()?;
    if status.success() {
        std::process::exit(0);
    }
    Err(PowerError::Refused(format!("shutdown exited with {}", status)))
}
