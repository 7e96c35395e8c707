//! `cryptsetup` invocation.
//!
//! Key material only ever travels over the child's stdin (`--key-file -`),
//! never through argv or the filesystem.

use super::{discard_passphrase, DiskEncryption, EncryptionError, EncryptionResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

pub const CRYPTSETUP_PATHS: &[&str] = &[
    "/usr/sbin/cryptsetup",
    "/sbin/cryptsetup",
    "/usr/bin/cryptsetup",
];

/// Host `cryptsetup` binary, resolved once at construction.
#[derive(Debug, Clone)]
pub struct Cryptsetup {
    binary: Option<PathBuf>,
}

impl Cryptsetup {
    pub fn new() -> Self {
        let binary = CRYPTSETUP_PATHS
            .iter()
            .map(Path::new)
            .find(|path| path.is_file())
            .map(Path::to_path_buf);
        Self { binary }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }

    /// Arguments for a LUKS2 format reading its passphrase from stdin
    pub fn format_args(device: &str) -> Vec<&str> {
        vec![
            "luksFormat",
            "--batch-mode",
            "--type",
            "luks2",
            "--cipher",
            "aes-xts-plain64",
            "--key-size",
            "512",
            "--sector-size",
            "512",
            "--key-file",
            "-",
            device,
        ]
    }

    fn run(&self, args: &[&str], input: Option<&[u8]>) -> EncryptionResult<Output> {
        let binary = self.binary.as_ref().ok_or(EncryptionError::Unavailable)?;
        let mut command = Command::new(binary);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if input.is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }

        let mut child = command.spawn()?;
        let mut write_error = None;
        if let Some(payload) = input {
            if let Some(mut stdin) = child.stdin.take() {
                write_error = stdin.write_all(payload).and_then(|()| stdin.flush()).err();
            }
        }

        // Reap the child even when the key write failed
        let out = child.wait_with_output()?;
        match write_error {
            Some(e) if out.status.success() => Err(e.into()),
            Some(e) => {
                tracing::debug!(error = %e, "cryptsetup stopped reading its key input");
                Ok(out)
            }
            None => Ok(out),
        }
    }

    fn check(action: &'static str, target: &str, out: Output) -> EncryptionResult<()> {
        if out.status.success() {
            return Ok(());
        }
        Err(EncryptionError::CommandFailed {
            action,
            target: target.to_string(),
            status: out.status.code().unwrap_or(-1),
            diagnostic: diagnostic(&out),
        })
    }
}

impl Default for Cryptsetup {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskEncryption for Cryptsetup {
    fn is_available(&self) -> bool {
        self.binary.as_ref().map(|b| b.is_file()).unwrap_or(false)
    }

    fn format_with_random_key(&self, device: &str) -> EncryptionResult<()> {
        let passphrase = discard_passphrase()?;
        tracing::info!(device = %device, "Formatting with discarded random key");
        let out = self.run(&Self::format_args(device), Some(passphrase.as_bytes()))?;
        Self::check("luksFormat", device, out)
    }

    fn open(&self, device: &str, passphrase: &str, name: &str) -> EncryptionResult<()> {
        let out = self.run(
            &["open", "--type", "luks", "--key-file", "-", device, name],
            Some(passphrase.as_bytes()),
        )?;
        Self::check("open", device, out)
    }

    fn close(&self, name: &str) -> EncryptionResult<()> {
        let out = self.run(&["close", name], None)?;
        Self::check("close", name, out)
    }

    fn unmount(&self, mount_point: &str) -> EncryptionResult<()> {
        unmount_path(mount_point)
    }

    fn mounted_filesystems(&self, device: &str) -> Vec<String> {
        crate::drives::mounted_filesystems(device)
    }
}

fn diagnostic(out: &Output) -> String {
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    let text = if stderr.trim().is_empty() {
        stdout.trim().to_string()
    } else {
        stderr.trim().to_string()
    };
    if text.is_empty() {
        "no additional output".to_string()
    } else {
        text
    }
}

#[cfg(target_os = "linux")]
fn unmount_path(mount_point: &str) -> EncryptionResult<()> {
    use nix::errno::Errno;
    use nix::mount::{umount, umount2, MntFlags};

    let result = match umount(mount_point) {
        // Busy filesystems are detached lazily so the device can be taken
        Err(Errno::EBUSY) => umount2(mount_point, MntFlags::MNT_DETACH),
        other => other,
    };
    result.map_err(|errno| EncryptionError::Unmount {
        mount_point: mount_point.to_string(),
        source: std::io::Error::from_raw_os_error(errno as i32),
    })
}

#[cfg(all(unix, not(target_os = "linux")))]
fn unmount_path(mount_point: &str) -> EncryptionResult<()> {
    let status = Command::new("umount").arg(mount_point).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(EncryptionError::Unmount {
            mount_point: mount_point.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("umount exited with {}", status),
            ),
        })
    }
}

#[cfg(not(unix))]
fn unmount_path(mount_point: &str) -> EncryptionResult<()> {
    Err(EncryptionError::Unmount {
        mount_point: mount_point.to_string(),
        source: std::io::Error::from(std::io::ErrorKind::Unsupported),
    })
}
