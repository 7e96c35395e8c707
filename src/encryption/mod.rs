//! Disk-encryption wrapper used by the dead-man sequence.
//!
//! Every operation is best effort from the caller's point of view: the
//! dead-man path logs failures and carries on to the wipe.

mod cryptsetup;

pub use cryptsetup::{Cryptsetup, CRYPTSETUP_PATHS};

use std::io;
use thiserror::Error;
use zeroize::Zeroizing;

/// Device-mapper name of the vault volume
pub const VAULT_DM_NAME: &str = "vault_crypt";

/// Raw bytes of a discard-only key before hex encoding
pub const DISCARD_KEY_BYTES: usize = 64;

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("cryptsetup is not installed")]
    Unavailable,

    #[error("failed to run cryptsetup: {0}")]
    Spawn(#[from] io::Error),

    #[error("cryptsetup {action} failed for {target} (exit code {status}): {diagnostic}")]
    CommandFailed {
        action: &'static str,
        target: String,
        status: i32,
        diagnostic: String,
    },

    #[error("could not generate key material: {0}")]
    KeyGeneration(String),

    #[error("unmount of {mount_point} failed: {source}")]
    Unmount {
        mount_point: String,
        #[source]
        source: io::Error,
    },
}

pub type EncryptionResult<T> = Result<T, EncryptionError>;

/// Volume operations the dead-man trigger needs.
#[cfg_attr(test, mockall::automock)]
pub trait DiskEncryption: Send + Sync {
    fn is_available(&self) -> bool;

    /// Format `device` as LUKS2 with a random key that is never stored.
    fn format_with_random_key(&self, device: &str) -> EncryptionResult<()>;

    fn open(&self, device: &str, passphrase: &str, name: &str) -> EncryptionResult<()>;

    fn close(&self, name: &str) -> EncryptionResult<()>;

    fn unmount(&self, mount_point: &str) -> EncryptionResult<()>;

    /// Mount points of filesystems living on `device` or its partitions.
    fn mounted_filesystems(&self, device: &str) -> Vec<String>;
}

/// 64 fresh random bytes, hex encoded. Both copies are wiped on drop.
pub fn discard_passphrase() -> EncryptionResult<Zeroizing<String>> {
    let mut key = Zeroizing::new([0u8; DISCARD_KEY_BYTES]);
    crate::crypto::secure_random_bytes(&mut key[..])
        .map_err(|e| EncryptionError::KeyGeneration(e.to_string()))?;
    Ok(Zeroizing::new(hex::encode(&key[..])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_passphrase_is_hex_of_64_bytes() {
        let passphrase = discard_passphrase().unwrap();
        assert_eq!(passphrase.len(), 128);
        assert!(passphrase.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_discard_passphrases_differ() {
        let a = discard_passphrase().unwrap();
        let b = discard_passphrase().unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_command_failure_message() {
        let err = EncryptionError::CommandFailed {
            action: "luksFormat",
            target: "/dev/sdb".to_string(),
            status: 1,
            diagnostic: "Device /dev/sdb is in use.".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("luksFormat"));
        assert!(message.contains("/dev/sdb"));
        assert!(message.contains("exit code 1"));
    }
}
