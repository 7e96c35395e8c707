//! Vault configuration
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. an INI file (`/etc/shredos-vault/vault.conf` by default)
//! 2. `VAULT_*` environment variables (`VAULT_TARGET_DEVICE=/dev/sdb`)
//! 3. kernel command-line overrides (`vault_device=`, `vault_threshold=`,
//!    `vault_wipe=`), applied separately with [`VaultConfig::apply_kernel_cmdline`]
//!
//! Values are validated field by field. A bad value is logged and ignored, so
//! one typo never leaves the vault without a usable configuration.

use crate::WipeAlgorithm;
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/shredos-vault/vault.conf";
pub const DEFAULT_MOUNT_POINT: &str = "/vault";
pub const ENV_PREFIX: &str = "VAULT";

pub const MIN_ATTEMPTS: u32 = 1;
pub const MAX_ATTEMPTS: u32 = 99;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("cannot write {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Raw block device destroyed by the dead-man trigger. Empty when unset.
    pub target_device: String,
    pub mount_point: String,
    pub wipe_algorithm: WipeAlgorithm,
    pub encrypt_before_wipe: bool,
    pub verify_passes: bool,
    pub max_attempts: u32,
    /// Runtime counter, never read from or written to disk.
    pub current_attempts: u32,
    pub countdown_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            target_device: String::new(),
            mount_point: DEFAULT_MOUNT_POINT.to_string(),
            wipe_algorithm: WipeAlgorithm::Gutmann35,
            encrypt_before_wipe: true,
            verify_passes: false,
            max_attempts: 3,
            current_attempts: 0,
            countdown_secs: 5,
        }
    }
}

/// Everything arrives as text from both INI and environment sources.
#[derive(Debug, Default, Deserialize)]
struct RawVaultConfig {
    target_device: Option<String>,
    mount_point: Option<String>,
    wipe_algorithm: Option<String>,
    encrypt_before_wipe: Option<String>,
    verify_passes: Option<String>,
    max_attempts: Option<String>,
    countdown_secs: Option<String>,
}

/// Overrides taken from the kernel command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelOverrides {
    pub target_device: Option<String>,
    pub max_attempts: Option<u32>,
    pub wipe_algorithm: Option<WipeAlgorithm>,
}

impl VaultConfig {
    /// Load `path` (missing file is fine) layered under `VAULT_*` variables.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let raw: RawVaultConfig = settings.try_deserialize()?;
        let mut config = Self::default();
        config.merge(raw);

        tracing::debug!(
            path = %path.display(),
            device = %config.target_device,
            algorithm = %config.wipe_algorithm.config_name(),
            max_attempts = config.max_attempts,
            "Vault configuration loaded"
        );
        Ok(config)
    }

    fn merge(&mut self, raw: RawVaultConfig) {
        if let Some(device) = raw.target_device.map(clean_value) {
            self.target_device = device;
        }
        if let Some(mount_point) = raw.mount_point.map(clean_value) {
            if !mount_point.is_empty() {
                self.mount_point = mount_point;
            }
        }
        if let Some(name) = raw.wipe_algorithm.map(clean_value) {
            match name.parse::<WipeAlgorithm>() {
                Ok(algorithm) => self.wipe_algorithm = algorithm,
                Err(e) => {
                    tracing::warn!(error = %e, "Falling back to Gutmann");
                    self.wipe_algorithm = WipeAlgorithm::Gutmann35;
                }
            }
        }
        if let Some(value) = raw.encrypt_before_wipe.map(clean_value) {
            self.encrypt_before_wipe = parse_bool(&value);
        }
        if let Some(value) = raw.verify_passes.map(clean_value) {
            self.verify_passes = parse_bool(&value);
        }
        if let Some(value) = raw.max_attempts.map(clean_value) {
            match parse_attempts(&value) {
                Some(n) => self.max_attempts = n,
                None => tracing::warn!(
                    value = %value,
                    keeping = self.max_attempts,
                    "max_attempts must be between 1 and 99"
                ),
            }
        }
        if let Some(value) = raw.countdown_secs.map(clean_value) {
            match value.parse::<u64>() {
                Ok(secs) => self.countdown_secs = secs,
                Err(_) => tracing::warn!(value = %value, "Ignoring invalid countdown_secs"),
            }
        }
    }

    /// True once the failure counter has reached the threshold.
    pub fn should_trigger(&self) -> bool {
        self.current_attempts >= self.max_attempts
    }

    pub fn apply_overrides(&mut self, overrides: &KernelOverrides) {
        if let Some(device) = &overrides.target_device {
            tracing::info!(device = %device, "Target device overridden from kernel command line");
            self.target_device = device.clone();
        }
        if let Some(n) = overrides.max_attempts {
            self.max_attempts = n;
        }
        if let Some(algorithm) = overrides.wipe_algorithm {
            self.wipe_algorithm = algorithm;
        }
    }

    /// Apply `vault_*` parameters from `/proc/cmdline`. No-op elsewhere.
    pub fn apply_kernel_cmdline(&mut self) {
        #[cfg(target_os = "linux")]
        {
            match std::fs::read_to_string("/proc/cmdline") {
                Ok(cmdline) => self.apply_overrides(&parse_kernel_cmdline(&cmdline)),
                Err(e) => tracing::debug!(error = %e, "Kernel command line unavailable"),
            }
        }
    }

    /// INI text as written by [`VaultConfig::save`]
    pub fn to_ini(&self) -> String {
        let mut out = String::from("# ShredOS Vault Configuration\n\n");
        let _ = writeln!(out, "max_attempts = {}\n", self.max_attempts);
        if !self.target_device.is_empty() {
            let _ = writeln!(out, "target_device = \"{}\"", self.target_device);
        }
        let _ = writeln!(out, "mount_point = \"{}\"\n", self.mount_point);
        let _ = writeln!(out, "wipe_algorithm = {}", self.wipe_algorithm.config_name());
        let _ = writeln!(out, "encrypt_before_wipe = {}", self.encrypt_before_wipe);
        let _ = writeln!(out, "verify_passes = {}", self.verify_passes);
        let _ = writeln!(out, "countdown_secs = {}", self.countdown_secs);
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_ini()).map_err(|source| ConfigError::Save {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Extract `vault_device=`, `vault_threshold=` and `vault_wipe=` from a
/// kernel command line. Invalid values are dropped.
pub fn parse_kernel_cmdline(cmdline: &str) -> KernelOverrides {
    let mut overrides = KernelOverrides::default();

    for token in cmdline.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        match key {
            "vault_device" if !value.is_empty() => {
                overrides.target_device = Some(value.to_string());
            }
            "vault_threshold" => overrides.max_attempts = parse_attempts(value),
            "vault_wipe" => {
                overrides.wipe_algorithm = match value {
                    "gutmann" => Some(WipeAlgorithm::Gutmann35),
                    "dod" => Some(WipeAlgorithm::Dod7),
                    "dodshort" => Some(WipeAlgorithm::DodShort3),
                    "random" => Some(WipeAlgorithm::Random1),
                    "zero" => Some(WipeAlgorithm::Zero1),
                    other => {
                        tracing::warn!(value = %other, "Ignoring unknown vault_wipe");
                        None
                    }
                };
            }
            _ => {}
        }
    }

    overrides
}

fn parse_attempts(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| (MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(n))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1" | "on"
    )
}

/// Strip the decorations older libconfig-style files carry: a trailing
/// `;`, `[...]` brackets and surrounding quotes.
fn clean_value(value: String) -> String {
    let mut v = value.trim();
    if let Some(stripped) = v.strip_suffix(';') {
        v = stripped.trim_end();
    }
    if let Some(inner) = v.strip_prefix('[') {
        v = inner.split(']').next().unwrap_or(inner).trim();
    }
    if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        v = &v[1..v.len() - 1];
    }
    v.to_string()
}
