use crate::DriveType;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static::lazy_static! {
    // Whole-disk names whose partitions carry a `p` separator
    static ref PARTITIONED_WITH_P: Regex =
        Regex::new(r"^((?:nvme\d+n\d+)|(?:mmcblk\d+)|(?:loop\d+)|(?:md\d+))(?:p\d+)?$")
            .expect("static regex");
    // sda1, vdb2, xvda3, hdc1
    static ref PARTITIONED_PLAIN: Regex =
        Regex::new(r"^((?:sd|hd|vd|xvd)[a-z]+)\d*$").expect("static regex");
}

const SYS_BLOCK: &str = "/sys/block";

/// Classifies a device path as HDD, SSD or NVMe.
///
/// The result is advisory. It decides whether a wear-leveling warning is
/// shown and never changes how the device is wiped.
pub struct DriveDetector {
    sysfs_root: PathBuf,
}

impl Default for DriveDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveDetector {
    pub fn new() -> Self {
        Self::with_sysfs_root(SYS_BLOCK)
    }

    /// Read queue attributes below `root` instead of `/sys/block`
    pub fn with_sysfs_root(root: impl AsRef<Path>) -> Self {
        Self {
            sysfs_root: root.as_ref().to_path_buf(),
        }
    }

    /// NVMe naming wins over every other signal; after that the kernel's
    /// `queue/rotational` flag decides.
    pub fn detect(&self, device_path: &str) -> DriveType {
        let base = Self::base_device_name(device_path);

        if base.starts_with("nvme") {
            return DriveType::NVMe;
        }

        let rotational = self.sysfs_root.join(&base).join("queue").join("rotational");
        match std::fs::read_to_string(&rotational) {
            Ok(flag) if flag.trim() == "0" => DriveType::SSD,
            Ok(_) => DriveType::HDD,
            Err(e) => {
                tracing::debug!(path = %rotational.display(), error = %e, "No rotational flag");
                DriveType::Unknown
            }
        }
    }

    /// Whole-disk kernel name for a device or partition path.
    ///
    /// `/dev/sda1` -> `sda`, `/dev/nvme0n1p2` -> `nvme0n1`, `mmcblk0p1` -> `mmcblk0`
    pub fn base_device_name(device_path: &str) -> String {
        let name = device_path
            .rsplit('/')
            .next()
            .unwrap_or(device_path)
            .trim();

        if let Some(caps) = PARTITIONED_WITH_P.captures(name) {
            return caps[1].to_string();
        }
        if let Some(caps) = PARTITIONED_PLAIN.captures(name) {
            return caps[1].to_string();
        }
        name.to_string()
    }

    /// Classify `diskutil info` output. NVMe protocol takes precedence over
    /// the solid-state flag.
    pub(crate) fn classify_diskutil_info(output: &str) -> DriveType {
        if let Some(protocol) = Self::extract_field(output, "Protocol") {
            let protocol = protocol.to_ascii_lowercase();
            if protocol.contains("nvme") || protocol.contains("pci") {
                return DriveType::NVMe;
            }
        }
        if let Some(media) = Self::extract_field(output, "Device / Media Name") {
            if media.to_ascii_lowercase().contains("nvme") {
                return DriveType::NVMe;
            }
        }
        match Self::extract_field(output, "Solid State").as_deref() {
            Some("Yes") => DriveType::SSD,
            Some("No") => DriveType::HDD,
            _ => DriveType::Unknown,
        }
    }

    pub(crate) fn extract_field(output: &str, field_name: &str) -> Option<String> {
        output
            .lines()
            .find(|line| line.trim_start().starts_with(field_name))?
            .split_once(':')
            .map(|(_, value)| value.trim().to_string())
    }
}

/// Advisory drive type of `device_path` on the running platform.
pub fn detect_drive_type(device_path: &str) -> DriveType {
    #[cfg(target_os = "linux")]
    {
        DriveDetector::new().detect(device_path)
    }

    #[cfg(target_os = "macos")]
    {
        match std::process::Command::new("diskutil")
            .args(["info", device_path])
            .output()
        {
            Ok(output) if output.status.success() => {
                DriveDetector::classify_diskutil_info(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(_) | Err(_) => {
                tracing::debug!(device = %device_path, "diskutil info unavailable");
                DriveType::Unknown
            }
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let _ = device_path;
        DriveType::Unknown
    }
}
