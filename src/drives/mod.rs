// Drive inspection
//
// - detection.rs: advisory media classification (HDD / SSD / NVMe)
// - mounts.rs: filesystems currently mounted from a device

pub mod detection;
pub mod mounts;


pub use detection::{detect_drive_type, DriveDetector};
pub use mounts::mounted_filesystems;
