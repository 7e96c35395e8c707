use super::detection::DriveDetector;
use std::fs;

const PROC_MOUNTS: &str = "/proc/mounts";

/// Mount points of every filesystem whose source is `device` or one of its
/// partitions, in mount-table order.
pub fn mounted_filesystems(device: &str) -> Vec<String> {
    match fs::read_to_string(PROC_MOUNTS) {
        Ok(table) => parse_mounts(&table, device),
        Err(_) => Vec::new(),
    }
}

pub(crate) fn parse_mounts(table: &str, device: &str) -> Vec<String> {
    let target = DriveDetector::base_device_name(device);

    table
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let source = fields.next()?;
            let mount_point = fields.next()?;
            if !source.starts_with("/dev/") {
                return None;
            }
            if source == device || DriveDetector::base_device_name(source) == target {
                Some(unescape_octal(mount_point))
            } else {
                None
            }
        })
        .collect()
}

// The kernel escapes space, tab, newline and backslash as \ooo
fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = std::str::from_utf8(&bytes[i + 1..i + 4]).unwrap_or("");
            if let Ok(value) = u8::from_str_radix(digits, 8) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
