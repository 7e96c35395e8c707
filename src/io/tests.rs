use super::*;
use std::io::Write as _;
use tempfile::NamedTempFile;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn image_of(size: usize) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(&vec![0xCD; size])?;
    file.flush()?;
    Ok(file)
}

#[test]
fn test_regular_file_reports_its_length() -> Result<()> {
    let image = image_of(64 * 1024)?;
    let path = image.path().to_str().unwrap();
    assert_eq!(get_device_size(path)?, 64 * 1024);
    Ok(())
}

#[test]
fn test_empty_file_has_unknown_size() -> Result<()> {
    let image = NamedTempFile::new()?;
    let path = image.path().to_str().unwrap();
    assert!(get_device_size(path).is_err());
    Ok(())
}

#[test]
fn test_missing_device_has_unknown_size() {
    assert!(get_device_size("/definitely/not/a/device").is_err());
}

#[cfg(not(target_os = "windows"))]
#[test]
fn test_platform_channel_write_then_read() -> Result<()> {
    let image = image_of(8192)?;
    let path = image.path().to_str().unwrap();
    let devices = PlatformDevices;

    let mut writer = devices.open_write(path)?;
    assert_eq!(writer.alignment(), 1);
    writer.seek(0)?;
    let written = writer.write(&[0x42; 4096])?;
    assert_eq!(written, 4096);
    writer.sync()?;
    writer.close()?;

    let mut reader = devices.open_read(path)?;
    let mut buf = vec![0u8; 8192];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    assert_eq!(filled, 8192);
    assert!(buf[..4096].iter().all(|&b| b == 0x42));
    assert!(buf[4096..].iter().all(|&b| b == 0xCD));
    Ok(())
}

#[test]
fn test_open_write_on_missing_path_fails() {
    let devices = PlatformDevices;
    assert!(devices.open_write("/definitely/not/a/device").is_err());
}

#[test]
fn test_platform_backend_has_name() {
    assert!(!PlatformDevices.name().is_empty());
}
