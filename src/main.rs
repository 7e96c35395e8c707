use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::io::{self, Write};
use std::ops::ControlFlow;
use tracing_subscriber::EnvFilter;
use vault_wipe::io::platform_specific::resolve_raw_path;
use vault_wipe::system::is_elevated;
use vault_wipe::ui::{ProgressBar, WipeReport};
use vault_wipe::*;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Parser)]
#[command(name = "secure-wipe")]
#[command(about = "Overwrite an entire block device so its contents cannot be recovered")]
#[command(version)]
struct Cli {
    /// Device path (e.g., /dev/sdb, /dev/disk2, PhysicalDrive1)
    #[arg(short, long)]
    device: String,

    /// Overwrite method
    #[arg(short, long, value_enum, default_value_t = AlgorithmArg::Gutmann)]
    algorithm: AlgorithmArg,

    /// Read back every pass after writing it
    #[arg(long)]
    verify: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    force: bool,

    /// Show device information and exit
    #[arg(long)]
    info: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    /// Gutmann (35 passes)
    Gutmann,
    /// DoD 5220.22-M (7 passes)
    Dod,
    /// Schneier / DoD short (3 random passes)
    Schneier,
    /// One pass of random data
    Random,
    /// One pass of zeros
    Zero,
}

impl From<AlgorithmArg> for WipeAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Gutmann => WipeAlgorithm::Gutmann35,
            AlgorithmArg::Dod => WipeAlgorithm::Dod7,
            AlgorithmArg::Schneier => WipeAlgorithm::DodShort3,
            AlgorithmArg::Random => WipeAlgorithm::Random1,
            AlgorithmArg::Zero => WipeAlgorithm::Zero1,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    match run(cli) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the device ended up wiped (or, with `--info`, inspected).
fn run(cli: Cli) -> Result<bool> {
    #[cfg(not(feature = "color-output"))]
    colored::control::set_override(false);

    if !is_elevated() {
        bail!("this program requires root privileges; run with sudo or as root");
    }

    init_logging(cli.debug);

    let algorithm = WipeAlgorithm::from(cli.algorithm);
    let device = cli.device.as_str();

    let raw = resolve_raw_path(device);
    let size = get_device_size(&raw).with_context(|| format!("cannot read size of {}", raw))?;
    let drive_type = detect_drive_type(device);

    print_device_info(device, &raw, size, drive_type, algorithm, cli.verify);

    if cli.info {
        return Ok(true);
    }

    if !cli.force && !confirm(device)? {
        println!("Operation cancelled.");
        return Ok(false);
    }

    release_device(device)?;
    setup_signal_handlers()?;

    let config = WipeConfig::new(device, algorithm, cli.verify);
    let mut bar = ProgressBar::default();
    let result = wipe_execute(&config, &mut |p: &WipeProgress| {
        bar.render(p);
        if is_interrupted() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    eprintln!();

    let report = WipeReport::new(device, algorithm, &result);
    if cli.json {
        println!("{}", report.to_json().context("failed to encode report")?);
    } else {
        for warning in &result.warnings {
            eprintln!("{} {}", "Warning:".yellow().bold(), warning);
        }
        println!("{}", report.render_text());
    }

    Ok(result.is_success())
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_device_info(
    device: &str,
    raw: &str,
    size: u64,
    drive_type: DriveType,
    algorithm: WipeAlgorithm,
    verify: bool,
) {
    println!("{}", "Device Information".bold());
    println!("  Device:     {}", device);
    if raw != device {
        println!("  Raw path:   {}", raw);
    }
    println!("  Size:       {:.2} GB ({} bytes)", size as f64 / GIB, size);
    println!("  Drive type: {}", drive_type);
    println!(
        "  Algorithm:  {} ({} passes{})",
        algorithm,
        algorithm.pass_count(),
        if verify { ", verified" } else { "" }
    );
    if drive_type.is_flash() {
        println!(
            "  {} overwriting cannot reach over-provisioned or remapped flash blocks",
            "Note:".yellow()
        );
    }
    println!();
}

fn confirm(device: &str) -> Result<bool> {
    println!(
        "{} This will permanently erase ALL data on {}",
        "WARNING:".red().bold(),
        device
    );
    print!("Type 'YES' to confirm: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim() == "YES")
}

/// Make sure nothing holds the device open before writing to it.
#[cfg(target_os = "linux")]
fn release_device(device: &str) -> Result<()> {
    let mounted = vault_wipe::drives::mounted_filesystems(device);
    if !mounted.is_empty() {
        bail!(
            "{} has mounted filesystems ({}); unmount them first",
            device,
            mounted.join(", ")
        );
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn release_device(device: &str) -> Result<()> {
    let status = std::process::Command::new("diskutil")
        .args(["unmountDisk", device])
        .status()
        .context("failed to run diskutil")?;
    if !status.success() {
        bail!("diskutil could not unmount {}", device);
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn release_device(_device: &str) -> Result<()> {
    Ok(())
}

// SIGINT stops the wipe at the next chunk boundary
#[cfg(unix)]
fn setup_signal_handlers() -> Result<()> {
    use signal_hook::{consts::SIGINT, iterator::Signals};

    let mut signals = Signals::new([SIGINT]).context("failed to install SIGINT handler")?;

    std::thread::spawn(move || {
        for sig in signals.forever() {
            if sig == SIGINT {
                eprintln!("\n\nInterrupt received! Stopping after the current chunk...");
                vault_wipe::set_interrupted();
            }
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers() -> Result<()> {
    Ok(())
}
