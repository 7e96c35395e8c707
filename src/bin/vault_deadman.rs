//! Dead-man entry point, run by the authenticator once the failure threshold
//! is reached. On success the machine powers off and this never returns.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vault_wipe::config::{VaultConfig, DEFAULT_CONFIG_PATH};
use vault_wipe::deadman_trigger;
use vault_wipe::system::{is_elevated, lock_memory};

#[derive(Parser)]
#[command(name = "vault-deadman")]
#[command(about = "Destroy the vault target device and power off")]
#[command(version)]
struct Cli {
    /// Vault configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Authentication failures so far (defaults to the configured threshold)
    #[arg(long)]
    failed_attempts: Option<u32>,

    /// Seconds of warning before the wipe starts
    #[arg(long)]
    countdown: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("vault-deadman: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    lock_memory();

    let mut config = VaultConfig::load(&cli.config)
        .with_context(|| format!("cannot load {}", cli.config.display()))?;
    config.apply_kernel_cmdline();
    if let Some(secs) = cli.countdown {
        config.countdown_secs = secs;
    }
    config.current_attempts = cli.failed_attempts.unwrap_or(config.max_attempts);

    if config.target_device.is_empty() {
        bail!("no target_device configured");
    }

    if !config.should_trigger() {
        tracing::info!(
            attempts = config.current_attempts,
            threshold = config.max_attempts,
            "Threshold not reached"
        );
        return Ok(());
    }

    if !is_elevated() {
        bail!("root privileges are required to wipe {}", config.target_device);
    }

    let report = deadman_trigger(&config);

    // Only reachable when power-off failed
    match report.power_off_error {
        Some(e) => Err(e).context("wipe finished but the machine could not be powered off"),
        None => bail!("power-off returned without shutting down"),
    }
}
