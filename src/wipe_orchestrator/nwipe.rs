// External wiper dispatch (nwipe)
//
// When nwipe is installed the whole algorithm is handed to it. Any problem
// with the tool itself is reported as a fallback-worthy error and the
// direct-I/O engine takes over.

use crate::error::{WipeError, WipeErrorResult};
use crate::WipeAlgorithm;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Well-known install locations
pub const NWIPE_PATHS: [&str; 2] = ["/usr/bin/nwipe", "/usr/sbin/nwipe"];

/// An out-of-process wiper that can run a whole algorithm on its own.
#[cfg_attr(test, mockall::automock)]
pub trait ExternalWiper: Send + Sync {
    fn tool_name(&self) -> String;

    fn is_available(&self) -> bool;

    /// Run to completion and return the exit code (`None` if killed by a signal).
    fn run(&self, device: &str, algorithm: WipeAlgorithm, verify: bool) -> io::Result<Option<i32>>;
}

/// Decide what an external run amounts to.
///
/// Unavailable tools, spawn errors and non-zero exits all come back as
/// errors for which [`WipeError::triggers_direct_fallback`] holds.
pub fn external_outcome(
    tool: &str,
    available: bool,
    exit: Option<io::Result<Option<i32>>>,
) -> WipeErrorResult<()> {
    match (available, exit) {
        (false, _) | (true, None) => Err(WipeError::ExternalToolUnavailable(tool.to_string())),
        (true, Some(Ok(Some(0)))) => Ok(()),
        (true, Some(Ok(status))) => Err(WipeError::ExternalToolFailed {
            tool: tool.to_string(),
            status,
        }),
        (true, Some(Err(e))) => {
            tracing::warn!(tool = %tool, error = %e, "Failed to launch external wiper");
            Err(WipeError::ExternalToolFailed {
                tool: tool.to_string(),
                status: None,
            })
        }
    }
}

/// nwipe `--method` value for an algorithm
pub fn nwipe_method(algorithm: WipeAlgorithm) -> &'static str {
    match algorithm {
        WipeAlgorithm::Gutmann35 => "gutmann",
        WipeAlgorithm::Dod7 => "dod522022m",
        WipeAlgorithm::DodShort3 => "dodshort",
        WipeAlgorithm::Random1 => "random",
        WipeAlgorithm::Zero1 => "zero",
        WipeAlgorithm::VerifyOnly => "verify",
    }
}

/// Non-interactive command line for one device
pub fn nwipe_args(device: &str, algorithm: WipeAlgorithm, verify: bool) -> Vec<String> {
    let mut args = vec![
        "--autonuke".to_string(),
        "--nowait".to_string(),
        "--nogui".to_string(),
    ];
    if verify {
        args.push("--verify=all".to_string());
    }
    args.push(format!("--method={}", nwipe_method(algorithm)));
    args.push(device.to_string());
    args
}

pub struct Nwipe {
    candidates: Vec<PathBuf>,
}

impl Nwipe {
    pub fn new() -> Self {
        Self::with_candidates(NWIPE_PATHS.iter().map(PathBuf::from).collect())
    }

    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    fn binary(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|path| is_executable(path))
    }
}

impl Default for Nwipe {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalWiper for Nwipe {
    fn tool_name(&self) -> String {
        "nwipe".to_string()
    }

    fn is_available(&self) -> bool {
        self.binary().is_some()
    }

    fn run(&self, device: &str, algorithm: WipeAlgorithm, verify: bool) -> io::Result<Option<i32>> {
        let binary = self
            .binary()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        let args = nwipe_args(device, algorithm, verify);
        tracing::info!(binary = %binary.display(), args = ?args, "Running external wiper");

        let status = Command::new(binary).args(&args).status()?;
        Ok(status.code())
    }
}

/// Stand-in on platforms without an external wiper
pub struct NoExternalWiper;

impl ExternalWiper for NoExternalWiper {
    fn tool_name(&self) -> String {
        "none".to_string()
    }

    fn is_available(&self) -> bool {
        false
    }

    fn run(&self, _device: &str, _algorithm: WipeAlgorithm, _verify: bool) -> io::Result<Option<i32>> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
