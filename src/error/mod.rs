/// Error taxonomy for the wipe engine
///
/// Every failure a wipe can hit maps to exactly one [`WipeError`] variant.
/// Write-path variants carry the 1-based pass number and the byte offset at
/// which the pass stopped, so a partial run can be reported precisely.
///
/// Propagation rules:
/// - any seek/write/verify error ends the pass and the whole algorithm
/// - [`WipeError::ExternalToolUnavailable`] and [`WipeError::ExternalToolFailed`]
///   send the engine down the direct-I/O path once
/// - everything else is terminal for that invocation
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WipeError {
    #[error("cannot determine size of {device}")]
    DeviceSizeUnknown {
        device: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("cannot open {device} for {}: {source}{}", direction(.write), privilege_hint(.source))]
    OpenFailed {
        device: String,
        write: bool,
        #[source]
        source: io::Error,
    },

    #[error("seek to start of pass {pass} failed: {source}")]
    SeekFailed {
        pass: usize,
        #[source]
        source: io::Error,
    },

    #[error("short write on pass {pass} at offset {offset}: {written} of {expected} bytes accepted")]
    ShortWrite {
        pass: usize,
        offset: u64,
        written: usize,
        expected: usize,
    },

    #[error("write error on pass {pass} at offset {offset}: {source}")]
    WriteError {
        pass: usize,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("flush to media failed after pass {pass}: {source}")]
    SyncFailed {
        pass: usize,
        #[source]
        source: io::Error,
    },

    #[error("verification of pass {pass} failed at offset {offset}: data mismatch")]
    VerifyMismatch { pass: usize, offset: u64 },

    #[error("verification of pass {pass} could not read offset {offset}: {source}")]
    VerifyReadFailed {
        pass: usize,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("wipe aborted by user during pass {pass} at offset {offset}")]
    UserAborted { pass: usize, offset: u64 },

    #[error("secure random source failed: {0}")]
    RandomSourceFailed(String),

    #[error("buffer allocation failed: {0}")]
    BufferAllocation(String),

    #[error("external wipe tool {0} is not installed")]
    ExternalToolUnavailable(String),

    #[error("external wipe tool {tool} failed ({})", exit_description(.status))]
    ExternalToolFailed { tool: String, status: Option<i32> },
}

impl WipeError {
    /// External tool problems are the only errors that send the engine down
    /// the direct-I/O path.
    pub fn triggers_direct_fallback(&self) -> bool {
        matches!(
            self,
            WipeError::ExternalToolUnavailable(_) | WipeError::ExternalToolFailed { .. }
        )
    }

    /// Pass number the error is attributed to, if any.
    pub fn pass(&self) -> Option<usize> {
        match self {
            WipeError::SeekFailed { pass, .. }
            | WipeError::ShortWrite { pass, .. }
            | WipeError::WriteError { pass, .. }
            | WipeError::SyncFailed { pass, .. }
            | WipeError::VerifyMismatch { pass, .. }
            | WipeError::VerifyReadFailed { pass, .. }
            | WipeError::UserAborted { pass, .. } => Some(*pass),
            _ => None,
        }
    }

    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            WipeError::VerifyMismatch { .. } | WipeError::VerifyReadFailed { .. }
        )
    }
}

fn direction(write: &bool) -> &'static str {
    if *write {
        "writing"
    } else {
        "reading"
    }
}

fn privilege_hint(err: &io::Error) -> &'static str {
    if err.kind() == io::ErrorKind::PermissionDenied {
        " (are you root?)"
    } else {
        ""
    }
}

fn exit_description(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal or failed to start".to_string(),
    }
}

pub type WipeErrorResult<T> = Result<T, WipeError>;
