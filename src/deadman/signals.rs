// Non-interruptible region
//
// Entering it is irreversible for the rest of the process lifetime: there is
// no matching "leave".

use std::sync::Once;

static ENGAGE: Once = Once::new();

#[cfg_attr(test, mockall::automock)]
pub trait InterruptShield: Send + Sync {
    /// Block or ignore every signal a user could use to stop the process.
    /// Idempotent.
    fn engage(&self);
}

/// Shields the current process.
pub struct ProcessSignals;

impl InterruptShield for ProcessSignals {
    fn engage(&self) {
        ENGAGE.call_once(block_interrupts);
    }
}

/// Interrupt, terminate, quit, suspend and hangup
#[cfg(unix)]
pub fn interrupt_signals() -> [nix::sys::signal::Signal; 5] {
    use nix::sys::signal::Signal;
    [
        Signal::SIGINT,
        Signal::SIGTERM,
        Signal::SIGQUIT,
        Signal::SIGTSTP,
        Signal::SIGHUP,
    ]
}

#[cfg(unix)]
fn block_interrupts() {
    use nix::sys::signal::{signal, sigprocmask, SigHandler, SigSet, SigmaskHow};

    if let Err(e) = sigprocmask(SigmaskHow::SIG_BLOCK, Some(&SigSet::all()), None) {
        tracing::warn!(error = %e, "sigprocmask failed");
    }
    for sig in interrupt_signals() {
        // SAFETY: SigIgn installs no handler code
        if let Err(e) = unsafe { signal(sig, SigHandler::SigIgn) } {
            tracing::warn!(signal = %sig, error = %e, "Could not ignore signal");
        }
    }
    tracing::info!("Interrupt signals blocked");
}

#[cfg(windows)]
pub fn interrupt_signals() -> [&'static str; 2] {
    ["CTRL_C_EVENT", "CTRL_BREAK_EVENT"]
}

#[cfg(windows)]
fn block_interrupts() {
    use winapi::um::consoleapi::SetConsoleCtrlHandler;

    // A null handler with TRUE makes the process ignore Ctrl+C
    if unsafe { SetConsoleCtrlHandler(None, 1) } == 0 {
        tracing::warn!(error = %std::io::Error::last_os_error(), "SetConsoleCtrlHandler failed");
    }
    tracing::info!("Console interrupts ignored");
}
