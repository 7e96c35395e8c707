//! Terminal output: progress bar, wipe report and dead-man screens.

pub mod console;
pub mod progress;
pub mod report;

pub use console::TerminalConsole;
pub use progress::ProgressBar;
pub use report::WipeReport;
