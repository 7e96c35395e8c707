// Dead-man screens on the controlling terminal

use crate::deadman::DeadManConsole;
use colored::Colorize;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

pub struct TerminalConsole {
    tick: Duration,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            tick: Duration::from_secs(1),
        }
    }

    fn clear_screen() {
        print!("\x1b[2J\x1b[H");
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadManConsole for TerminalConsole {
    fn countdown(&mut self, seconds: u64) {
        Self::clear_screen();
        println!("\n\n");
        for line in [
            "    !!! DEAD MAN'S SWITCH ACTIVATED !!!",
            "    MAXIMUM AUTHENTICATION ATTEMPTS EXCEEDED",
            "    Target drive will be ENCRYPTED and WIPED",
            "    THIS CANNOT BE STOPPED OR REVERSED",
        ] {
            println!("{}\n", line.on_red().white().bold());
        }

        for remaining in (1..=seconds).rev() {
            print!("\r    Starting in {} seconds...  ", remaining);
            io::stdout().flush().ok();
            thread::sleep(self.tick);
        }
        println!("\r    {}     ", "INITIATING WIPE SEQUENCE".red().bold());
        io::stdout().flush().ok();
        thread::sleep(self.tick);
    }

    fn status(&mut self, message: &str) {
        println!("  {}", message.cyan());
        io::stdout().flush().ok();
    }

    fn wiping(&mut self, device: &str, algorithm_name: &str) {
        Self::clear_screen();
        println!("\n  {}\n", "WIPING IN PROGRESS".red().bold());
        println!("  Device:    {}", device);
        println!("  Algorithm: {}\n", algorithm_name);
        println!("  Do NOT power off. This may take a long time.");
        io::stdout().flush().ok();
    }

    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}
