use crate::WipeProgress;
use std::io::{self, Write};

pub(crate) const CAT_FRAMES: [&str; 6] = [
    "ฅ(^･ω･^=)  ", // cat happy
    "ฅ(=^･ω･^ ) ",
    "ฅ(^･ᴥ･^=)  ",
    "ฅ(=^ᴥ^= )  ",
    "ฅ(^･ω･^=)  ",
    "ฅ(=^･ω･^ ) ",
];

pub(crate) const PAW_FRAMES: [&str; 4] = ["·", "˚", "•", "˚"];

const GREEN: &str = "\x1b[38;5;82m";
const YELLOW: &str = "\x1b[38;5;220m";
const GRAY: &str = "\x1b[38;5;240m";
const CYAN: &str = "\x1b[38;5;51m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Two-line animated bar (walking cat above, bar and rates below) for wipe
/// progress. Drawn on stderr so reports on stdout stay clean.
pub struct ProgressBar {
    width: usize,
    cat_pos: usize,
    cat_frame: usize,
    paw_frame: usize,
    first_render: bool,
}

impl ProgressBar {
    /// width = number of bar character slots (not including the brackets)
    pub fn new(width: usize) -> Self {
        Self {
            width,
            cat_pos: 0,
            cat_frame: 0,
            paw_frame: 0,
            first_render: true,
        }
    }

    /// Draw `progress`, replacing the previous frame.
    pub fn render(&mut self, progress: &WipeProgress) {
        let frame = self.frame(progress);
        let mut err = io::stderr().lock();
        if self.first_render {
            self.first_render = false;
        } else {
            // up 3 lines and clear
            let _ = write!(err, "\x1b[3A");
        }
        for line in frame.lines() {
            let _ = writeln!(err, "\x1b[2K\r{}", line);
        }
        err.flush().ok();
    }

    /// Three lines: pass header, cat, bar with rates
    pub fn frame(&mut self, progress: &WipeProgress) -> String {
        let pct = clamp_percent(progress.percent());

        let filled = ((pct / 100.0) * self.width as f64).round() as usize;
        let empty = self.width.saturating_sub(filled);

        // advance animation frames
        self.cat_pos = (self.cat_pos + 1) % (self.width.max(1));
        self.cat_frame = (self.cat_frame + 1) % CAT_FRAMES.len();
        self.paw_frame = (self.paw_frame + 1) % PAW_FRAMES.len();

        let cat_line = self.cat_line();

        // verify phase in yellow so it is not mistaken for writing
        let fill_color = if progress.is_verify_phase { YELLOW } else { GREEN };
        let bar = format!(
            "{}{}{}{}{}{}{}",
            BOLD,
            fill_color,
            "█".repeat(filled),
            RESET,
            GRAY,
            "░".repeat(empty),
            RESET
        );

        let info = if progress.speed > 0.0 {
            format!(
                "{}{:.1}%{}  {} @ {}/s  ETA {}{}",
                BOLD,
                pct,
                RESET,
                CYAN,
                human_bytes(progress.speed),
                format_duration(progress.eta.as_secs()),
                RESET
            )
        } else {
            let paw = PAW_FRAMES[self.paw_frame];
            format!("{}{:.1}%{}  {}working...{}{}", BOLD, pct, RESET, CYAN, paw, RESET)
        };

        format!(
            "{}\n{}\n[{}] {}",
            progress.description, cat_line, bar, info
        )
    }

    // cat walks independently across the width, wraps around
    fn cat_line(&self) -> String {
        let mut cat_line = vec![' '; self.width + 2]; // include bracket space
        let cat_chars: Vec<char> = CAT_FRAMES[self.cat_frame].chars().collect();
        let pos = self
            .cat_pos
            .min((self.width + 2).saturating_sub(cat_chars.len()));
        for (i, c) in cat_chars.iter().enumerate() {
            if pos + i < cat_line.len() {
                cat_line[pos + i] = *c;
            }
        }
        cat_line.into_iter().collect()
    }
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new(48)
    }
}

fn clamp_percent(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 100.0)
    }
}

/// Convert bytes (or bytes/sec) to readable string
pub(crate) fn human_bytes(bps: f64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    if bps <= 0.0 {
        return "0B".to_string();
    }
    let mut val = bps;
    let mut i = 0usize;
    while val >= 1024.0 && i + 1 < units.len() {
        val /= 1024.0;
        i += 1;
    }
    format!("{:.2}{}", val, units[i])
}

/// Format seconds to H:MM:SS or M:SS
pub(crate) fn format_duration(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
