//! Progress reporting for TTY and non-TTY environments.
//!
//! TTY mode: indicatif document-count bars (cleared on completion).
//! Non-TTY mode: hidden bars; the pipelines fall back to log lines.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Document-count bar, shown once the total is known
fn count_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:<8.dim} {bar:30.green/dim} {human_pos:>10}/{human_len:10} {eta:>4} {wide_msg:.dim}")
        .expect("invalid template")
        .progress_chars("--")
}

/// Spinner with a running count — shown while the total is unknown
fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:<8.dim} {human_pos:>10} {wide_msg:.dim}")
        .expect("invalid template")
}

/// Upgrade a spinner to a document-count bar.
///
/// Call this once the server has reported a total document count.
pub fn upgrade_to_count_bar(pb: &ProgressBar, total: u64) {
    pb.set_length(total);
    pb.set_style(count_bar_style());
}

/// Central progress context managing multi-progress bars.
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Create new context, detecting TTY automatically.
    pub fn new() -> Self {
        let is_tty = std::io::stderr().is_terminal();
        Self {
            multi: MultiProgress::new(),
            is_tty,
        }
    }

    /// Create a progress bar for one transfer run.
    ///
    /// With a known `total`: a document-count bar. Without one: a spinner
    /// (upgrade later via [`upgrade_to_count_bar`]). Non-TTY: hidden (no-op).
    pub fn transfer_bar(&self, name: &str, total: Option<u64>) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }

        let pb = match total {
            Some(total) => {
                let pb = self.multi.add(ProgressBar::new(total));
                pb.set_style(count_bar_style());
                pb
            }
            None => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(spinner_style());
                pb.enable_steady_tick(Duration::from_millis(80));
                pb
            }
        };
        pb.set_prefix(name.to_string());
        pb
    }

    /// Print a line above managed progress bars (avoids interference).
    ///
    /// Use this instead of `eprintln!` when progress bars are active.
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.is_tty {
            let _ = self.multi.println(msg);
        } else {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Whether running in TTY mode.
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Get reference to `MultiProgress` for log bridge.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for `ProgressContext`.
pub type SharedProgress = Arc<ProgressContext>;

/// Format a document count with thousand separators.
pub fn fmt_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}
