// src/progress.rs
// =============================================================================
// Progress reporting for the worker pool.
//
// Workers call `advance()` exactly once per URL, when that URL's fate is
// decided. The terminal implementation redraws a one-line bar on stderr so it
// does not mix with findings printed on stdout.
// =============================================================================

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::output::{Color, Palette};

const BAR_WIDTH: usize = 30;

pub trait ProgressReporter: Send + Sync {
    /// One more URL has been fully processed.
    fn advance(&self);

    /// Called once after the last URL.
    fn finish(&self) {}
}

/// `Processing URLs [━━━━━━>       ] 12/40` on stderr.
pub struct TerminalProgress {
    total: usize,
    done: AtomicUsize,
    palette: Palette,
}

impl TerminalProgress {
    pub fn new(total: usize, palette: Palette) -> Self {
        let progress = TerminalProgress {
            total,
            done: AtomicUsize::new(0),
            palette,
        };
        progress.draw(0);
        progress
    }

    fn draw(&self, done: usize) {
        let line = render_bar(done, self.total, self.palette);
        let mut stderr = io::stderr().lock();
        // write errors on stderr are ignored
        let _ = write!(stderr, "\r{}", line);
        let _ = stderr.flush();
    }
}

impl ProgressReporter for TerminalProgress {
    fn advance(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        self.draw(done);
    }

    fn finish(&self) {
        self.draw(self.done.load(Ordering::SeqCst));
        eprintln!();
    }
}

pub fn render_bar(done: usize, total: usize, palette: Palette) -> String {
    let filled = if total == 0 {
        BAR_WIDTH
    } else {
        (done.min(total) * BAR_WIDTH) / total
    };

    let mut bar = String::new();
    if filled > 0 {
        let body = "━".repeat(filled - 1);
        let head = if filled == BAR_WIDTH { "━" } else { ">" };
        bar.push_str(&palette.paint(Color::Green, format!("{}{}", body, head)));
    }
    bar.push_str(&" ".repeat(BAR_WIDTH - filled));

    format!(
        "{} [{}] {}/{}",
        palette.paint(Color::Cyan, "Processing URLs"),
        bar,
        done,
        total
    )
}
