//! Colored status lines and the phase progress listener.

use std::fmt::Display;
use std::time::Duration;

use colored::Colorize;
use hoist_host::{Phase, PhaseError, PhaseListener};

pub fn info(msg: impl Display) {
    println!("{} {msg}", "[INFO]".blue().bold());
}

pub fn ok(msg: impl Display) {
    println!("{} {msg}", "[OK]".green().bold());
}

pub fn warn(msg: impl Display) {
    eprintln!("{} {msg}", "[WARN]".yellow().bold());
}

/// Final line of a failed run, with the full cause chain.
pub fn fatal(err: &anyhow::Error) {
    eprintln!("{} {err:#}", "[FATAL]".red().bold());
}

/// Prints a start/end marker for every phase.
pub struct Progress {
    total: usize,
    index: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self { total, index: 0 }
    }
}

impl PhaseListener for Progress {
    fn started(&mut self, phase: Phase) {
        self.index += 1;
        println!(
            "{} [{}/{}] {}",
            "==>".cyan().bold(),
            self.index,
            self.total,
            phase.title().bold()
        );
    }

    fn skipped(&mut self, phase: Phase) {
        println!("{} {phase}: already complete", "[SKIP]".dimmed());
    }

    fn completed(&mut self, phase: Phase, elapsed: Duration) {
        ok(format!("{phase} ({:.1}s)", elapsed.as_secs_f64()));
    }

    fn failed(&mut self, phase: Phase, error: &PhaseError) {
        eprintln!("{} {phase}: {error}", "[FAIL]".red().bold());
    }
}
