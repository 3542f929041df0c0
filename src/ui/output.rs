//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! All user-visible output flows through [`IoStreams`] so commands and
//! service clients never print directly. Debug lines go to stderr and are
//! only shown with `--verbose`; warnings and errors are always shown.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Normal mode - standard output
    Normal,
    /// Verbose mode - include debug output
    Verbose,
}

impl Verbosity {
    /// Create verbosity from the global `--verbose` flag.
    pub fn from_flag(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Output streams handed to commands and service clients.
#[derive(Debug, Clone, Copy)]
pub struct IoStreams {
    verbosity: Verbosity,
}

impl IoStreams {
    /// Create streams with the given verbosity.
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// True when debug output is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Print a message to stdout.
    pub fn print(&self, message: impl Display) {
        println!("{}", message);
    }

    /// Print a secondary section line, used by multi-step flows.
    pub fn section(&self, message: impl Display) {
        println!("\n{}", message);
    }

    /// Print a debug message (only with --verbose).
    pub fn debug(&self, message: impl Display) {
        if self.is_verbose() {
            eprintln!("[debug] {}", message);
        }
    }

    /// Print a warning message (always shown).
    pub fn warn(&self, message: impl Display) {
        eprintln!("warning: {}", message);
    }

    /// Print an error message (always shown).
    pub fn error(&self, message: impl Display) {
        eprintln!("error: {}", message);
    }

    /// Ask a yes/no question, defaulting to no.
    pub fn confirm(&self, prompt: impl Display) -> std::io::Result<bool> {
        print!("{} (y/N) ", prompt);
        std::io::Write::flush(&mut std::io::stdout())?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
    }

    /// Ask for a line of input.
    pub fn prompt(&self, prompt: impl Display) -> std::io::Result<String> {
        print!("{} ", prompt);
        std::io::Write::flush(&mut std::io::stdout())?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }
}

impl Default for IoStreams {
    fn default() -> Self {
        Self::new(Verbosity::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_flag() {
        assert_eq!(Verbosity::from_flag(false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flag(true), Verbosity::Verbose);
    }

    #[test]
    fn verbose_streams_report_verbose() {
        assert!(IoStreams::new(Verbosity::Verbose).is_verbose());
        assert!(!IoStreams::default().is_verbose());
    }
}
