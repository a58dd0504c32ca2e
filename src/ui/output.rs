//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Diagnostics never go to stdout: `publish` keeps stdout clean so it can
//! run inside scripts and CI steps. Debug output appears only with
//! `--verbose`, informational listings are dropped with `--quiet`, and
//! errors always print.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet mode - errors only
    Quiet,
    /// Normal mode - errors and informational output
    #[default]
    Normal,
    /// Verbose mode - every step and git command
    Verbose,
}

impl Verbosity {
    /// Create verbosity from flags.
    ///
    /// # Example
    ///
    /// ```
    /// use refpages::ui::output::Verbosity;
    ///
    /// assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
    /// assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
    /// ```
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Whether debug diagnostics are shown.
    pub fn is_verbose(&self) -> bool {
        *self == Verbosity::Verbose
    }
}

/// Print a line to stdout (respects quiet mode).
///
/// Used by the informational commands (`config list`), never by `publish`.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in verbose mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Verbose {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert!(Verbosity::from_flags(false, true).is_verbose());
        assert!(!Verbosity::default().is_verbose());
    }
}
