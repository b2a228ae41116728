//! Helpers for classifying and routing external errors.

use clap::{Error as ClapError, error::ErrorKind};

/// Returns `true` when a [`clap::Error`] corresponds to `--help` or
/// `--version`.
///
/// The flags source surfaces these as [`LoadError::CliParsing`]; entry points
/// can check for them and call [`clap::Error::exit`] to keep the zero exit
/// status.
///
/// [`LoadError::CliParsing`]: crate::LoadError::CliParsing
#[must_use]
pub fn is_display_request(err: &ClapError) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}
