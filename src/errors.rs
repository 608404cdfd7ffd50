/*!
 * Error types for the capstrip application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors raised when a document, override tree or color string does not
/// match the expected grammar. Fatal to the operation that triggered it:
/// the caller aborts and applies nothing.
#[derive(Error, Debug)]
pub enum FormatError {
    /// A document block is structurally broken
    #[error("malformed block near line {line}: {detail}")]
    BadBlock {
        /// 1-based line number of the offending line
        line: usize,
        /// What was wrong with the block
        detail: String,
    },

    /// A time-range line could not be parsed
    #[error("bad time format at line {line}: {text}")]
    BadTimeRange {
        /// 1-based line number of the time-range line
        line: usize,
        /// The offending line
        text: String,
    },

    /// An SRT timestamp is not HH:MM:SS,mmm
    #[error("invalid timestamp: {0}")]
    BadTimestamp(String),

    /// A `JSON:` trailing annotation failed to parse
    #[error("invalid JSON override at line {line}: {source}")]
    BadOverride {
        /// 1-based line number of the time-range line carrying the override
        line: usize,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// A hex color string is not #RGB, #RGBA, #RRGGBB or #RRGGBBAA
    #[error("invalid hex color: {0}")]
    BadColor(String),
}

/// A resource (rendered image, preset file) that was expected on disk is
/// absent. Recovered locally: the caller skips the item with a warning.
#[derive(Error, Debug)]
#[error("missing resource: {0}")]
pub struct MissingResourceError(pub String);

/// Errors from the external renderer process lifecycle
#[derive(Error, Debug)]
pub enum RenderProcessError {
    /// A job was requested while another one is still running
    #[error("a render job is already in flight")]
    AlreadyRunning,

    /// The job preconditions were not met
    #[error("cannot launch render job: {0}")]
    Precondition(String),

    /// The renderer process could not be started
    #[error("failed to launch renderer '{program}': {detail}")]
    LaunchFailed {
        /// The renderer executable that was invoked
        program: String,
        /// Underlying failure
        detail: String,
    },

    /// The renderer exited with a non-zero status
    #[error("renderer exited with status {code}: {diagnostics}")]
    ExitedWithFailure {
        /// Exit code reported by the process (-1 when killed by signal)
        code: i32,
        /// Captured stderr text
        diagnostics: String,
    },
}

/// Errors rejecting a preset name before any file-system mutation
#[derive(Error, Debug)]
pub enum NameConflictError {
    /// The preset name is already registered in this scope
    #[error("preset '{0}' already exists")]
    AlreadyExists(String),

    /// The proposed name cannot be used as a file name
    #[error("invalid preset name: '{0}'")]
    InvalidName(String),

    /// The default preset cannot be deleted or renamed
    #[error("the 'default' preset is protected")]
    ProtectedPreset,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from document or color parsing
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Error from a missing on-disk resource
    #[error("Missing resource: {0}")]
    MissingResource(#[from] MissingResourceError),

    /// Error from the external renderer
    #[error("Render error: {0}")]
    Render(#[from] RenderProcessError),

    /// Error from preset naming
    #[error("Preset error: {0}")]
    NameConflict(#[from] NameConflictError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
