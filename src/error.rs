//! Error types for the faxtiff library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for faxtiff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during conversion.
///
/// Every failure is fatal to the batch: there is no partial-success
/// mode and nothing is retried. Each variant maps to a distinct
/// process exit code (see [`Error::exit_code`]) so callers can tell
/// bad input, bad environment, and bad output target apart.
#[derive(Error, Debug)]
pub enum Error {
    /// Conversion options are invalid (non-finite or non-positive DPI).
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The source path does not resolve to a readable file.
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    /// The source is not a PDF or is structurally invalid.
    #[error("unsupported or malformed source: {0}")]
    MalformedSource(String),

    /// The source requires a protection scheme that is not supported.
    #[error("unsupported document security: {0}")]
    UnsupportedSecurity(String),

    /// Generic I/O failure while reading the source document.
    #[error("error reading source document: {0}")]
    SourceIo(String),

    /// The Group 4 codec is unavailable or broken in this build.
    #[error("required codec unavailable: {0}")]
    CapabilityMissing(String),

    /// Per-page resolution metadata could not be built.
    #[error("failed to build page metadata: {0}")]
    Metadata(String),

    /// I/O failure creating, writing, or finalizing the output container.
    #[error("output I/O error: {0}")]
    Io(#[from] io::Error),

    /// The page image could not be encoded into the container.
    #[error("encoding error: {0}")]
    Encode(String),

    /// A page has non-positive natural dimensions.
    #[error("degenerate page size {width}x{height}")]
    DegeneratePage {
        /// Natural width at unit scale.
        width: f64,
        /// Natural height at unit scale.
        height: f64,
    },

    /// Rasterization of a page failed.
    #[error("failed to rasterize page {page}: {reason}")]
    Rasterize {
        /// Zero-based page index.
        page: u32,
        /// Backend failure description.
        reason: String,
    },
}

impl Error {
    /// Process exit code for this error.
    ///
    /// One code per taxonomy bucket; 2 matches clap's usage-error
    /// convention, 1 is left for unclassified panics.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidOptions(_) => 2,
            Error::InputNotFound(_) => 3,
            Error::MalformedSource(_) => 4,
            Error::UnsupportedSecurity(_) => 5,
            Error::SourceIo(_) => 6,
            Error::CapabilityMissing(_) => 7,
            Error::Metadata(_) => 8,
            Error::Io(_) | Error::Encode(_) => 9,
            Error::DegeneratePage { .. } => 10,
            Error::Rasterize { .. } => 11,
        }
    }
}
