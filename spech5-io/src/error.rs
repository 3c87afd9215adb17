//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SpecFile parsing error.
    #[error("parse error: {0}")]
    ParseError(#[from] spech5_specfile::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] spech5_core::Error),
}
