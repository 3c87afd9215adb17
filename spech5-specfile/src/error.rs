//! SpecFile parsing error types.

use thiserror::Error;

/// Result type for SpecFile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SpecFile parsing error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// `#S` line without a scan number.
    #[error("line {line}: invalid #S line {text:?}")]
    InvalidScanLine { line: usize, text: String },

    /// Token that is not a number where one is expected.
    #[error("line {line}: invalid number {token:?}")]
    InvalidNumber { line: usize, token: String },

    /// Data rows of one scan with different widths.
    #[error("scan {scan}, line {line}: data row has {found} values, expected {expected}")]
    RaggedData {
        scan: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Data width that does not match the `#L` labels.
    #[error("scan {scan}: {labels} column labels for {columns} data columns")]
    LabelMismatch {
        scan: String,
        labels: usize,
        columns: usize,
    },
}
