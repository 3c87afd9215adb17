//! Error types for spech5-core.

use thiserror::Error;

/// Result type alias for spech5 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the virtual tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Path matches no category of the grammar.
    #[error("unrecognized group or dataset: {0}")]
    UnrecognizedPath(String),

    /// Key resolves outside the group it was requested from.
    #[error("{key} is not a child of {group}")]
    KeyNotInScope { key: String, group: String },

    /// Path classified as a dataset with no materializer case.
    #[error("name {0} does not match any known dataset")]
    UnknownDatasetPath(String),

    /// Number of MCA spectra is not a multiple of the number of data lines.
    #[error(
        "scan {scan}: {spectra} MCA spectra cannot be split over {data_lines} data lines"
    )]
    InconsistentMcaLayout {
        scan: String,
        spectra: usize,
        data_lines: usize,
    },

    /// Spectra of one analyser do not share a channel count.
    #[error("scan {scan}: MCA spectrum has {found} channels, expected {expected}")]
    McaShapeMismatch {
        scan: String,
        expected: usize,
        found: usize,
    },

    /// Date in neither of the supported layouts.
    #[error("date format not recognized: {0}")]
    DateFormat(String),

    /// Header line with unexpected content.
    #[error("malformed #{key} header line: {line:?}")]
    MalformedHeader { key: String, line: String },

    /// Header line absent from both the scan and the file header.
    #[error("scan {scan}: no #{key} header line")]
    MissingHeader { key: String, scan: String },

    /// Source dtype outside the int/float/string convention.
    #[error("unexpected data type {0} (expected int-, string- or float-like data)")]
    UnsupportedDtype(&'static str),

    /// Scan key absent from the backing file.
    #[error("scan key {scan} does not exist in {filename}")]
    ScanNotFound { scan: String, filename: String },

    /// Well-formed path naming an analyser, motor, column or timing value
    /// the scan does not have.
    #[error("{0} does not exist")]
    MemberNotFound(String),
}
