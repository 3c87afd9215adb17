//! spech5-core: Path grammar, dataset values and backing-store traits.
//!
//! This crate provides the pieces of the HDF5-like view over SPEC files
//! that do not depend on how the scans are read: path classification,
//! attributes, identifier extraction, dtype coercion, date normalization
//! and MCA de-multiplexing.
//!

pub mod attrs;
pub mod dataset;
pub mod date;
pub mod error;
pub mod grammar;
pub mod mca;
pub mod memory;
pub mod names;
pub mod source;

pub use attrs::{attributes_for, attributes_of, Attrs};
pub use dataset::{DType, Dataset, Payload, RawData};
pub use date::spec_date_to_iso8601;
pub use error::{Error, Result};
pub use grammar::{classify, PathClass, PathKind, PathMatch};
pub use mca::{McaTiming, DEFAULT_CALIBRATION};
pub use memory::{MemoryFile, MemoryScan};
pub use source::{ScanFile, ScanRecord};
