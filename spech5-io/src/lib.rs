//! spech5-io: HDF5-like access to SPEC files.
//!
//! This crate memory-maps SPEC files (via memmap2), parses them and
//! exposes their scans as a tree of groups, datasets and links:
//!
//! ```text
//! /1.1/title
//! /1.1/start_time
//! /1.1/instrument/positioners/<motor>
//! /1.1/instrument/mca_0/{data, calibration, channels, ...}
//! /1.1/measurement/<column>
//! /1.1/measurement/mca_0/{data, info}      (links into instrument/mca_0)
//! ```
//!

mod error;
mod group;
mod materialize;
mod reader;
mod root;

pub use error::{Error, Result};
pub use group::{Entry, Group};
pub use reader::{MappedFileReader, SpecFileReader};
pub use root::{SpecH5, ViewConfig};
