//! spech5-specfile: SPEC data file parser.
//!
//! Reads the line-oriented SPEC text format into scans that implement the
//! [`spech5_core::ScanRecord`] contract.
//!
//! # Key Components
//!
//! - [`SpecParser`] - Two-phase parser configured by [`ParserConfig`]
//! - [`SpecFile`] - Parsed file, a [`spech5_core::ScanFile`]
//! - [`Scan`] - One parsed scan
//!
//! # Processing Pipeline
//!
//! 1. **Phase 1 (Sequential)**: Discover scan sections, number scans, bind
//!    file headers
//! 2. **Phase 2 (Parallel)**: Parse sections into scans

pub mod error;
pub mod parser;
mod scan;
pub mod section;

pub use error::{Error, Result};
pub use parser::{ParserConfig, SpecParser};
pub use scan::Scan;
pub use section::FileHeader;

use spech5_core::{ScanFile, ScanRecord};
use std::collections::HashMap;

/// A parsed SPEC file.
#[derive(Clone, Debug)]
pub struct SpecFile {
    filename: String,
    scans: Vec<Scan>,
    index: HashMap<String, usize>,
}

impl SpecFile {
    /// Parses SPEC text with the default configuration.
    ///
    /// # Errors
    /// See [`SpecParser::parse`].
    pub fn parse(filename: &str, text: &str) -> Result<Self> {
        SpecParser::new().parse(filename, text)
    }

    pub(crate) fn from_scans(filename: &str, scans: Vec<Scan>) -> Self {
        let index = scans
            .iter()
            .enumerate()
            .map(|(i, scan)| (scan.key.clone(), i))
            .collect();
        Self {
            filename: filename.to_string(),
            scans,
            index,
        }
    }

    /// All scans in file order.
    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    /// Looks up a parsed scan by key.
    pub fn get(&self, key: &str) -> Option<&Scan> {
        self.index.get(key).map(|&i| &self.scans[i])
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}

impl ScanFile for SpecFile {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn scan_keys(&self) -> Vec<String> {
        self.scans.iter().map(|s| s.key.clone()).collect()
    }

    fn scan(&self, key: &str) -> Option<&dyn ScanRecord> {
        self.get(key).map(|s| s as &dyn ScanRecord)
    }

    fn contains_scan(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }
}
