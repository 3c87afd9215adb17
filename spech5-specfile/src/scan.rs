//! Parsed scans.

use crate::section::FileHeader;
use ndarray::{Array2, ArrayView2};
use spech5_core::ScanRecord;
use std::sync::Arc;

/// One parsed scan.
#[derive(Clone, Debug)]
pub struct Scan {
    pub(crate) key: String,
    pub(crate) header: Vec<(String, String)>,
    pub(crate) file_header: Arc<FileHeader>,
    pub(crate) labels: Vec<String>,
    pub(crate) data: Array2<f64>,
    pub(crate) positions: Vec<f64>,
    pub(crate) mca: Vec<Vec<f64>>,
    pub(crate) mca_header: Vec<(String, String)>,
}

impl Scan {
    /// Scan number, the part of the key before the dot.
    pub fn number(&self) -> &str {
        self.key.split('.').next().unwrap_or_default()
    }

    /// Motor positions of the `#P<n>` lines, in `n` order.
    pub fn motor_positions(&self) -> &[f64] {
        &self.positions
    }

    /// The file header the scan belongs to.
    pub fn file_header_block(&self) -> &FileHeader {
        &self.file_header
    }
}

fn lookup<'a>(entries: &'a [(String, String)], key: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

impl ScanRecord for Scan {
    fn key(&self) -> &str {
        &self.key
    }

    fn scan_header(&self, key: &str) -> Option<&str> {
        lookup(&self.header, key)
    }

    fn file_header(&self, key: &str) -> Option<&str> {
        self.file_header.get(key)
    }

    fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn motor_names(&self) -> &[String] {
        self.file_header.motor_names()
    }

    fn motor_position_by_name(&self, name: &str) -> Option<f64> {
        let index = self.motor_names().iter().position(|m| m == name)?;
        Some(self.positions.get(index).copied().unwrap_or(f64::INFINITY))
    }

    fn mca_spectra(&self) -> &[Vec<f64>] {
        &self.mca
    }

    fn mca_header(&self, key: &str) -> Option<&str> {
        lookup(&self.mca_header, key)
    }
}
