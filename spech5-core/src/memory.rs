//! In-memory backing store.
//!
//! Builds scans from plain values, for tests and for callers that already
//! hold their data in memory.
//!
//! ```
//! use ndarray::array;
//! use spech5_core::memory::{MemoryFile, MemoryScan};
//! use spech5_core::ScanFile;
//!
//! let file = MemoryFile::new("demo.dat").with_scan(
//!     MemoryScan::new("1.1")
//!         .with_header("S", "1 ascan x 0 1 1 0.1")
//!         .with_columns(&["x", "I0"], array![[0.0, 10.0], [1.0, 12.0]]),
//! );
//! assert_eq!(file.scan_keys(), vec!["1.1".to_string()]);
//! ```

use crate::dataset::RawData;
use crate::source::{column_from_matrix, ScanFile, ScanRecord};
use ndarray::{Array2, ArrayView2};
use std::collections::HashMap;

/// A scan held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryScan {
    key: String,
    header: HashMap<String, String>,
    file_header: HashMap<String, String>,
    labels: Vec<String>,
    data: Array2<f64>,
    overrides: HashMap<String, RawData>,
    motors: Vec<(String, Option<f64>)>,
    motor_names: Vec<String>,
    mca: Vec<Vec<f64>>,
    mca_header: HashMap<String, String>,
}

impl MemoryScan {
    /// Creates an empty scan.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: Array2::zeros((0, 0)),
            ..Self::default()
        }
    }

    /// Sets a scan header line (`S`, `D`, ...).
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.header.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets a line of the file header the scan belongs to.
    #[must_use]
    pub fn with_file_header(mut self, key: &str, value: &str) -> Self {
        self.file_header.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the column labels and the data matrix.
    #[must_use]
    pub fn with_columns(mut self, labels: &[&str], data: Array2<f64>) -> Self {
        self.labels = labels.iter().map(ToString::to_string).collect();
        self.data = data;
        self
    }

    /// Replaces what a column label reads as, with data of any type.
    #[must_use]
    pub fn with_column_data(mut self, label: &str, data: RawData) -> Self {
        self.overrides.insert(label.to_string(), data);
        self
    }

    /// Sets the motors; `None` marks a motor without a recorded position.
    #[must_use]
    pub fn with_motors(mut self, motors: &[(&str, Option<f64>)]) -> Self {
        self.motors = motors
            .iter()
            .map(|(name, position)| ((*name).to_string(), *position))
            .collect();
        self.motor_names = self.motors.iter().map(|(name, _)| name.clone()).collect();
        self
    }

    /// Sets the raw, interleaved MCA spectra.
    #[must_use]
    pub fn with_mca(mut self, spectra: Vec<Vec<f64>>) -> Self {
        self.mca = spectra;
        self
    }

    /// Sets a `#@<key>` line.
    #[must_use]
    pub fn with_mca_header(mut self, key: &str, value: &str) -> Self {
        self.mca_header.insert(key.to_string(), value.to_string());
        self
    }
}

impl ScanRecord for MemoryScan {
    fn key(&self) -> &str {
        &self.key
    }

    fn scan_header(&self, key: &str) -> Option<&str> {
        self.header.get(key).map(String::as_str)
    }

    fn file_header(&self, key: &str) -> Option<&str> {
        self.file_header.get(key).map(String::as_str)
    }

    fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn motor_names(&self) -> &[String] {
        &self.motor_names
    }

    fn motor_position_by_name(&self, name: &str) -> Option<f64> {
        self.motors
            .iter()
            .find(|(motor, _)| motor == name)
            .map(|(_, position)| position.unwrap_or(f64::INFINITY))
    }

    fn mca_spectra(&self) -> &[Vec<f64>] {
        &self.mca
    }

    fn mca_header(&self, key: &str) -> Option<&str> {
        self.mca_header.get(key).map(String::as_str)
    }

    fn data_column_by_name(&self, label: &str) -> Option<RawData> {
        if let Some(data) = self.overrides.get(label) {
            return Some(data.clone());
        }
        let index = self.labels.iter().position(|l| l == label)?;
        column_from_matrix(self.data.view(), index)
    }
}

/// A file of in-memory scans.
#[derive(Debug, Clone, Default)]
pub struct MemoryFile {
    filename: String,
    scans: Vec<MemoryScan>,
}

impl MemoryFile {
    /// Creates a file without scans.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            scans: Vec::new(),
        }
    }

    /// Appends a scan.
    #[must_use]
    pub fn with_scan(mut self, scan: MemoryScan) -> Self {
        self.scans.push(scan);
        self
    }
}

impl ScanFile for MemoryFile {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn scan_keys(&self) -> Vec<String> {
        self.scans.iter().map(|s| s.key.clone()).collect()
    }

    fn scan(&self, key: &str) -> Option<&dyn ScanRecord> {
        self.scans
            .iter()
            .find(|s| s.key == key)
            .map(|s| s as &dyn ScanRecord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn scan() -> MemoryScan {
        MemoryScan::new("3.1")
            .with_header("S", "3 ascan x 0 1 1 0.1")
            .with_file_header("D", "Thu Feb 11 09:54:35 2016")
            .with_columns(&["x", "det"], array![[0.0, 5.0], [1.0, 7.0]])
            .with_motors(&[("x", Some(0.5)), ("slit", None)])
    }

    #[test]
    fn test_headers() {
        let scan = scan();
        assert_eq!(scan.scan_header("S"), Some("3 ascan x 0 1 1 0.1"));
        assert_eq!(scan.scan_header("D"), None);
        assert_eq!(scan.file_header("D"), Some("Thu Feb 11 09:54:35 2016"));
    }

    #[test]
    fn test_columns() {
        let scan = scan();
        assert_eq!(scan.data_lines(), 2);
        assert_eq!(
            scan.data_column_by_name("det"),
            Some(RawData::from(array![5.0, 7.0]))
        );
        assert_eq!(scan.data_column_by_name("missing"), None);

        let scan = scan.with_column_data("det", RawData::from("text"));
        assert_eq!(scan.data_column_by_name("det"), Some(RawData::from("text")));
    }

    #[test]
    fn test_motor_positions() {
        let scan = scan();
        assert_eq!(scan.motor_names(), &["x".to_string(), "slit".to_string()]);
        assert_eq!(scan.motor_position_by_name("x"), Some(0.5));
        assert_eq!(scan.motor_position_by_name("slit"), Some(f64::INFINITY));
        assert_eq!(scan.motor_position_by_name("nope"), None);
    }

    #[test]
    fn test_mca_defaults() {
        let scan = scan().with_mca(vec![vec![1.0, 2.0, 3.0]; 4]);
        assert_eq!(scan.analyser_count().unwrap(), 2);
        assert_eq!(scan.mca_calibration().unwrap(), [0.0, 1.0, 0.0]);
        assert_eq!(scan.mca_channels().unwrap(), vec![0.0, 1.0, 2.0]);
        assert_eq!(scan.mca_timing().unwrap(), None);

        let scan = scan.with_mca_header("CTIME", "1 2 3");
        assert!(scan.mca_timing().unwrap().is_some());
    }

    #[test]
    fn test_file_lookup() {
        let file = MemoryFile::new("f.dat").with_scan(scan());
        assert_eq!(file.filename(), "f.dat");
        assert!(file.contains_scan("3.1"));
        assert!(!file.contains_scan("1.1"));
        assert_eq!(file.scan("3.1").map(|s| s.key()), Some("3.1"));
    }
}
