//! Backing store contract.
//!
//! The virtual tree reads everything it exposes through these two traits.
//! `spech5-specfile` implements them over parsed SPEC files and
//! [`crate::memory`] over in-memory values.

use crate::dataset::RawData;
use crate::mca::{self, McaTiming};
use crate::Result;
use ndarray::ArrayView2;

/// A file holding an ordered sequence of scans.
pub trait ScanFile: Send + Sync {
    /// Name of the backing file, as given when it was opened.
    fn filename(&self) -> &str;

    /// Scan keys in file order.
    fn scan_keys(&self) -> Vec<String>;

    /// Looks up a scan by key.
    fn scan(&self, key: &str) -> Option<&dyn ScanRecord>;

    /// Returns true if the file has a scan with this key.
    fn contains_scan(&self, key: &str) -> bool {
        self.scan(key).is_some()
    }
}

/// One scan of a [`ScanFile`].
pub trait ScanRecord: Send + Sync {
    /// Scan key (`"<number>.<order>"`).
    fn key(&self) -> &str;

    /// Value of a `#<key>` line of the scan header.
    fn scan_header(&self, key: &str) -> Option<&str>;

    /// Value of a `#<key>` line of the file header the scan belongs to.
    fn file_header(&self, key: &str) -> Option<&str>;

    /// Data matrix, one row per data line.
    fn data(&self) -> ArrayView2<'_, f64>;

    /// Column labels, one per data column.
    fn labels(&self) -> &[String];

    /// Motor names from the file header.
    fn motor_names(&self) -> &[String];

    /// Static position of a motor.
    ///
    /// Returns `None` if `name` is not a motor of the file and
    /// `Some(f64::INFINITY)` if it is a motor without a recorded position.
    fn motor_position_by_name(&self, name: &str) -> Option<f64>;

    /// Raw, interleaved MCA spectra.
    fn mca_spectra(&self) -> &[Vec<f64>];

    /// Value of a `#@<key>` line.
    fn mca_header(&self, key: &str) -> Option<&str>;

    /// A data column by label.
    fn data_column_by_name(&self, label: &str) -> Option<RawData> {
        let index = self.labels().iter().position(|l| l == label)?;
        column_from_matrix(self.data(), index)
    }

    /// Number of data lines.
    fn data_lines(&self) -> usize {
        self.data().nrows()
    }

    /// Number of MCA analysers.
    ///
    /// # Errors
    /// Returns [`crate::Error::InconsistentMcaLayout`] if the spectra do not
    /// split evenly over the data lines.
    fn analyser_count(&self) -> Result<usize> {
        mca::analyser_count(self.key(), self.mca_spectra().len(), self.data_lines())
    }

    /// MCA calibration, `[0, 1, 0]` without a `#@CALIB` line.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] for a bad `#@CALIB` line.
    fn mca_calibration(&self) -> Result<[f64; 3]> {
        mca::parse_calibration(self.mca_header("CALIB"))
    }

    /// MCA channel numbers.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] for a bad `#@CHANN` line.
    fn mca_channels(&self) -> Result<Vec<f64>> {
        mca::parse_channels(self.mca_header("CHANN"), self.mca_spectra())
    }

    /// MCA timing, `None` without a `#@CTIME` line.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] for a bad `#@CTIME` line.
    fn mca_timing(&self) -> Result<Option<McaTiming>> {
        self.mca_header("CTIME").map(mca::parse_ctime).transpose()
    }
}

/// Copies column `index` of a data matrix as float64 data.
#[must_use]
pub fn column_from_matrix(data: ArrayView2<'_, f64>, index: usize) -> Option<RawData> {
    (index < data.ncols()).then(|| RawData::from(data.column(index).to_owned()))
}
