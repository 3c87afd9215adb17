//! Identifiers embedded in virtual-tree paths.
//!
//! Each extractor returns `None` when the path does not carry that kind of
//! identifier, including when the path is not recognized at all.

use crate::grammar::{is_scan_key, try_classify, PathKind};

/// Returns the scan key (`"1.1"`) of a path below the root.
#[must_use]
pub fn scan_key(path: &str) -> Option<&str> {
    let first = path.strip_prefix('/')?.split('/').next()?;
    is_scan_key(first).then_some(first)
}

/// Returns the MCA analyser index of a path below a `mca_<i>` group.
#[must_use]
pub fn mca_index(path: &str) -> Option<usize> {
    try_classify(path)?.mca_index
}

/// Returns the motor name of a `positioners/<motor>` dataset.
#[must_use]
pub fn motor_name(path: &str) -> Option<&str> {
    let found = try_classify(path)?;
    (found.kind == PathKind::Positioner).then_some(found.name?)
}

/// Returns the column label of a `measurement/<label>` dataset.
///
/// `mca_<i>` names are reserved for analyser groups and never returned.
#[must_use]
pub fn column_label(path: &str) -> Option<&str> {
    let found = try_classify(path)?;
    (found.kind == PathKind::MeasurementColumn).then_some(found.name?)
}
