//! Dataset synthesis.
//!
//! Nothing is cached: each call re-reads the backing store.

use crate::root::SpecH5;
use spech5_core::grammar::{classify, PathKind, PathMatch};
use spech5_core::mca::demultiplex;
use spech5_core::names::{column_label, mca_index, motor_name};
use spech5_core::{spec_date_to_iso8601, Dataset, Error, RawData, Result, ScanRecord};

/// Builds the dataset at a classified dataset or link-to-dataset path.
///
/// Links read their target and keep their own name.
pub(crate) fn materialize(file: &SpecH5, found: &PathMatch<'_>) -> Result<Dataset> {
    match found.link_target() {
        Some(target) => {
            let target = classify(&target)?;
            let raw = raw_value(file, &target)?;
            Dataset::link(found.path, raw)
        }
        None => Dataset::new(found.path, raw_value(file, found)?),
    }
}

fn raw_value(file: &SpecH5, found: &PathMatch<'_>) -> Result<RawData> {
    let path = found.path;
    let scan_key = found
        .scan_key
        .ok_or_else(|| Error::UnknownDatasetPath(path.to_string()))?;
    let scan = file.scan_record(scan_key)?;

    match found.kind {
        PathKind::Title => header(scan, "S").map(RawData::from),
        PathKind::StartTime => {
            let date = match scan.scan_header("D") {
                Some(date) => date,
                None => {
                    log::warn!("scan {scan_key}: no #D line in scan header, trying file header");
                    scan.file_header("D").ok_or_else(|| Error::MissingHeader {
                        key: "D".to_string(),
                        scan: scan_key.to_string(),
                    })?
                }
            };
            spec_date_to_iso8601(date, file.config().time_zone.as_deref()).map(RawData::from)
        }
        PathKind::Positioner => {
            let motor = motor_name(path).ok_or_else(|| not_found(path))?;
            // A motor recorded as a data column reads as that column.
            if scan.labels().iter().any(|label| label == motor) {
                scan.data_column_by_name(motor).ok_or_else(|| not_found(path))
            } else {
                scan.motor_position_by_name(motor)
                    .map(RawData::from)
                    .ok_or_else(|| not_found(path))
            }
        }
        PathKind::MeasurementColumn => {
            let label = column_label(path).ok_or_else(|| not_found(path))?;
            scan.data_column_by_name(label).ok_or_else(|| not_found(path))
        }
        PathKind::McaData => {
            let analyser = mca_index(path).ok_or_else(|| not_found(path))?;
            demultiplex(scan_key, scan.mca_spectra(), scan.data_lines(), analyser)
                .map(RawData::from)
        }
        PathKind::McaCalibration => scan.mca_calibration().map(RawData::from),
        PathKind::McaChannels => scan.mca_channels().map(RawData::from),
        PathKind::McaPresetTime | PathKind::McaLiveTime | PathKind::McaElapsedTime => {
            let timing = scan.mca_timing()?.ok_or_else(|| not_found(path))?;
            let value = match found.kind {
                PathKind::McaPresetTime => timing.preset_time,
                PathKind::McaLiveTime => timing.live_time,
                _ => timing.elapsed_time,
            };
            Ok(RawData::from(value))
        }
        _ => Err(Error::UnknownDatasetPath(path.to_string())),
    }
}

fn header<'s>(scan: &'s dyn ScanRecord, key: &str) -> Result<&'s str> {
    scan.scan_header(key).ok_or_else(|| Error::MissingHeader {
        key: key.to_string(),
        scan: scan.key().to_string(),
    })
}

fn not_found(path: &str) -> Error {
    Error::MemberNotFound(path.to_string())
}
