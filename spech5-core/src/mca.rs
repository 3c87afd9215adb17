//! Multichannel analyser layout.
//!
//! A scan records one spectrum per data line for every analyser. With
//! several analysers the spectra are interleaved: for 3 analysers, the
//! spectra of analyser 0 are `mca[0], mca[3], mca[6], …`.

use crate::{Error, Result};
use ndarray::{Array2, ArrayView1};

/// Calibration used when a scan has no `#@CALIB` line.
pub const DEFAULT_CALIBRATION: [f64; 3] = [0.0, 1.0, 0.0];

/// Returns the number of analysers recorded in a scan.
///
/// # Errors
/// Returns [`Error::InconsistentMcaLayout`] if `spectra` is not a multiple
/// of `data_lines`.
pub fn analyser_count(scan: &str, spectra: usize, data_lines: usize) -> Result<usize> {
    if data_lines == 0 {
        return if spectra == 0 {
            Ok(0)
        } else {
            Err(inconsistent(scan, spectra, data_lines))
        };
    }
    if !spectra.is_multiple_of(data_lines) {
        return Err(inconsistent(scan, spectra, data_lines));
    }
    Ok(spectra / data_lines)
}

fn inconsistent(scan: &str, spectra: usize, data_lines: usize) -> Error {
    Error::InconsistentMcaLayout {
        scan: scan.to_string(),
        spectra,
        data_lines,
    }
}

/// Gathers the spectra of one analyser into a 2D array
/// (rows = data lines, columns = channels).
///
/// # Errors
/// Returns [`Error::InconsistentMcaLayout`] for a non-divisible layout,
/// [`Error::MemberNotFound`] if the analyser does not exist and
/// [`Error::McaShapeMismatch`] if its spectra differ in length.
pub fn demultiplex(
    scan: &str,
    spectra: &[Vec<f64>],
    data_lines: usize,
    analyser: usize,
) -> Result<Array2<f64>> {
    let analysers = analyser_count(scan, spectra.len(), data_lines)?;
    if analyser >= analysers {
        return Err(Error::MemberNotFound(format!(
            "MCA analyser {analyser} in scan {scan}"
        )));
    }

    let rows: Vec<&Vec<f64>> = spectra.iter().skip(analyser).step_by(analysers).collect();
    let channels = rows.first().map_or(0, |row| row.len());
    let mut out = Array2::<f64>::zeros((rows.len(), channels));
    for (mut dst, src) in out.rows_mut().into_iter().zip(&rows) {
        if src.len() != channels {
            return Err(Error::McaShapeMismatch {
                scan: scan.to_string(),
                expected: channels,
                found: src.len(),
            });
        }
        dst.assign(&ArrayView1::from(src.as_slice()));
    }
    Ok(out)
}

/// Parses the `#@CALIB a b c` value.
///
/// # Errors
/// Returns [`Error::MalformedHeader`] unless the line holds exactly 3 floats.
pub fn parse_calibration(line: Option<&str>) -> Result<[f64; 3]> {
    let Some(line) = line else {
        return Ok(DEFAULT_CALIBRATION);
    };
    let values = parse_floats("@CALIB", line)?;
    <[f64; 3]>::try_from(values).map_err(|_| malformed("@CALIB", line))
}

/// Returns the channel numbers of a scan's spectra.
///
/// With `#@CHANN n first last step` the channels run from `first` to `last`
/// by `step`; without it they are `0 .. len(first spectrum)`.
///
/// # Errors
/// Returns [`Error::MalformedHeader`] if the `#@CHANN` value cannot be read.
#[allow(clippy::cast_precision_loss)]
pub fn parse_channels(line: Option<&str>, spectra: &[Vec<f64>]) -> Result<Vec<f64>> {
    let Some(line) = line else {
        let len = spectra.first().map_or(0, Vec::len);
        return Ok((0..len).map(|c| c as f64).collect());
    };
    let fields: Vec<i64> = line
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| malformed("@CHANN", line))?;
    let (first, last, step) = match fields.as_slice() {
        [_, first, last] => (*first, *last, 1),
        [_, first, last, step] => (*first, *last, *step),
        _ => return Err(malformed("@CHANN", line)),
    };
    let step = usize::try_from(step)
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| malformed("@CHANN", line))?;
    Ok((first..=last).step_by(step).map(|c| c as f64).collect())
}

/// Timing values of the `#@CTIME` line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McaTiming {
    pub preset_time: f64,
    pub live_time: f64,
    pub elapsed_time: f64,
}

/// Parses `#@CTIME preset live elapsed`; the `@CTIME` word is optional.
///
/// # Errors
/// Returns [`Error::MalformedHeader`] unless exactly 3 floats follow.
pub fn parse_ctime(line: &str) -> Result<McaTiming> {
    let trimmed = line.trim_start();
    let values = trimmed
        .strip_prefix("@CTIME")
        .or_else(|| trimmed.strip_prefix("CTIME"))
        .unwrap_or(trimmed);
    match parse_floats("@CTIME", values)?.as_slice() {
        [preset_time, live_time, elapsed_time] => Ok(McaTiming {
            preset_time: *preset_time,
            live_time: *live_time,
            elapsed_time: *elapsed_time,
        }),
        _ => Err(malformed("@CTIME", line)),
    }
}

fn parse_floats(key: &str, line: &str) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|token| token.parse::<f64>().map_err(|_| malformed(key, line)))
        .collect()
}

fn malformed(key: &str, line: &str) -> Error {
    Error::MalformedHeader {
        key: key.to_string(),
        line: line.to_string(),
    }
}
