//! SpecFile text parser.

use crate::scan::Scan;
use crate::section::{
    discover_sections, numbered, split_header, split_labels, FileHeader, ScanSection,
};
use crate::{Error, Result, SpecFile};
use ndarray::Array2;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the SpecFile parser.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParserConfig {
    /// Whether to parse scans in parallel.
    pub parallel: bool,
    /// Minimum number of scans before parsing in parallel.
    pub parallel_threshold: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 16,
        }
    }
}

impl ParserConfig {
    /// Creates a new parser configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to use parallel parsing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the scan count above which parsing runs in parallel.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

/// SpecFile parser.
#[derive(Debug, Clone, Default)]
pub struct SpecParser {
    config: ParserConfig,
}

impl SpecParser {
    /// Creates a new parser with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new parser with the given configuration.
    #[must_use]
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parses the text of a SpecFile.
    ///
    /// # Errors
    /// Returns an error for a malformed `#S` line, an invalid number, ragged
    /// data rows or data that does not match its labels.
    pub fn parse(&self, filename: &str, text: &str) -> Result<SpecFile> {
        let layout = discover_sections(text)?;
        let headers: Vec<_> = layout.headers.into_iter().map(Arc::new).collect();
        log::debug!(
            "{filename}: {} scans, {} file headers",
            layout.sections.len(),
            headers.len()
        );

        let parse_one = |section: &ScanSection| {
            let header = Arc::clone(&headers[section.header_index]);
            parse_section(text, section, header)
        };
        let scans = if self.config.parallel && layout.sections.len() > self.config.parallel_threshold
        {
            layout
                .sections
                .par_iter()
                .map(parse_one)
                .collect::<Result<Vec<_>>>()?
        } else {
            layout
                .sections
                .iter()
                .map(parse_one)
                .collect::<Result<Vec<_>>>()?
        };

        Ok(SpecFile::from_scans(filename, scans))
    }
}

/// Parses one scan section.
///
/// This is designed to be called in parallel for different sections.
fn parse_section(text: &str, section: &ScanSection, file_header: Arc<FileHeader>) -> Result<Scan> {
    let key = section.key();
    let body = &text[section.start_offset..section.end_offset];

    let mut header = Vec::new();
    let mut mca_header = Vec::new();
    let mut labels = Vec::new();
    let mut position_lines: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut width: Option<usize> = None;
    let mut mca = Vec::new();
    let mut pending: Option<Vec<f64>> = None;

    for (index, raw) in body.lines().enumerate() {
        let line_no = section.first_line + index;
        let line = raw.trim_end();

        if let Some(mut spectrum) = pending.take() {
            let (values, continues) = strip_continuation(line);
            spectrum.extend(parse_numbers(line_no, values)?);
            if continues {
                pending = Some(spectrum);
            } else {
                mca.push(spectrum);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("#@") {
            let key_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let (mca_key, value) = rest.split_at(key_end);
            mca_header.push((mca_key.to_string(), value.trim().to_string()));
        } else if let Some((header_key, value)) = split_header(line) {
            if header_key == "L" {
                labels = split_labels(value);
            } else if let Some(n) = numbered(header_key, "P") {
                position_lines.insert(n, parse_numbers(line_no, value)?);
            }
            header.push((header_key.to_string(), value.to_string()));
        } else if let Some(values) = line.strip_prefix("@A") {
            let (values, continues) = strip_continuation(values);
            let spectrum = parse_numbers(line_no, values)?;
            if continues {
                pending = Some(spectrum);
            } else {
                mca.push(spectrum);
            }
        } else if line.starts_with('#') || line.starts_with('@') || line.is_empty() {
            continue;
        } else {
            let row = parse_numbers(line_no, line)?;
            match width {
                None => width = Some(row.len()),
                Some(expected) if expected != row.len() => {
                    return Err(Error::RaggedData {
                        scan: key,
                        line: line_no,
                        expected,
                        found: row.len(),
                    });
                }
                Some(_) => {}
            }
            rows.push(row);
        }
    }
    if let Some(spectrum) = pending {
        mca.push(spectrum);
    }

    let columns = width.unwrap_or(labels.len());
    if !rows.is_empty() && columns != labels.len() {
        return Err(Error::LabelMismatch {
            scan: key,
            labels: labels.len(),
            columns,
        });
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let data = Array2::from_shape_vec((rows.len(), columns), flat).map_err(|_| {
        Error::LabelMismatch {
            scan: key.clone(),
            labels: labels.len(),
            columns,
        }
    })?;

    Ok(Scan {
        key,
        header,
        file_header,
        labels,
        data,
        positions: position_lines.into_values().flatten().collect(),
        mca,
        mca_header,
    })
}

fn strip_continuation(line: &str) -> (&str, bool) {
    let line = line.trim_end();
    match line.strip_suffix('\\') {
        Some(values) => (values, true),
        None => (line, false),
    }
}

fn parse_numbers(line: usize, text: &str) -> Result<Vec<f64>> {
    text.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| Error::InvalidNumber {
                line,
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use spech5_core::{ScanFile, ScanRecord};

    const TEXT: &str = "#F demo.dat
#D Thu Feb 11 09:54:35 2016
#O0 Pslit HGap  MRTSlit UP
#O1 Slit Vert Gap

#S 1 ascan  Pslit HGap 0 1  2 0.1
#D Sat 2015/03/14 03:53:50
#P0 0.5 1.5
#L Pslit HGap  det
#@MCA 16C
#@CHANN 3 0 2 1
#@CALIB 1 2 3
#@CTIME 10 9.5 11
@A 1 2 3
0 10
@A 4 5 \\
6
1 20
";

    fn parse(text: &str) -> SpecFile {
        SpecParser::new().parse("demo.dat", text).unwrap()
    }

    #[test]
    fn test_scan_headers() {
        let file = parse(TEXT);
        let scan = file.scan("1.1").unwrap();
        assert_eq!(scan.scan_header("S"), Some("1 ascan  Pslit HGap 0 1  2 0.1"));
        assert_eq!(scan.scan_header("D"), Some("Sat 2015/03/14 03:53:50"));
        assert_eq!(scan.file_header("D"), Some("Thu Feb 11 09:54:35 2016"));
        assert_eq!(scan.mca_header("CALIB"), Some("1 2 3"));
        assert_eq!(scan.mca_header("MCA"), Some("16C"));
    }

    #[test]
    fn test_data_and_labels() {
        let file = parse(TEXT);
        let scan = file.scan("1.1").unwrap();
        assert_eq!(scan.labels(), &["Pslit HGap", "det"]);
        assert_eq!(scan.data().shape(), &[2, 2]);
        assert_relative_eq!(scan.data()[[1, 1]], 20.0);
    }

    #[test]
    fn test_motors() {
        let file = parse(TEXT);
        let scan = file.scan("1.1").unwrap();
        assert_eq!(
            scan.motor_names(),
            &["Pslit HGap", "MRTSlit UP", "Slit Vert Gap"]
        );
        assert_eq!(scan.motor_position_by_name("MRTSlit UP"), Some(1.5));
        assert_eq!(
            scan.motor_position_by_name("Slit Vert Gap"),
            Some(f64::INFINITY)
        );
        assert_eq!(scan.motor_position_by_name("nope"), None);
    }

    #[test]
    fn test_mca_continuation() {
        let file = parse(TEXT);
        let scan = file.scan("1.1").unwrap();
        assert_eq!(
            scan.mca_spectra(),
            &[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
        );
        assert_eq!(scan.analyser_count().unwrap(), 1);
        assert_eq!(scan.mca_channels().unwrap(), vec![0.0, 1.0, 2.0]);
        assert_eq!(scan.mca_calibration().unwrap(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_ragged_rows() {
        let err = SpecParser::new()
            .parse("x", "#S 1 a\n#L a  b\n1 2\n3\n")
            .unwrap_err();
        assert_eq!(
            err,
            Error::RaggedData {
                scan: "1.1".to_string(),
                line: 4,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_label_mismatch() {
        let err = SpecParser::new()
            .parse("x", "#S 1 a\n#L a\n1 2\n")
            .unwrap_err();
        assert!(matches!(err, Error::LabelMismatch { labels: 1, columns: 2, .. }));
    }

    #[test]
    fn test_invalid_number() {
        let err = SpecParser::new()
            .parse("x", "#S 1 a\n#L a\n1\nfoo\n")
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidNumber {
                line: 4,
                token: "foo".to_string()
            }
        );
    }

    #[test]
    fn test_empty_scan() {
        let file = parse("#S 3 a\n#L x  y\n");
        let scan = file.scan("3.1").unwrap();
        assert_eq!(scan.data().shape(), &[0, 2]);
        assert!(scan.mca_spectra().is_empty());
        assert_eq!(scan.analyser_count().unwrap(), 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let text: String = (1..=40)
            .map(|n| format!("#S {n} a\n#L x\n{n}\n\n"))
            .collect();
        let parallel = SpecParser::with_config(ParserConfig::new().with_parallel_threshold(4))
            .parse("x", &text)
            .unwrap();
        let sequential = SpecParser::with_config(ParserConfig::new().with_parallel(false))
            .parse("x", &text)
            .unwrap();
        assert_eq!(parallel.scan_keys(), sequential.scan_keys());
        assert_eq!(parallel.scan_keys().len(), 40);
        let scan = parallel.scan("40.1").unwrap();
        assert_relative_eq!(scan.data()[[0, 0]], 40.0);
    }
}
