//! Scan section discovery.
//!
//! Phase 1 of parsing: a sequential pass over the text that finds where
//! each scan starts and ends, numbers the scans and binds each of them to
//! the file header in force when it starts. Scan bodies are left for
//! [`crate::parser`].

use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// A file-header block (`#F`, `#E`, `#D`, `#O<n>`, ...).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileHeader {
    entries: Vec<(String, String)>,
    motor_lines: BTreeMap<u32, Vec<String>>,
    motor_names: Vec<String>,
}

impl FileHeader {
    /// Value of the first `#<key>` line of the block.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Motor names of the `#O<n>` lines, in `n` order.
    pub fn motor_names(&self) -> &[String] {
        &self.motor_names
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, key: &str, value: &str) {
        if let Some(n) = numbered(key, "O") {
            self.motor_lines.insert(n, split_labels(value));
        }
        self.entries.push((key.to_string(), value.to_string()));
    }

    fn finish(&mut self) {
        self.motor_names = self.motor_lines.values().flatten().cloned().collect();
    }
}

/// The text range of one scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanSection {
    /// Byte offset of the `#S` line.
    pub start_offset: usize,
    /// Byte offset one past the last line of the scan.
    pub end_offset: usize,
    /// 1-based line number of the `#S` line.
    pub first_line: usize,
    /// Scan number from the `#S` line.
    pub number: u64,
    /// 1 + number of earlier scans with the same number.
    pub order: u32,
    /// Index of the file header the scan belongs to.
    pub header_index: usize,
}

impl ScanSection {
    /// Scan key, `"<number>.<order>"`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.number, self.order)
    }

    /// Number of bytes in this section.
    pub fn byte_size(&self) -> usize {
        self.end_offset - self.start_offset
    }
}

/// Result of the discovery pass.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    pub headers: Vec<FileHeader>,
    pub sections: Vec<ScanSection>,
}

/// Discovers scan sections and file headers.
///
/// A scan runs from its `#S` line to the next blank line, the next `#S`
/// line or the end of the text. Outside scans, `#F` opens a new file
/// header and other `#` lines extend the current one.
///
/// # Errors
/// Returns [`Error::InvalidScanLine`] if a `#S` line has no scan number.
pub fn discover_sections(text: &str) -> Result<Layout> {
    let mut headers = vec![FileHeader::default()];
    let mut sections = Vec::new();
    let mut current: Option<ScanSection> = None;
    let mut orders: HashMap<u64, u32> = HashMap::new();

    let mut offset = 0;
    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches(['\n', '\r']);

        if let Some((key, value)) = split_header(line) {
            if key == "S" {
                close(&mut current, start, &mut sections);
                let number = scan_number(value).ok_or_else(|| Error::InvalidScanLine {
                    line: index + 1,
                    text: line.to_string(),
                })?;
                let order = orders.entry(number).or_insert(0);
                *order += 1;
                current = Some(ScanSection {
                    start_offset: start,
                    end_offset: start,
                    first_line: index + 1,
                    number,
                    order: *order,
                    header_index: headers.len() - 1,
                });
                continue;
            }
            if current.is_none() {
                if key == "F" && headers.last().is_some_and(|h| !h.is_empty()) {
                    headers.push(FileHeader::default());
                }
                if let Some(header) = headers.last_mut() {
                    header.push(key, value);
                }
            }
        } else if line.trim().is_empty() {
            close(&mut current, start, &mut sections);
        }
    }
    close(&mut current, offset, &mut sections);

    for header in &mut headers {
        header.finish();
    }
    Ok(Layout { headers, sections })
}

fn close(current: &mut Option<ScanSection>, end: usize, sections: &mut Vec<ScanSection>) {
    if let Some(mut section) = current.take() {
        section.end_offset = end;
        sections.push(section);
    }
}

fn scan_number(value: &str) -> Option<u64> {
    value.split_whitespace().next()?.parse().ok()
}

/// Splits a `#<KEY> <value>` line. `#@` lines are not header lines.
pub(crate) fn split_header(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_prefix('#')?;
    if body.starts_with('@') {
        return None;
    }
    let key_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let (key, value) = body.split_at(key_end);
    (!key.is_empty()).then(|| (key, value.trim()))
}

/// Returns `n` for keys like `O3` or `P12`.
pub(crate) fn numbered(key: &str, prefix: &str) -> Option<u32> {
    let digits = key.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Splits names separated by two or more spaces.
pub(crate) fn split_labels(value: &str) -> Vec<String> {
    value
        .split("  ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
