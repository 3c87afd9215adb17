//! Path grammar of the virtual tree.
//!
//! Every absolute path is classified against an ordered rule table. Each
//! rule is a list of segment patterns; the first rule matching all segments
//! wins, which makes the categories mutually exclusive by construction.
//!
//! ```text
//! /
//!     1.1/
//!         title
//!         start_time
//!         instrument/
//!             positioners/
//!                 <motor>
//!             mca_0/
//!                 data, calibration, channels
//!                 preset_time, elapsed_time, live_time   (with #@CTIME)
//!         measurement/
//!             <column>
//!             mca_0/
//!                 data -> /1.1/instrument/mca_0/data
//!                 info -> /1.1/instrument/mca_0
//! ```

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Immediate children of a scan group.
pub const SCAN_MEMBERS: [&str; 4] = ["title", "start_time", "instrument", "measurement"];
/// Static children of an instrument group (MCA groups are added per scan).
pub const INSTRUMENT_MEMBERS: [&str; 1] = ["positioners"];
/// Children of a `measurement/mca_<i>` group.
pub const MEASUREMENT_MCA_MEMBERS: [&str; 2] = ["data", "info"];
/// Datasets present in every `instrument/mca_<i>` group.
pub const INSTRUMENT_MCA_MEMBERS: [&str; 3] = ["data", "calibration", "channels"];
/// Datasets present in `instrument/mca_<i>` when the scan has `#@CTIME`.
pub const MCA_TIMING_MEMBERS: [&str; 3] = ["preset_time", "elapsed_time", "live_time"];

const MCA_INFO_MEMBERS: [&str; 6] = [
    "data",
    "calibration",
    "channels",
    "preset_time",
    "elapsed_time",
    "live_time",
];

/// Structural class of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathClass {
    Group,
    Dataset,
    LinkToGroup,
    LinkToDataset,
}

/// Category of a path in the virtual tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathKind {
    Root,
    Scan,
    Instrument,
    Positioners,
    Measurement,
    MeasurementMca,
    InstrumentMca,
    Title,
    StartTime,
    Positioner,
    MeasurementColumn,
    McaData,
    McaCalibration,
    McaChannels,
    McaPresetTime,
    McaElapsedTime,
    McaLiveTime,
    /// `measurement/mca_<i>/info`, links to `instrument/mca_<i>`.
    McaInfo,
    /// `measurement/mca_<i>/data`, links to `instrument/mca_<i>/data`.
    McaDataLink,
    /// `measurement/mca_<i>/info/<name>`, links to `instrument/mca_<i>/<name>`.
    McaInfoDataset,
}

impl PathKind {
    /// Returns the structural class of this category.
    #[must_use]
    pub const fn class(self) -> PathClass {
        match self {
            Self::Root
            | Self::Scan
            | Self::Instrument
            | Self::Positioners
            | Self::Measurement
            | Self::MeasurementMca
            | Self::InstrumentMca => PathClass::Group,
            Self::Title
            | Self::StartTime
            | Self::Positioner
            | Self::MeasurementColumn
            | Self::McaData
            | Self::McaCalibration
            | Self::McaChannels
            | Self::McaPresetTime
            | Self::McaElapsedTime
            | Self::McaLiveTime => PathClass::Dataset,
            Self::McaInfo => PathClass::LinkToGroup,
            Self::McaDataLink | Self::McaInfoDataset => PathClass::LinkToDataset,
        }
    }

    /// Returns true for groups and links to groups.
    #[must_use]
    pub const fn is_group_like(self) -> bool {
        matches!(self.class(), PathClass::Group | PathClass::LinkToGroup)
    }

    /// Returns true for links of either kind.
    #[must_use]
    pub const fn is_link(self) -> bool {
        matches!(
            self.class(),
            PathClass::LinkToGroup | PathClass::LinkToDataset
        )
    }

    /// Returns true for the MCA timing datasets, which only exist with `#@CTIME`.
    #[must_use]
    pub const fn is_mca_timing(self) -> bool {
        matches!(
            self,
            Self::McaPresetTime | Self::McaElapsedTime | Self::McaLiveTime
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Literal(&'static str),
    /// `<int>.<int>`
    ScanKey,
    /// `mca_<int>`
    Mca,
    /// Any non-empty name.
    Name,
    /// One of a fixed set of names.
    OneOf(&'static [&'static str]),
}

struct Rule {
    kind: PathKind,
    segments: &'static [Segment],
}

use Segment::{Literal, Mca, Name, OneOf, ScanKey};

// Groups come first: `measurement/mca_<i>` must not be read as a column
// labelled `mca_<i>`.
const RULES: &[Rule] = &[
    Rule {
        kind: PathKind::Root,
        segments: &[],
    },
    Rule {
        kind: PathKind::Scan,
        segments: &[ScanKey],
    },
    Rule {
        kind: PathKind::Instrument,
        segments: &[ScanKey, Literal("instrument")],
    },
    Rule {
        kind: PathKind::Positioners,
        segments: &[ScanKey, Literal("instrument"), Literal("positioners")],
    },
    Rule {
        kind: PathKind::Measurement,
        segments: &[ScanKey, Literal("measurement")],
    },
    Rule {
        kind: PathKind::MeasurementMca,
        segments: &[ScanKey, Literal("measurement"), Mca],
    },
    Rule {
        kind: PathKind::InstrumentMca,
        segments: &[ScanKey, Literal("instrument"), Mca],
    },
    Rule {
        kind: PathKind::McaInfo,
        segments: &[ScanKey, Literal("measurement"), Mca, Literal("info")],
    },
    Rule {
        kind: PathKind::Title,
        segments: &[ScanKey, Literal("title")],
    },
    Rule {
        kind: PathKind::StartTime,
        segments: &[ScanKey, Literal("start_time")],
    },
    Rule {
        kind: PathKind::Positioner,
        segments: &[ScanKey, Literal("instrument"), Literal("positioners"), Name],
    },
    Rule {
        kind: PathKind::MeasurementColumn,
        segments: &[ScanKey, Literal("measurement"), Name],
    },
    Rule {
        kind: PathKind::McaData,
        segments: &[ScanKey, Literal("instrument"), Mca, Literal("data")],
    },
    Rule {
        kind: PathKind::McaCalibration,
        segments: &[ScanKey, Literal("instrument"), Mca, Literal("calibration")],
    },
    Rule {
        kind: PathKind::McaChannels,
        segments: &[ScanKey, Literal("instrument"), Mca, Literal("channels")],
    },
    Rule {
        kind: PathKind::McaPresetTime,
        segments: &[ScanKey, Literal("instrument"), Mca, Literal("preset_time")],
    },
    Rule {
        kind: PathKind::McaElapsedTime,
        segments: &[ScanKey, Literal("instrument"), Mca, Literal("elapsed_time")],
    },
    Rule {
        kind: PathKind::McaLiveTime,
        segments: &[ScanKey, Literal("instrument"), Mca, Literal("live_time")],
    },
    Rule {
        kind: PathKind::McaDataLink,
        segments: &[ScanKey, Literal("measurement"), Mca, Literal("data")],
    },
    Rule {
        kind: PathKind::McaInfoDataset,
        segments: &[
            ScanKey,
            Literal("measurement"),
            Mca,
            Literal("info"),
            OneOf(&MCA_INFO_MEMBERS),
        ],
    },
];

/// A classified path and the identifiers captured while matching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathMatch<'p> {
    /// Category of the path.
    pub kind: PathKind,
    /// Canonical form of the path (no trailing slash except for the root).
    pub path: &'p str,
    /// Scan key, for every path below the root.
    pub scan_key: Option<&'p str>,
    /// MCA analyser index, for paths below `mca_<i>`.
    pub mca_index: Option<usize>,
    /// Motor name, column label or link member name.
    pub name: Option<&'p str>,
}

impl PathMatch<'_> {
    /// Structural class of the matched path.
    #[must_use]
    pub fn class(&self) -> PathClass {
        self.kind.class()
    }

    /// Returns the canonical path a link points to, or `None` for non-links.
    #[must_use]
    pub fn link_target(&self) -> Option<String> {
        let scan = self.scan_key?;
        let index = self.mca_index?;
        match self.kind {
            PathKind::McaInfo => Some(format!("/{scan}/instrument/mca_{index}")),
            PathKind::McaDataLink => Some(format!("/{scan}/instrument/mca_{index}/data")),
            PathKind::McaInfoDataset => {
                let name = self.name?;
                Some(format!("/{scan}/instrument/mca_{index}/{name}"))
            }
            _ => None,
        }
    }
}

/// Classifies an absolute path.
///
/// A single trailing slash is accepted on groups and links to groups.
///
/// # Errors
/// Returns [`Error::UnrecognizedPath`] if no category matches.
pub fn classify(path: &str) -> Result<PathMatch<'_>> {
    try_classify(path).ok_or_else(|| Error::UnrecognizedPath(path.to_string()))
}

/// Classifies an absolute path, returning `None` when no category matches.
#[must_use]
pub fn try_classify(path: &str) -> Option<PathMatch<'_>> {
    let body = path.strip_prefix('/')?;
    let (body, trailing_slash) = match body.strip_suffix('/') {
        Some(stripped) => (stripped, true),
        None => (body, false),
    };
    if trailing_slash && body.is_empty() {
        return None;
    }
    let segments: Vec<&str> = if body.is_empty() {
        Vec::new()
    } else {
        body.split('/').collect()
    };
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    let canonical = if trailing_slash {
        &path[..path.len() - 1]
    } else {
        path
    };

    RULES.iter().find_map(|rule| {
        if trailing_slash && !rule.kind.is_group_like() {
            return None;
        }
        let mut found = match_segments(rule.segments, &segments)?;
        found.kind = rule.kind;
        found.path = canonical;
        Some(found)
    })
}

fn match_segments<'p>(patterns: &[Segment], segments: &[&'p str]) -> Option<PathMatch<'p>> {
    if patterns.len() != segments.len() {
        return None;
    }
    let mut found = PathMatch {
        kind: PathKind::Root,
        path: "/",
        scan_key: None,
        mca_index: None,
        name: None,
    };
    for (pattern, &segment) in patterns.iter().zip(segments) {
        match *pattern {
            Segment::Literal(literal) => {
                if segment != literal {
                    return None;
                }
            }
            Segment::ScanKey => {
                if !is_scan_key(segment) {
                    return None;
                }
                found.scan_key = Some(segment);
            }
            Segment::Mca => found.mca_index = Some(parse_mca_segment(segment)?),
            Segment::Name => found.name = Some(segment),
            Segment::OneOf(names) => {
                if !names.contains(&segment) {
                    return None;
                }
                found.name = Some(segment);
            }
        }
    }
    Some(found)
}

/// Returns true if `segment` has the `<int>.<int>` shape of a scan key.
#[must_use]
pub fn is_scan_key(segment: &str) -> bool {
    let Some((number, order)) = segment.split_once('.') else {
        return false;
    };
    is_digits(number) && is_digits(order)
}

/// Parses a `mca_<int>` segment into its analyser index.
#[must_use]
pub fn parse_mca_segment(segment: &str) -> Option<usize> {
    let digits = segment.strip_prefix("mca_")?;
    if !is_digits(digits) {
        return None;
    }
    digits.parse().ok()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Returns true if `path` names a group.
#[must_use]
pub fn is_group(path: &str) -> bool {
    class_of(path) == Some(PathClass::Group)
}

/// Returns true if `path` names a dataset.
#[must_use]
pub fn is_dataset(path: &str) -> bool {
    class_of(path) == Some(PathClass::Dataset)
}

/// Returns true if `path` names a link to a group.
#[must_use]
pub fn is_link_to_group(path: &str) -> bool {
    class_of(path) == Some(PathClass::LinkToGroup)
}

/// Returns true if `path` names a link to a dataset.
#[must_use]
pub fn is_link_to_dataset(path: &str) -> bool {
    class_of(path) == Some(PathClass::LinkToDataset)
}

fn class_of(path: &str) -> Option<PathClass> {
    try_classify(path).map(|m| m.class())
}

/// Returns true if `path` is `group` itself or lies below it.
#[must_use]
pub fn is_within(group: &str, path: &str) -> bool {
    let base = group.trim_end_matches('/');
    if base.is_empty() {
        return path.starts_with('/');
    }
    match path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Resolves `key` against the group path `group`.
///
/// Relative keys are appended to the group path; absolute keys are kept as
/// they are but must lie inside the group.
///
/// # Errors
/// Returns [`Error::KeyNotInScope`] if an absolute key is outside `group`.
pub fn resolve(group: &str, key: &str) -> Result<String> {
    if key.starts_with('/') {
        if is_within(group, key) {
            Ok(key.to_string())
        } else {
            Err(Error::KeyNotInScope {
                key: key.to_string(),
                group: group.to_string(),
            })
        }
    } else {
        Ok(join(group, key))
    }
}

/// Joins a relative member name onto a group path.
#[must_use]
pub fn join(group: &str, key: &str) -> String {
    format!("{}/{}", group.trim_end_matches('/'), key)
}

/// Returns the parent path of a canonical path, or `None` for the root.
#[must_use]
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&trimmed[..idx]),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(path: &str) -> Option<PathKind> {
        try_classify(path).map(|m| m.kind)
    }

    #[test]
    fn test_group_paths() {
        assert_eq!(kind("/"), Some(PathKind::Root));
        assert_eq!(kind("/1.1"), Some(PathKind::Scan));
        assert_eq!(kind("/1.1/"), Some(PathKind::Scan));
        assert_eq!(kind("/25.2/instrument"), Some(PathKind::Instrument));
        assert_eq!(
            kind("/1.1/instrument/positioners/"),
            Some(PathKind::Positioners)
        );
        assert_eq!(kind("/1.1/measurement"), Some(PathKind::Measurement));
        assert_eq!(
            kind("/1.1/measurement/mca_0"),
            Some(PathKind::MeasurementMca)
        );
        assert_eq!(
            kind("/1.1/instrument/mca_12"),
            Some(PathKind::InstrumentMca)
        );
    }

    #[test]
    fn test_dataset_paths() {
        assert_eq!(kind("/1.1/title"), Some(PathKind::Title));
        assert_eq!(kind("/1.1/start_time"), Some(PathKind::StartTime));
        assert_eq!(
            kind("/1.1/instrument/positioners/Pslit HGap"),
            Some(PathKind::Positioner)
        );
        assert_eq!(
            kind("/1.1/measurement/Epoch"),
            Some(PathKind::MeasurementColumn)
        );
        assert_eq!(kind("/1.1/instrument/mca_0/data"), Some(PathKind::McaData));
        assert_eq!(
            kind("/1.1/instrument/mca_0/calibration"),
            Some(PathKind::McaCalibration)
        );
        assert_eq!(
            kind("/1.1/instrument/mca_0/channels"),
            Some(PathKind::McaChannels)
        );
        assert_eq!(
            kind("/1.1/instrument/mca_0/preset_time"),
            Some(PathKind::McaPresetTime)
        );
        assert_eq!(
            kind("/1.1/instrument/mca_0/elapsed_time"),
            Some(PathKind::McaElapsedTime)
        );
        assert_eq!(
            kind("/1.1/instrument/mca_0/live_time"),
            Some(PathKind::McaLiveTime)
        );
    }

    #[test]
    fn test_link_paths() {
        assert_eq!(kind("/1.1/measurement/mca_0/info"), Some(PathKind::McaInfo));
        assert_eq!(kind("/1.1/measurement/mca_0/info/"), Some(PathKind::McaInfo));
        assert_eq!(
            kind("/1.1/measurement/mca_0/data"),
            Some(PathKind::McaDataLink)
        );
        assert_eq!(
            kind("/1.1/measurement/mca_3/info/channels"),
            Some(PathKind::McaInfoDataset)
        );
        assert!(is_link_to_group("/1.1/measurement/mca_0/info"));
        assert!(is_link_to_dataset("/1.1/measurement/mca_0/data"));
    }

    #[test]
    fn test_unrecognized_paths() {
        for path in [
            "",
            "1.1",
            "//",
            "/1",
            "/a.b",
            "/1.1//title",
            "/1.1/title/",
            "/1.1/spam",
            "/1.1/instrument/mca_x",
            "/1.1/instrument/positioners/a/b",
            "/1.1/measurement/mca_0/info/spam",
            "/1.1/measurement/mca_0/spam",
        ] {
            assert_eq!(kind(path), None, "{path:?} should not classify");
        }
        assert_eq!(
            classify("/1.1/spam"),
            Err(Error::UnrecognizedPath("/1.1/spam".to_string()))
        );
    }

    #[test]
    fn test_mca_group_takes_precedence_over_column() {
        let found = classify("/1.1/measurement/mca_0").unwrap();
        assert_eq!(found.kind, PathKind::MeasurementMca);
        assert_eq!(found.name, None);
        assert!(is_group("/1.1/measurement/mca_0"));
        assert!(!is_dataset("/1.1/measurement/mca_0"));

        // Not an analyser name, so a plain column.
        assert_eq!(
            kind("/1.1/measurement/mca_a"),
            Some(PathKind::MeasurementColumn)
        );
    }

    #[test]
    fn test_rules_overlap_only_at_mca_group() {
        let samples = [
            "/",
            "/1.1",
            "/1.1/instrument",
            "/1.1/instrument/positioners",
            "/1.1/measurement",
            "/1.1/measurement/mca_0",
            "/1.1/instrument/mca_0",
            "/1.1/measurement/mca_0/info",
            "/1.1/title",
            "/1.1/start_time",
            "/1.1/instrument/positioners/x",
            "/1.1/measurement/x",
            "/1.1/instrument/mca_0/data",
            "/1.1/instrument/mca_0/calibration",
            "/1.1/instrument/mca_0/channels",
            "/1.1/instrument/mca_0/preset_time",
            "/1.1/instrument/mca_0/elapsed_time",
            "/1.1/instrument/mca_0/live_time",
            "/1.1/measurement/mca_0/data",
            "/1.1/measurement/mca_0/info/data",
        ];
        for path in samples {
            let segments: Vec<&str> = path[1..].split('/').filter(|s| !s.is_empty()).collect();
            let matching: Vec<PathKind> = RULES
                .iter()
                .filter(|rule| match_segments(rule.segments, &segments).is_some())
                .map(|rule| rule.kind)
                .collect();
            if path == "/1.1/measurement/mca_0" {
                assert_eq!(
                    matching,
                    vec![PathKind::MeasurementMca, PathKind::MeasurementColumn]
                );
            } else {
                assert_eq!(matching.len(), 1, "{path} matched {matching:?}");
            }
            let flags = [
                is_group(path),
                is_dataset(path),
                is_link_to_group(path),
                is_link_to_dataset(path),
            ];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{path}");
        }
    }

    #[test]
    fn test_captures() {
        let found = classify("/12.3/measurement/mca_4/info/calibration").unwrap();
        assert_eq!(found.scan_key, Some("12.3"));
        assert_eq!(found.mca_index, Some(4));
        assert_eq!(found.name, Some("calibration"));
        assert_eq!(
            found.link_target().as_deref(),
            Some("/12.3/instrument/mca_4/calibration")
        );

        let found = classify("/1.1/measurement/mca_2/info/").unwrap();
        assert_eq!(found.path, "/1.1/measurement/mca_2/info");
        assert_eq!(
            found.link_target().as_deref(),
            Some("/1.1/instrument/mca_2")
        );
        assert_eq!(classify("/1.1/title").unwrap().link_target(), None);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/", "1.1").unwrap(), "/1.1");
        assert_eq!(
            resolve("/1.1", "instrument/positioners").unwrap(),
            "/1.1/instrument/positioners"
        );
        assert_eq!(
            resolve("/1.1", "/1.1/measurement").unwrap(),
            "/1.1/measurement"
        );
        assert!(matches!(
            resolve("/1.1", "/2.1/measurement"),
            Err(Error::KeyNotInScope { .. })
        ));
        // String prefix is not enough: /1.10 is not inside /1.1.
        assert!(resolve("/1.1", "/1.10/title").is_err());
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/"), None);
        assert_eq!(parent("/1.1"), Some("/"));
        assert_eq!(parent("/1.1/instrument/mca_0"), Some("/1.1/instrument"));
    }
}
