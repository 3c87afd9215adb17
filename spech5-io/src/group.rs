//! Groups and links of the virtual tree.
//!
//! A [`Group`] is a cheap view: a path plus a reference to the [`SpecH5`]
//! that owns the backing store. Groups are built on every lookup and never
//! cached; two groups for the same path compare equal.
//!
//! Links (`measurement/mca_<i>/info` and the datasets below
//! `measurement/mca_<i>`) behave like their targets, except that
//! [`Group::visit`] and [`Group::visititems`] skip them.

use crate::materialize::materialize;
use crate::root::SpecH5;
use spech5_core::grammar::{
    classify, join, parent, parse_mca_segment, resolve, PathKind, PathMatch,
    INSTRUMENT_MCA_MEMBERS, INSTRUMENT_MEMBERS, MCA_TIMING_MEMBERS, MEASUREMENT_MCA_MEMBERS,
    SCAN_MEMBERS,
};
use spech5_core::names::{column_label, motor_name};
use spech5_core::{attributes_for, Attrs, Dataset, Error, Result, ScanRecord};
use std::fmt;

/// A group, or a link to a group, of the virtual tree.
#[derive(Clone)]
pub struct Group<'a> {
    file: &'a SpecH5,
    path: String,
    kind: PathKind,
}

/// A member of a group.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<'a> {
    Group(Group<'a>),
    Dataset(Dataset),
}

impl<'a> Entry<'a> {
    /// Full path of the member.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Group(group) => group.name(),
            Self::Dataset(dataset) => dataset.name(),
        }
    }

    #[must_use]
    pub fn attrs(&self) -> Attrs {
        match self {
            Self::Group(group) => group.attrs(),
            Self::Dataset(dataset) => dataset.attrs().clone(),
        }
    }

    /// Returns true if the member was reached through a link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        match self {
            Self::Group(group) => group.is_link(),
            Self::Dataset(dataset) => dataset.is_link(),
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    #[must_use]
    pub fn is_dataset(&self) -> bool {
        matches!(self, Self::Dataset(_))
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&Group<'a>> {
        match self {
            Self::Group(group) => Some(group),
            Self::Dataset(_) => None,
        }
    }

    #[must_use]
    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Self::Dataset(dataset) => Some(dataset),
            Self::Group(_) => None,
        }
    }

    #[must_use]
    pub fn into_group(self) -> Option<Group<'a>> {
        match self {
            Self::Group(group) => Some(group),
            Self::Dataset(_) => None,
        }
    }

    #[must_use]
    pub fn into_dataset(self) -> Option<Dataset> {
        match self {
            Self::Dataset(dataset) => Some(dataset),
            Self::Group(_) => None,
        }
    }
}

impl<'a> Group<'a> {
    pub(crate) fn root(file: &'a SpecH5) -> Self {
        Self {
            file,
            path: "/".to_string(),
            kind: PathKind::Root,
        }
    }

    fn from_match(file: &'a SpecH5, found: &PathMatch<'_>) -> Self {
        Self {
            file,
            path: found.path.to_string(),
            kind: found.kind,
        }
    }

    /// Full path of the group.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn attrs(&self) -> Attrs {
        attributes_for(&self.path)
    }

    #[must_use]
    pub fn kind(&self) -> PathKind {
        self.kind
    }

    /// Returns true for `measurement/mca_<i>/info`.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.kind.is_link()
    }

    /// The view this group belongs to.
    #[must_use]
    pub fn file(&self) -> &'a SpecH5 {
        self.file
    }

    /// Key of the scan this group lies in, `None` for the root.
    #[must_use]
    pub fn scan_key(&self) -> Option<&str> {
        spech5_core::names::scan_key(&self.path)
    }

    /// The enclosing group, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Group<'a>> {
        let path = parent(&self.path)?;
        let found = classify(path).ok()?;
        Some(Self::from_match(self.file, &found))
    }

    fn scan(&self) -> Result<&'a dyn ScanRecord> {
        let key = self
            .scan_key()
            .ok_or_else(|| Error::UnrecognizedPath(self.path.clone()))?;
        self.file.scan_record(key)
    }

    /// Names of the immediate members.
    ///
    /// Labels and motor names that cannot be used as a path segment are
    /// left out, as are column labels shaped like `mca_<i>`.
    ///
    /// # Errors
    /// Returns [`Error::InconsistentMcaLayout`] when listing needs the
    /// analyser count of a scan whose MCA layout is inconsistent.
    pub fn keys(&self) -> Result<Vec<String>> {
        let names = |members: &[&str]| -> Vec<String> {
            members.iter().map(ToString::to_string).collect()
        };
        let analysers = |scan: &dyn ScanRecord| -> Result<Vec<String>> {
            Ok((0..scan.analyser_count()?).map(|i| format!("mca_{i}")).collect())
        };

        let keys = match self.kind {
            PathKind::Root => self.file.keys(),
            PathKind::Scan => names(&SCAN_MEMBERS),
            PathKind::Instrument => {
                let mut keys = names(&INSTRUMENT_MEMBERS);
                keys.extend(analysers(self.scan()?)?);
                keys
            }
            PathKind::Positioners => addressable(&self.path, self.scan()?.motor_names()),
            PathKind::Measurement => {
                let scan = self.scan()?;
                // `mca_<i>` names belong to analyser groups.
                let mut keys: Vec<String> = addressable(&self.path, scan.labels())
                    .into_iter()
                    .filter(|label| parse_mca_segment(label).is_none())
                    .collect();
                keys.extend(analysers(scan)?);
                keys
            }
            PathKind::MeasurementMca => names(&MEASUREMENT_MCA_MEMBERS),
            PathKind::InstrumentMca | PathKind::McaInfo => {
                let mut keys = names(&INSTRUMENT_MCA_MEMBERS);
                if self.scan()?.mca_header("CTIME").is_some() {
                    keys.extend(names(&MCA_TIMING_MEMBERS));
                }
                keys
            }
            _ => Vec::new(),
        };
        Ok(keys)
    }

    /// Number of immediate members; 0 if they cannot be listed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().map_or(0, |keys| keys.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the member names.
    ///
    /// # Errors
    /// See [`Group::keys`].
    pub fn iter(&self) -> Result<impl Iterator<Item = String>> {
        Ok(self.keys()?.into_iter())
    }

    /// Members as `(key, entry)` pairs.
    ///
    /// # Errors
    /// Returns the first error met while listing or building the members.
    pub fn items(&self) -> Result<Vec<(String, Entry<'a>)>> {
        self.keys()?
            .into_iter()
            .map(|key| self.get(&key).map(|entry| (key, entry)))
            .collect()
    }

    /// Returns true if `key` resolves to an existing member of this group.
    ///
    /// The path must classify, and the scan, analyser, motor or column it
    /// names must exist. Timing datasets also need a `#@CTIME` line.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let Ok(path) = resolve(&self.path, key) else {
            return false;
        };
        classify(&path).and_then(|found| self.validate(&found)).is_ok()
    }

    /// Looks up a member by relative path, or by absolute path inside this
    /// group.
    ///
    /// # Errors
    /// - [`Error::KeyNotInScope`] for an absolute path outside this group
    /// - [`Error::UnrecognizedPath`] if the path matches no category
    /// - [`Error::ScanNotFound`] / [`Error::MemberNotFound`] if the scan,
    ///   analyser, motor, column or timing value does not exist
    /// - any error raised while building the dataset
    pub fn get(&self, key: &str) -> Result<Entry<'a>> {
        let path = resolve(&self.path, key)?;
        let found = classify(&path)?;
        self.validate(&found)?;
        if found.kind.is_group_like() {
            Ok(Entry::Group(Self::from_match(self.file, &found)))
        } else {
            materialize(self.file, &found).map(Entry::Dataset)
        }
    }

    fn validate(&self, found: &PathMatch<'_>) -> Result<()> {
        let Some(scan_key) = found.scan_key else {
            return Ok(());
        };
        let scan = self.file.scan_record(scan_key)?;
        let missing = || Error::MemberNotFound(found.path.to_string());

        if let Some(index) = found.mca_index {
            if index >= scan.analyser_count()? {
                return Err(missing());
            }
        }
        if let Some(motor) = motor_name(found.path) {
            if !scan.motor_names().iter().any(|m| m == motor) {
                return Err(missing());
            }
        }
        if let Some(label) = column_label(found.path) {
            if !scan.labels().iter().any(|l| l == label) {
                return Err(missing());
            }
        }
        let timing = found.kind.is_mca_timing()
            || (found.kind == PathKind::McaInfoDataset
                && found.name.is_some_and(|n| MCA_TIMING_MEMBERS.contains(&n)));
        if timing && scan.mca_header("CTIME").is_none() {
            return Err(missing());
        }
        Ok(())
    }

    /// Calls `func` with the full name of every member below this group,
    /// depth first, parents before children.
    ///
    /// Links are skipped and never descended into. Returning `Some` from
    /// `func` stops the walk and that value is returned.
    ///
    /// # Errors
    /// Propagates the first error met while listing members.
    pub fn visit<T>(&self, mut func: impl FnMut(&str) -> Option<T>) -> Result<Option<T>> {
        log::debug!("visit below {}", self.path);
        self.walk_names(&mut func)
    }

    fn walk_names<T>(&self, func: &mut dyn FnMut(&str) -> Option<T>) -> Result<Option<T>> {
        for key in self.keys()? {
            let path = join(&self.path, &key);
            let found = classify(&path)?;
            if found.kind.is_link() {
                continue;
            }
            if let Some(value) = func(found.path) {
                return Ok(Some(value));
            }
            if found.kind.is_group_like() {
                let child = Self::from_match(self.file, &found);
                if let Some(value) = child.walk_names(func)? {
                    return Ok(Some(value));
                }
            }
        }
        Ok(None)
    }

    /// Like [`Group::visit`], also passing each member.
    ///
    /// # Errors
    /// Propagates the first error met while listing or building members.
    pub fn visititems<T>(
        &self,
        mut func: impl FnMut(&str, &Entry<'a>) -> Option<T>,
    ) -> Result<Option<T>> {
        log::debug!("visititems below {}", self.path);
        self.walk_items(&mut func)
    }

    fn walk_items<T>(
        &self,
        func: &mut dyn FnMut(&str, &Entry<'a>) -> Option<T>,
    ) -> Result<Option<T>> {
        for key in self.keys()? {
            let path = join(&self.path, &key);
            if classify(&path)?.kind.is_link() {
                continue;
            }
            let entry = self.get(&key)?;
            if let Some(value) = func(entry.name(), &entry) {
                return Ok(Some(value));
            }
            if let Entry::Group(group) = &entry {
                if let Some(value) = group.walk_items(func)? {
                    return Ok(Some(value));
                }
            }
        }
        Ok(None)
    }
}

/// Names usable as a single path segment; others are logged and left out.
fn addressable(group: &str, names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| {
            let usable = !name.is_empty() && !name.contains('/');
            if !usable {
                log::warn!("{group}: member {name:?} cannot be addressed by path, skipped");
            }
            usable
        })
        .cloned()
        .collect()
}

impl PartialEq for Group<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.is_link() == other.is_link()
            && self.path == other.path
            && self.file.filename() == other.file.filename()
            && self.keys().ok() == other.keys().ok()
    }
}

impl fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.path)
            .field("kind", &self.kind)
            .field("filename", &self.file.filename())
            .finish()
    }
}

impl fmt::Display for Group<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<SpecH5Group \"{}\" ({} members)>", self.path, self.len())
    }
}
