//! Root of the virtual tree.

use crate::group::{Entry, Group};
use crate::reader::SpecFileReader;
use spech5_core::{Attrs, Error, Result, ScanFile, ScanRecord};
use spech5_specfile::ParserConfig;
use std::fmt;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration of the virtual tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewConfig {
    /// Zone appended to `start_time` values whose date carries none
    /// (e.g. `"+01:00"` or `"Z"`).
    pub time_zone: Option<String>,
}

impl ViewConfig {
    /// Creates a view configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback time zone.
    #[must_use]
    pub fn with_time_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = Some(zone.into());
        self
    }
}

/// HDF5-like view of one SPEC file.
///
/// Owns the backing store; every [`Group`] borrows from it.
///
/// ```no_run
/// use spech5_io::SpecH5;
///
/// let sfh5 = SpecH5::open("sample.dat")?;
/// let title = sfh5.get("/1.1/title")?;
/// println!("{}", title.name());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SpecH5 {
    source: Box<dyn ScanFile>,
    config: ViewConfig,
}

impl SpecH5 {
    /// Opens and parses a SPEC file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        Self::open_with(path, ParserConfig::default())
    }

    /// Opens and parses a SPEC file with a parser configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn open_with<P: AsRef<Path>>(path: P, parser: ParserConfig) -> crate::Result<Self> {
        let spec = SpecFileReader::open(path)?.with_config(parser).read()?;
        Ok(Self::from_source(spec))
    }

    /// Wraps an already loaded backing store.
    pub fn from_source(source: impl ScanFile + 'static) -> Self {
        Self {
            source: Box::new(source),
            config: ViewConfig::default(),
        }
    }

    /// Sets the view configuration.
    #[must_use]
    pub fn with_config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Name of the backing file.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.source.filename()
    }

    /// The backing store.
    #[must_use]
    pub fn source(&self) -> &dyn ScanFile {
        self.source.as_ref()
    }

    /// The root group, `/`.
    #[must_use]
    pub fn root(&self) -> Group<'_> {
        Group::root(self)
    }

    pub(crate) fn scan_record(&self, key: &str) -> Result<&dyn ScanRecord> {
        self.source.scan(key).ok_or_else(|| Error::ScanNotFound {
            scan: key.to_string(),
            filename: self.filename().to_string(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        "/"
    }

    #[must_use]
    pub fn attrs(&self) -> Attrs {
        self.root().attrs()
    }

    /// Scan keys in file order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.source.scan_keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `key` names an existing member anywhere in the file.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.root().contains(key)
    }

    /// Looks up a group or dataset by absolute or relative path.
    ///
    /// # Errors
    /// See [`Group::get`].
    pub fn get(&self, key: &str) -> Result<Entry<'_>> {
        self.root().get(key)
    }

    /// Iterates over the scan keys.
    pub fn iter(&self) -> impl Iterator<Item = String> {
        self.keys().into_iter()
    }

    /// Scans as `(key, group)` pairs.
    ///
    /// # Errors
    /// See [`Group::items`].
    pub fn items(&self) -> Result<Vec<(String, Entry<'_>)>> {
        self.root().items()
    }

    /// Visits every member name below the root. See [`Group::visit`].
    ///
    /// # Errors
    /// Propagates the first error met while walking the tree.
    pub fn visit<T>(&self, func: impl FnMut(&str) -> Option<T>) -> Result<Option<T>> {
        self.root().visit(func)
    }

    /// Visits every member below the root. See [`Group::visititems`].
    ///
    /// # Errors
    /// Propagates the first error met while walking the tree.
    pub fn visititems<'s, T>(
        &'s self,
        func: impl FnMut(&str, &Entry<'s>) -> Option<T>,
    ) -> Result<Option<T>> {
        self.root().visititems(func)
    }
}

impl PartialEq for SpecH5 {
    fn eq(&self, other: &Self) -> bool {
        self.filename() == other.filename() && self.keys() == other.keys()
    }
}

impl fmt::Debug for SpecH5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecH5")
            .field("filename", &self.filename())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for SpecH5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<SpecH5 \"{}\" ({} members)>", self.filename(), self.len())
    }
}
