//! Memory-mapped file readers.
//!

use crate::Result;
use memmap2::Mmap;
use spech5_specfile::{ParserConfig, SpecFile, SpecParser};
use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without copying the entire file
/// into memory.
pub struct MappedFileReader {
    mmap: Option<Mmap>,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // Zero-length files cannot be mapped on every platform.
        let mmap = if file.metadata()?.len() == 0 {
            None
        } else {
            // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
            // This is the standard safety contract for memory mapping.
            #[allow(unsafe_code)]
            let mmap = unsafe { Mmap::map(&file)? };
            Some(mmap)
        };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or_default()
    }

    /// Returns the file contents as text, replacing invalid UTF-8.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        let text = String::from_utf8_lossy(self.as_bytes());
        if let Cow::Owned(_) = text {
            log::warn!(
                "{}: invalid UTF-8 replaced while decoding",
                self.path.display()
            );
        }
        text
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A SpecFile reader with memory-mapped I/O.
pub struct SpecFileReader {
    reader: MappedFileReader,
    config: ParserConfig,
}

impl SpecFileReader {
    /// Opens a SpecFile for reading with default configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        Ok(Self {
            reader,
            config: ParserConfig::default(),
        })
    }

    /// Sets the parser configuration.
    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    /// Parses the whole file.
    ///
    /// # Errors
    /// Returns an error if the text is not a valid SpecFile.
    pub fn read(&self) -> Result<SpecFile> {
        let filename = self.reader.path().display().to_string();
        log::debug!("parsing {filename} ({} bytes)", self.reader.len());
        let text = self.reader.as_text();
        Ok(SpecParser::with_config(self.config.clone()).parse(&filename, &text)?)
    }
}
