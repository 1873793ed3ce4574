//! Spatial database configuration module.
//!
//! Options used by [`SpatialDatabaseHandler`](crate::SpatialDatabaseHandler)
//! when opening a database file.

use rusqlite::OpenFlags;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default time a statement waits on a locked database: 5 seconds
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How the database file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Read-write, creating the file when it does not exist.
    #[default]
    ReadWriteCreate,
    /// Read-write, the file must exist.
    ReadWrite,
    /// Read-only, the file must exist.
    ReadOnly,
}

impl OpenMode {
    pub(crate) fn flags(&self) -> OpenFlags {
        let mode = match self {
            OpenMode::ReadWriteCreate => {
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
            OpenMode::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
        };
        mode | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }
}

/// Spatial database configuration.
///
/// # Example
///
/// ```rust,ignore
/// use geomap_spatial::{OpenMode, SpatialDatabaseConfig};
/// use std::time::Duration;
///
/// let config = SpatialDatabaseConfig::new("/sdcard/maps/survey.sqlite")
///     .with_open_mode(OpenMode::ReadOnly)
///     .with_busy_timeout(Duration::from_secs(1))
///     .with_spatialite_extension("mod_spatialite");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialDatabaseConfig {
    path: PathBuf,
    open_mode: OpenMode,
    busy_timeout: Duration,
    spatialite_extension: Option<PathBuf>,
    spatialite_entry_point: Option<String>,
}

impl SpatialDatabaseConfig {
    /// Creates a configuration for the database at `path`.
    ///
    /// Defaults:
    /// - Open mode: read-write, create when missing
    /// - Busy timeout: 5 seconds
    /// - No extension loading
    pub fn new(path: impl AsRef<Path>) -> Self {
        SpatialDatabaseConfig {
            path: path.as_ref().to_path_buf(),
            open_mode: OpenMode::default(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            spatialite_extension: None,
            spatialite_entry_point: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open_mode(&self) -> OpenMode {
        self.open_mode
    }

    pub fn with_open_mode(mut self, open_mode: OpenMode) -> Self {
        self.open_mode = open_mode;
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Sets how long a statement waits on a locked database before failing.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn spatialite_extension(&self) -> Option<&Path> {
        self.spatialite_extension.as_deref()
    }

    pub fn spatialite_entry_point(&self) -> Option<&str> {
        self.spatialite_entry_point.as_deref()
    }

    /// Loads the Spatialite extension from `path` right after opening,
    /// using the library's default entry point.
    pub fn with_spatialite_extension(mut self, path: impl AsRef<Path>) -> Self {
        self.spatialite_extension = Some(path.as_ref().to_path_buf());
        self
    }

    /// Overrides the entry point used when loading the extension,
    /// e.g. `sqlite3_modspatialite_init`.
    pub fn with_spatialite_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.spatialite_entry_point = Some(entry_point.into());
        self
    }
}
