use log::{debug, warn};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, LoadExtensionGuard, OptionalExtension};
use std::path::Path;

use crate::bounding_box::BoundingBox;
use crate::catalog::SpatialTableCatalog;
use crate::config::SpatialDatabaseConfig;
use crate::cursor::GeometryCursor;
use crate::error::{SpatialError, SpatialResult};
use crate::iterator::GeometryResultIterator;
use crate::query::{BoundaryQuery, BoundaryQueryBuilder};
use crate::srid::Srid;
use crate::table::SpatialTable;

/// Returned by the version queries when the engine reports no version.
pub const VERSION_UNAVAILABLE: &str = "-";

const SPATIALITE_VERSION_SQL: &str = "SELECT spatialite_version();";
const PROJ4_VERSION_SQL: &str = "SELECT proj4_version();";
const GEOS_VERSION_SQL: &str = "SELECT geos_version();";

/// Entry point to a Spatialite database.
///
/// The handler owns one connection for its whole life. It is either open
/// and usable or, after [`close`](Self::close), permanently closed: every
/// operation then fails with [`SpatialError::Closed`].
///
/// The handler does no locking of its own. Wrap it in a
/// [`SharedSpatialDatabase`](crate::SharedSpatialDatabase) to share it
/// between threads.
pub struct SpatialDatabaseHandler {
    conn: Option<Connection>,
    config: SpatialDatabaseConfig,
}

impl SpatialDatabaseHandler {
    /// Opens the database at `path` with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> SpatialResult<Self> {
        Self::open_with_config(SpatialDatabaseConfig::new(path))
    }

    /// Opens a database.
    ///
    /// Fails with a connection failure when the directory holding the file
    /// does not exist, when the engine cannot open the file, or when the
    /// configured extension cannot be loaded.
    pub fn open_with_config(config: SpatialDatabaseConfig) -> SpatialResult<Self> {
        let path = config.path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(SpatialError::connection(
                    path,
                    format!("directory {} does not exist", parent.display()),
                ));
            }
        }

        let conn = Connection::open_with_flags(path, config.open_mode().flags())
            .map_err(|e| SpatialError::connection(path, e))?;
        conn.busy_timeout(config.busy_timeout())
            .map_err(|e| SpatialError::connection(path, e))?;

        if let Some(extension) = config.spatialite_extension() {
            load_extension(&conn, extension, config.spatialite_entry_point())
                .map_err(|e| SpatialError::connection(path, e))?;
            debug!("Loaded spatial extension {:?}", extension);
        }

        debug!("Opened spatial database at {:?} ({:?})", path, config.open_mode());
        Ok(SpatialDatabaseHandler {
            conn: Some(conn),
            config,
        })
    }

    pub fn config(&self) -> &SpatialDatabaseConfig {
        &self.config
    }

    /// The underlying connection, for collaborators that need raw access.
    pub fn connection(&self) -> SpatialResult<&Connection> {
        self.conn.as_ref().ok_or(SpatialError::Closed)
    }

    /// Version of the Spatialite library, or `"-"`.
    pub fn spatialite_version(&self) -> SpatialResult<String> {
        self.query_version(SPATIALITE_VERSION_SQL)
    }

    /// Version of the PROJ library, or `"-"`.
    pub fn proj4_version(&self) -> SpatialResult<String> {
        self.query_version(PROJ4_VERSION_SQL)
    }

    /// Version of the GEOS library, or `"-"`.
    pub fn geos_version(&self) -> SpatialResult<String> {
        self.query_version(GEOS_VERSION_SQL)
    }

    /// Lists the spatial tables in registry order.
    pub fn list_tables(&self) -> SpatialResult<Vec<SpatialTable>> {
        self.catalog().map(SpatialTableCatalog::into_tables)
    }

    /// Loads a fresh snapshot of the geometry column registry.
    pub fn catalog(&self) -> SpatialResult<SpatialTableCatalog> {
        SpatialTableCatalog::load(self.connection()?)
    }

    /// Builds the bounded fetch for `table`, see [`BoundaryQueryBuilder`].
    pub fn boundary_query(
        &self,
        target: Srid,
        table: &SpatialTable,
        bbox: &BoundingBox,
    ) -> SpatialResult<BoundaryQuery> {
        self.connection()?;
        Ok(BoundaryQueryBuilder::build(target, table, bbox))
    }

    /// Fetches every geometry of `table` intersecting `bbox` as WKB, in
    /// `target` coordinates. The statement is finalized before returning.
    pub fn fetch_all_wkb_in_bounds(
        &self,
        target: Srid,
        table: &SpatialTable,
        bbox: &BoundingBox,
    ) -> SpatialResult<Vec<Vec<u8>>> {
        let mut cursor = self.open_geometry_cursor(target, table, bbox)?;
        let blobs = cursor.fetch_all_wkb();
        cursor.dispose();
        blobs
    }

    /// Prepares the bounded fetch and hands the cursor to the caller.
    ///
    /// Exhausting or disposing an iterator taken from the cursor only resets
    /// the statement. The prepared statement itself is finalized when the
    /// cursor is disposed or dropped, so keep the cursor's scope short, or use
    /// [`with_geometry_iterator`](Self::with_geometry_iterator) which releases
    /// both before returning.
    pub fn open_geometry_cursor(
        &self,
        target: Srid,
        table: &SpatialTable,
        bbox: &BoundingBox,
    ) -> SpatialResult<GeometryCursor<'_>> {
        let query = self.boundary_query(target, table, bbox)?;
        GeometryCursor::prepare(self.connection()?, query)
    }

    /// Runs `f` over a lazy geometry iterator for the bounded fetch and
    /// releases iterator and statement when `f` returns.
    ///
    /// ```rust,ignore
    /// let lengths = handler.with_geometry_iterator(WEB_MERCATOR, &roads, &bbox, |geometries| {
    ///     geometries.filter_map(Result::ok).count()
    /// })?;
    /// ```
    pub fn with_geometry_iterator<R, F>(
        &self,
        target: Srid,
        table: &SpatialTable,
        bbox: &BoundingBox,
        f: F,
    ) -> SpatialResult<R>
    where
        F: FnOnce(&mut GeometryResultIterator<'_>) -> R,
    {
        let mut cursor = self.open_geometry_cursor(target, table, bbox)?;
        let result = {
            let mut geometries = cursor.geometries()?;
            f(&mut geometries)
        };
        cursor.dispose();
        Ok(result)
    }

    /// Closes the connection. Closing a closed handler does nothing.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!("Error closing spatial database {:?}: {}", self.config.path(), e);
            }
            debug!("Closed spatial database at {:?}", self.config.path());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn query_version(&self, sql: &str) -> SpatialResult<String> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql).map_err(|e| SpatialError::query(sql, e))?;
        let version = stmt
            .query_row([], |row| {
                Ok(match row.get_ref(0)? {
                    ValueRef::Text(text) => Some(String::from_utf8_lossy(text).into_owned()),
                    ValueRef::Integer(value) => Some(value.to_string()),
                    ValueRef::Real(value) => Some(value.to_string()),
                    ValueRef::Null | ValueRef::Blob(_) => None,
                })
            })
            .optional()
            .map_err(|e| SpatialError::query(sql, e))?;
        Ok(version
            .flatten()
            .unwrap_or_else(|| VERSION_UNAVAILABLE.to_string()))
    }
}

impl Drop for SpatialDatabaseHandler {
    fn drop(&mut self) {
        self.close();
    }
}

fn load_extension(
    conn: &Connection,
    path: &Path,
    entry_point: Option<&str>,
) -> rusqlite::Result<()> {
    // SAFETY: extension loading is enabled only for the duration of the
    // guard, and the library path comes from the caller's configuration.
    unsafe {
        let _guard = LoadExtensionGuard::new(conn)?;
        conn.load_extension(path, entry_point)
    }
}
