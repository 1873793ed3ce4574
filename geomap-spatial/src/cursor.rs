use log::{debug, warn};
use rusqlite::{Connection, Statement};

use crate::codec::{GeometryCodec, WkbCodec};
use crate::error::{SpatialError, SpatialResult};
use crate::iterator::{geometry_blob, GeometryResultIterator};
use crate::query::BoundaryQuery;

/// Owns the prepared statement of one [`BoundaryQuery`].
///
/// The statement is finalized exactly once, by [`dispose`](Self::dispose) or
/// on drop. A cursor is single-pass: its rows can be consumed once, either
/// lazily through [`geometries`](Self::geometries) or eagerly through
/// [`fetch_all_wkb`](Self::fetch_all_wkb). After that it hands out nothing.
pub struct GeometryCursor<'conn> {
    statement: Option<Statement<'conn>>,
    query: BoundaryQuery,
    consumed: bool,
}

impl<'conn> GeometryCursor<'conn> {
    /// Prepares `query` on `conn`.
    pub fn prepare(conn: &'conn Connection, query: BoundaryQuery) -> SpatialResult<Self> {
        let statement = conn
            .prepare(query.sql())
            .map_err(|e| SpatialError::query(query.sql(), e))?;
        debug!("Prepared geometry cursor for table {}", query.table_name());
        Ok(GeometryCursor {
            statement: Some(statement),
            query,
            consumed: false,
        })
    }

    pub fn query(&self) -> &BoundaryQuery {
        &self.query
    }

    /// Starts the lazy, WKB decoding pass over the rows.
    pub fn geometries(&mut self) -> SpatialResult<GeometryResultIterator<'_, WkbCodec>> {
        self.geometries_with(WkbCodec::new())
    }

    /// Starts the lazy pass, decoding each row with `codec`.
    ///
    /// A second call returns an iterator that is already disposed.
    pub fn geometries_with<C: GeometryCodec>(
        &mut self,
        codec: C,
    ) -> SpatialResult<GeometryResultIterator<'_, C>> {
        let sql = self.query.sql();
        if self.consumed {
            return Ok(GeometryResultIterator::new(None, codec, sql));
        }
        self.consumed = true;

        let rows = match self.statement.as_mut() {
            Some(statement) => Some(statement.query([]).map_err(|e| SpatialError::query(sql, e))?),
            None => None,
        };
        Ok(GeometryResultIterator::new(rows, codec, sql))
    }

    /// Drains every remaining row into raw WKB blobs.
    ///
    /// Any row level failure aborts the call and no partial result is
    /// returned. A consumed or disposed cursor yields an empty vector.
    pub fn fetch_all_wkb(&mut self) -> SpatialResult<Vec<Vec<u8>>> {
        let sql = self.query.sql();
        let statement = match self.statement.as_mut() {
            Some(statement) if !self.consumed => statement,
            _ => return Ok(Vec::new()),
        };
        self.consumed = true;

        let mut rows = statement.query([]).map_err(|e| SpatialError::query(sql, e))?;
        let mut blobs = Vec::new();
        while let Some(row) = rows.next().map_err(|e| SpatialError::query(sql, e))? {
            blobs.push(geometry_blob(row, sql)?.to_vec());
        }
        debug!("Fetched {} geometries from {}", blobs.len(), self.query.table_name());
        Ok(blobs)
    }

    /// Finalizes the statement. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        if let Some(statement) = self.statement.take() {
            if let Err(e) = statement.finalize() {
                warn!("Failed to finalize statement {}: {}", self.query.sql(), e);
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.statement.is_none()
    }
}

impl Drop for GeometryCursor<'_> {
    fn drop(&mut self) {
        self.dispose();
    }
}
