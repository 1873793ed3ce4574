use log::trace;
use rusqlite::types::ValueRef;
use rusqlite::{Row, Rows};

use crate::codec::{GeometryCodec, WkbCodec};
use crate::error::{SpatialError, SpatialResult};
use crate::geometry::Geometry;

/// Lazily decodes one geometry per row of a bounded fetch.
///
/// The iterator owns the live row stream of a [`GeometryCursor`] and steps
/// it one row per [`advance`](Self::advance). Only the geometry of the
/// current row is ever materialized.
///
/// A row whose blob cannot be decoded yields a `DecodeFailure` and leaves
/// the iterator open. A failure of the engine to step the statement yields
/// a `QueryFailure` and disposes the iterator, as does exhaustion. Once
/// disposed, every further advance returns `Ok(None)`.
///
/// [`GeometryCursor`]: crate::GeometryCursor
pub struct GeometryResultIterator<'cursor, C: GeometryCodec = WkbCodec> {
    rows: Option<Rows<'cursor>>,
    codec: C,
    sql: &'cursor str,
    produced: usize,
}

enum Step {
    Row(SpatialResult<Geometry>),
    Exhausted,
    Failed(SpatialError),
}

impl<'cursor, C: GeometryCodec> GeometryResultIterator<'cursor, C> {
    pub(crate) fn new(rows: Option<Rows<'cursor>>, codec: C, sql: &'cursor str) -> Self {
        GeometryResultIterator {
            rows,
            codec,
            sql,
            produced: 0,
        }
    }

    /// Steps to the next row and decodes its geometry.
    pub fn advance(&mut self) -> SpatialResult<Option<Geometry>> {
        let rows = match self.rows.as_mut() {
            Some(rows) => rows,
            None => return Ok(None),
        };

        let step = match rows.next() {
            Ok(Some(row)) => Step::Row(decode_row(row, &self.codec, self.sql)),
            Ok(None) => Step::Exhausted,
            Err(e) => Step::Failed(SpatialError::query(self.sql, e)),
        };

        match step {
            Step::Row(Ok(geometry)) => {
                self.produced += 1;
                Ok(Some(geometry))
            }
            Step::Row(Err(e)) => Err(e),
            Step::Exhausted => {
                self.dispose();
                Ok(None)
            }
            Step::Failed(e) => {
                self.dispose();
                Err(e)
            }
        }
    }

    /// Releases the row stream. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        if self.rows.take().is_some() {
            trace!(
                "Released geometry iterator after {} geometries: {}",
                self.produced,
                self.sql
            );
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.rows.is_none()
    }

    /// Number of geometries successfully yielded so far.
    pub fn produced(&self) -> usize {
        self.produced
    }
}

impl<C: GeometryCodec> Iterator for GeometryResultIterator<'_, C> {
    type Item = SpatialResult<Geometry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

impl<C: GeometryCodec> Drop for GeometryResultIterator<'_, C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn decode_row<C: GeometryCodec>(row: &Row<'_>, codec: &C, sql: &str) -> SpatialResult<Geometry> {
    codec.decode(geometry_blob(row, sql)?)
}

/// Borrows the geometry blob in the first column of a row.
pub(crate) fn geometry_blob<'r>(row: &'r Row<'_>, sql: &str) -> SpatialResult<&'r [u8]> {
    match row.get_ref(0) {
        Ok(ValueRef::Blob(bytes)) => Ok(bytes),
        Ok(ValueRef::Null) => Err(SpatialError::DecodeFailure(
            "geometry column is NULL".to_string(),
        )),
        Ok(other) => Err(SpatialError::DecodeFailure(format!(
            "expected a BLOB geometry, found {}",
            other.data_type()
        ))),
        Err(e) => Err(SpatialError::query(sql, e)),
    }
}
