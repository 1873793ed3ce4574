//! Error and result types for spatial database operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while opening, querying or decoding from a
/// spatial database.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// The database file could not be located or opened.
    #[error("Cannot open spatial database at {path:?}: {message}")]
    ConnectionFailure { path: PathBuf, message: String },

    /// A statement could not be prepared or stepped.
    #[error("Query failed ({sql}): {source}")]
    QueryFailure {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The geometry column registry is missing or holds rows that cannot
    /// be turned into table metadata.
    #[error("Malformed geometry registry: {0}")]
    Registry(String),

    /// Bytes read from a geometry column are not a valid encoded geometry.
    #[error("Geometry decode error: {0}")]
    DecodeFailure(String),

    /// A spatial reference id could not be normalized to an integer.
    #[error("Invalid SRID: {0}")]
    InvalidSrid(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The handler has already been closed.
    #[error("Spatial database is closed")]
    Closed,
}

impl SpatialError {
    pub(crate) fn query(sql: impl Into<String>, source: rusqlite::Error) -> Self {
        SpatialError::QueryFailure {
            sql: sql.into(),
            source,
        }
    }

    pub(crate) fn connection(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        SpatialError::ConnectionFailure {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Returns true when the database could not be opened.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, SpatialError::ConnectionFailure { .. })
    }

    /// Returns true for statement preparation/execution errors, including
    /// a missing or malformed geometry registry.
    pub fn is_query_failure(&self) -> bool {
        matches!(
            self,
            SpatialError::QueryFailure { .. } | SpatialError::Registry(_)
        )
    }

    /// Returns true when a geometry blob could not be decoded.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, SpatialError::DecodeFailure(_))
    }
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;
