//! Spatial reference identifiers.
//!
//! SRIDs reach this crate as registry integers, as user supplied text or as
//! whatever SQLite storage class a registry row happens to use. They are
//! normalized to a canonical integer on the way in so that `"4326"`,
//! `"04326"`, `"4326.0"` and `4326` all compare equal.

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::{SpatialError, SpatialResult};

/// WGS 84 geographic coordinates.
pub const WGS84: Srid = Srid(4326);

/// Spherical (web) mercator.
pub const WEB_MERCATOR: Srid = Srid(3857);

/// A canonical spatial reference identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Srid(i32);

impl Srid {
    pub const fn new(code: i32) -> Self {
        Srid(code)
    }

    /// The integer code.
    pub fn code(&self) -> i32 {
        self.0
    }

    /// Normalizes a SQLite value read from a registry row.
    pub fn from_value_ref(value: ValueRef<'_>) -> SpatialResult<Self> {
        match value {
            ValueRef::Integer(code) => Self::try_from(code),
            ValueRef::Real(code) => Self::from_real(code),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map_err(|e| SpatialError::InvalidSrid(e.to_string()))?
                .parse(),
            ValueRef::Null => Err(SpatialError::InvalidSrid("NULL".to_string())),
            ValueRef::Blob(_) => Err(SpatialError::InvalidSrid("BLOB value".to_string())),
        }
    }

    fn from_real(code: f64) -> SpatialResult<Self> {
        if code.fract() != 0.0 || !code.is_finite() {
            return Err(SpatialError::InvalidSrid(format!("{} is not integral", code)));
        }
        if code < i32::MIN as f64 || code > i32::MAX as f64 {
            return Err(SpatialError::InvalidSrid(format!("{} is out of range", code)));
        }
        Ok(Srid(code as i32))
    }
}

impl Display for Srid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Srid {
    fn from(code: i32) -> Self {
        Srid(code)
    }
}

impl TryFrom<i64> for Srid {
    type Error = SpatialError;

    fn try_from(code: i64) -> SpatialResult<Self> {
        i32::try_from(code)
            .map(Srid)
            .map_err(|_| SpatialError::InvalidSrid(format!("{} is out of range", code)))
    }
}

impl FromStr for Srid {
    type Err = SpatialError;

    /// Accepts `4326`, `04326`, `4326.0`, `EPSG:4326` and surrounding whitespace.
    fn from_str(text: &str) -> SpatialResult<Self> {
        let trimmed = text.trim();
        let digits = match trimmed.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("epsg:") => trimmed[5..].trim_start(),
            _ => trimmed,
        };
        if digits.is_empty() {
            return Err(SpatialError::InvalidSrid(format!("'{}' is empty", text)));
        }
        if let Ok(code) = digits.parse::<i64>() {
            return Self::try_from(code);
        }
        match digits.parse::<f64>() {
            Ok(code) => Self::from_real(code),
            Err(_) => Err(SpatialError::InvalidSrid(format!("'{}' is not a number", text))),
        }
    }
}
