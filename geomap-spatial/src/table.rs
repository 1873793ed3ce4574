use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::error::{SpatialError, SpatialResult};
use crate::geometry::GeometryKind;
use crate::srid::Srid;

/// Metadata for one geometry column registered in the spatial database.
///
/// A `SpatialTable` is a snapshot of one registry row. It is never updated
/// after load, so later schema changes are not observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TableRecord")]
pub struct SpatialTable {
    name: String,
    geometry_column: String,
    geometry_type: String,
    srid: Srid,
}

/// Unvalidated serialized form of a [`SpatialTable`].
#[derive(Deserialize)]
struct TableRecord {
    name: String,
    geometry_column: String,
    geometry_type: String,
    srid: Srid,
}

impl TryFrom<TableRecord> for SpatialTable {
    type Error = SpatialError;

    fn try_from(record: TableRecord) -> SpatialResult<Self> {
        SpatialTable::new(
            record.name,
            record.geometry_column,
            record.geometry_type,
            record.srid,
        )
    }
}

impl SpatialTable {
    /// Creates table metadata. `name` and `geometry_column` must be non-empty.
    pub fn new(
        name: impl Into<String>,
        geometry_column: impl Into<String>,
        geometry_type: impl Into<String>,
        srid: impl Into<Srid>,
    ) -> SpatialResult<Self> {
        let name = name.into();
        let geometry_column = geometry_column.into();
        if name.trim().is_empty() {
            return Err(SpatialError::InvalidOperation(
                "spatial table name cannot be empty".to_string(),
            ));
        }
        if geometry_column.trim().is_empty() {
            return Err(SpatialError::InvalidOperation(format!(
                "geometry column of table '{}' cannot be empty",
                name
            )));
        }
        Ok(SpatialTable {
            name,
            geometry_column,
            geometry_type: geometry_type.into(),
            srid: srid.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry_column(&self) -> &str {
        &self.geometry_column
    }

    /// The engine's label for the column type, e.g. `MULTIPOLYGON` or `POINT Z`.
    pub fn geometry_type(&self) -> &str {
        &self.geometry_type
    }

    pub fn srid(&self) -> Srid {
        self.srid
    }

    /// Parses the type label, ignoring any dimension suffix.
    /// Returns `None` for generic or unknown labels such as `GEOMETRY`.
    pub fn kind(&self) -> Option<GeometryKind> {
        let base = self.geometry_type.split_whitespace().next()?;
        let base = base
            .strip_suffix("ZM")
            .filter(|b| GeometryKind::from_label(b).is_some())
            .or_else(|| base.strip_suffix('Z').filter(|b| GeometryKind::from_label(b).is_some()))
            .or_else(|| base.strip_suffix('M').filter(|b| GeometryKind::from_label(b).is_some()))
            .unwrap_or(base);
        GeometryKind::from_label(base)
    }
}

impl Display for SpatialTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} ({}, srid {})",
            self.name, self.geometry_column, self.geometry_type, self.srid
        )
    }
}

/// Maps a numeric registry geometry type (current Spatialite layout) to its
/// label. Codes above 1000 carry the dimension model in the thousands digit.
pub(crate) fn geometry_type_label(code: i64) -> String {
    let base = match code.rem_euclid(1000) {
        1 => "POINT",
        2 => "LINESTRING",
        3 => "POLYGON",
        4 => "MULTIPOINT",
        5 => "MULTILINESTRING",
        6 => "MULTIPOLYGON",
        7 => "GEOMETRYCOLLECTION",
        _ => return "GEOMETRY".to_string(),
    };
    match code / 1000 {
        0 => base.to_string(),
        1 => format!("{} Z", base),
        2 => format!("{} M", base),
        3 => format!("{} ZM", base),
        _ => "GEOMETRY".to_string(),
    }
}
