//! Loads [`SpatialTable`] metadata from the engine's geometry column registry.
//!
//! Two registry layouts are understood:
//! - the legacy layout, with a textual `type` column
//! - the current Spatialite layout, with an integer `geometry_type` column
//!
//! The layout is detected from `PRAGMA table_info(geometry_columns)` before
//! the registry is scanned.

use log::debug;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row};

use crate::error::{SpatialError, SpatialResult};
use crate::srid::Srid;
use crate::table::{geometry_type_label, SpatialTable};

const LAYOUT_SQL: &str = "PRAGMA table_info(geometry_columns);";
const LEGACY_SQL: &str =
    "SELECT f_table_name, f_geometry_column, type, srid FROM geometry_columns;";
const CURRENT_SQL: &str =
    "SELECT f_table_name, f_geometry_column, geometry_type, srid FROM geometry_columns;";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistryLayout {
    Legacy,
    Current,
}

/// Read-only snapshot of the spatial tables registered in a database,
/// in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialTableCatalog {
    tables: Vec<SpatialTable>,
}

impl SpatialTableCatalog {
    /// Scans the geometry column registry of `conn`.
    ///
    /// A missing or malformed registry is a query failure. An empty registry
    /// yields an empty catalog.
    pub fn load(conn: &Connection) -> SpatialResult<Self> {
        let layout = detect_layout(conn)?;
        let sql = match layout {
            RegistryLayout::Legacy => LEGACY_SQL,
            RegistryLayout::Current => CURRENT_SQL,
        };

        let mut stmt = conn.prepare(sql).map_err(|e| SpatialError::query(sql, e))?;
        let mut rows = stmt.query([]).map_err(|e| SpatialError::query(sql, e))?;

        let mut tables = Vec::new();
        while let Some(row) = rows.next().map_err(|e| SpatialError::query(sql, e))? {
            tables.push(read_table(row, layout, sql)?);
        }

        debug!("Loaded {} spatial tables from {:?} registry", tables.len(), layout);
        Ok(SpatialTableCatalog { tables })
    }

    pub fn tables(&self) -> &[SpatialTable] {
        &self.tables
    }

    /// Looks up a table by name, ignoring ASCII case like SQLite does.
    pub fn find(&self, name: &str) -> Option<&SpatialTable> {
        self.tables
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpatialTable> {
        self.tables.iter()
    }

    pub fn into_tables(self) -> Vec<SpatialTable> {
        self.tables
    }
}

impl IntoIterator for SpatialTableCatalog {
    type Item = SpatialTable;
    type IntoIter = std::vec::IntoIter<SpatialTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

impl<'a> IntoIterator for &'a SpatialTableCatalog {
    type Item = &'a SpatialTable;
    type IntoIter = std::slice::Iter<'a, SpatialTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

/// Lists the spatial tables of `conn` in registry order.
pub fn list_tables(conn: &Connection) -> SpatialResult<Vec<SpatialTable>> {
    SpatialTableCatalog::load(conn).map(SpatialTableCatalog::into_tables)
}

fn detect_layout(conn: &Connection) -> SpatialResult<RegistryLayout> {
    let mut stmt = conn
        .prepare(LAYOUT_SQL)
        .map_err(|e| SpatialError::query(LAYOUT_SQL, e))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| SpatialError::query(LAYOUT_SQL, e))?;

    if columns.is_empty() {
        return Err(SpatialError::Registry(
            "geometry_columns table not found".to_string(),
        ));
    }

    let has = |name: &str| columns.iter().any(|c| c.eq_ignore_ascii_case(name));
    if !has("f_table_name") || !has("f_geometry_column") || !has("srid") {
        return Err(SpatialError::Registry(format!(
            "geometry_columns is missing required columns, found {:?}",
            columns
        )));
    }
    if has("type") {
        Ok(RegistryLayout::Legacy)
    } else if has("geometry_type") {
        Ok(RegistryLayout::Current)
    } else {
        Err(SpatialError::Registry(
            "geometry_columns has neither a type nor a geometry_type column".to_string(),
        ))
    }
}

fn read_table(row: &Row<'_>, layout: RegistryLayout, sql: &str) -> SpatialResult<SpatialTable> {
    let name: String = row.get(0).map_err(|e| SpatialError::query(sql, e))?;
    let column: String = row.get(1).map_err(|e| SpatialError::query(sql, e))?;

    let type_value = row.get_ref(2).map_err(|e| SpatialError::query(sql, e))?;
    let geometry_type = match type_value {
        ValueRef::Text(text) => {
            let label = String::from_utf8_lossy(text).trim().to_string();
            // current registries store codes, but some writers put them in text
            match label.parse::<i64>() {
                Ok(code) if layout == RegistryLayout::Current => geometry_type_label(code),
                _ => label,
            }
        }
        ValueRef::Integer(code) => geometry_type_label(code),
        ValueRef::Null => "GEOMETRY".to_string(),
        other => {
            return Err(SpatialError::Registry(format!(
                "unexpected geometry type value {:?} for table '{}'",
                other.data_type(),
                name
            )))
        }
    };

    let srid_value = row.get_ref(3).map_err(|e| SpatialError::query(sql, e))?;
    let srid = Srid::from_value_ref(srid_value)
        .map_err(|e| SpatialError::Registry(format!("table '{}': {}", name, e)))?;

    SpatialTable::new(name, column, geometry_type, srid)
        .map_err(|e| SpatialError::Registry(e.to_string()))
}
