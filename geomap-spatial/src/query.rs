use log::trace;
use std::fmt::{self, Display, Write};

use crate::bounding_box::BoundingBox;
use crate::srid::Srid;
use crate::table::SpatialTable;

/// An immutable bounded geometry fetch for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryQuery {
    sql: String,
    table_name: String,
    target_srid: Srid,
    transformed: bool,
}

impl BoundaryQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The coordinate system the fetched geometries are expressed in.
    pub fn target_srid(&self) -> Srid {
        self.target_srid
    }

    /// Whether the geometry column is reprojected on the fly.
    pub fn is_transformed(&self) -> bool {
        self.transformed
    }

    #[cfg(test)]
    pub(crate) fn raw(sql: &str) -> Self {
        BoundaryQuery {
            sql: sql.to_string(),
            table_name: String::new(),
            target_srid: crate::srid::WGS84,
            transformed: false,
        }
    }
}

impl Display for BoundaryQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Builds the SQL that fetches the geometries of a table intersecting a
/// bounding box, reprojecting them when the table's SRID differs from the
/// caller's.
///
/// The generated statement has the shape
///
/// ```text
/// SELECT ST_AsBinary(<geom>) from <table>
///     where MBRIntersects(BuildMBR(<w>, <s>, <e>, <n>),<geom>);
/// ```
///
/// where `<geom>` is either the geometry column or
/// `ST_Transform(<column>,<target srid>)`. The bounding box is taken as
/// given: inverted or degenerate boxes are not corrected.
pub struct BoundaryQueryBuilder;

impl BoundaryQueryBuilder {
    /// Builds the bounded fetch of `table` for a viewport in `target` coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use geomap_spatial::{BoundaryQueryBuilder, BoundingBox, SpatialTable, Srid};
    ///
    /// let roads = SpatialTable::new("roads", "geom", "LINESTRING", 4326).unwrap();
    /// let bbox = BoundingBox::new(10.0, 45.0, 11.0, 46.0);
    ///
    /// let query = BoundaryQueryBuilder::build(Srid::new(3857), &roads, &bbox);
    /// assert_eq!(
    ///     query.sql(),
    ///     "SELECT ST_AsBinary(ST_Transform(geom,3857)) from roads where \
    ///      MBRIntersects(BuildMBR(10.0, 45.0, 11.0, 46.0),ST_Transform(geom,3857));"
    /// );
    /// ```
    pub fn build(target: Srid, table: &SpatialTable, bbox: &BoundingBox) -> BoundaryQuery {
        let column = quote_identifier(table.geometry_column());
        let transformed = table.srid() != target;
        let geom = if transformed {
            format!("ST_Transform({},{})", column, target)
        } else {
            column
        };

        let mut sql = String::with_capacity(128);
        // writing into a String cannot fail
        let _ = write!(
            sql,
            "SELECT ST_AsBinary({geom}) from {table} where \
             MBRIntersects(BuildMBR({w}, {s}, {e}, {n}),{geom});",
            geom = geom,
            table = quote_identifier(table.name()),
            w = render_coordinate(bbox.west()),
            s = render_coordinate(bbox.south()),
            e = render_coordinate(bbox.east()),
            n = render_coordinate(bbox.north()),
        );
        trace!("Built boundary query for {}: {}", table.name(), sql);

        BoundaryQuery {
            sql,
            table_name: table.name().to_string(),
            target_srid: target,
            transformed,
        }
    }

    /// Same as [`BoundaryQueryBuilder::build`], taking the box as its four edges.
    pub fn build_from_edges(
        target: Srid,
        table: &SpatialTable,
        north: f64,
        south: f64,
        east: f64,
        west: f64,
    ) -> BoundaryQuery {
        Self::build(target, table, &BoundingBox::from_edges(north, south, east, west))
    }
}

/// SQLite keywords, sorted. A table or column named after one of them must
/// be quoted to parse.
#[rustfmt::skip]
const SQLITE_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "KEY",
    "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT", "NOTHING",
    "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS", "OUTER", "OVER",
    "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE", "RANGE",
    "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE", "RESTRICT",
    "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET", "TABLE",
    "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED", "UNION",
    "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE",
    "WINDOW", "WITH", "WITHOUT",
];

fn is_keyword(identifier: &str) -> bool {
    SQLITE_KEYWORDS
        .binary_search(&identifier.to_ascii_uppercase().as_str())
        .is_ok()
}

/// Emits plain identifiers as-is and double-quotes keywords and everything
/// else.
fn quote_identifier(identifier: &str) -> String {
    let mut chars = identifier.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if plain && !is_keyword(identifier) {
        identifier.to_string()
    } else {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }
}

fn render_coordinate(value: f64) -> String {
    if value.is_finite() {
        format!("{:?}", value)
    } else {
        "NULL".to_string()
    }
}
