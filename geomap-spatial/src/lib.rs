//! # Geomap Spatial - Spatialite Query Layer
//!
//! This crate is the spatial query layer of a field mapping application. It
//! reads the geometry tables registered in a Spatialite database, builds the
//! bounding-box query for a map viewport (reprojecting on the fly when the
//! table and the map use different coordinate systems) and decodes the WKB
//! geometries the query returns, one row at a time.
//!
//! ## Features
//!
//! - **Table Catalog**: Geometry column registry, legacy and current layouts
//! - **Boundary Queries**: `MBRIntersects`/`BuildMBR` fetches with `ST_Transform`
//! - **Lazy Decoding**: A cursor-backed iterator holding one geometry at a time
//! - **WKB Codec**: `wkb` parsing into `geo-types` geometries
//! - **Resource Safety**: Statements and connections released exactly once
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geomap_spatial::{BoundingBox, SpatialDatabaseHandler, WEB_MERCATOR};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = SpatialDatabaseHandler::open("/data/maps/survey.sqlite")?;
//! println!("spatialite {}", handler.spatialite_version()?);
//!
//! let viewport = BoundingBox::new(1_250_000.0, 5_780_000.0, 1_270_000.0, 5_800_000.0);
//! for table in handler.list_tables()? {
//!     let count = handler.with_geometry_iterator(WEB_MERCATOR, &table, &viewport, |geometries| {
//!         geometries.filter_map(Result::ok).count()
//!     })?;
//!     println!("{}: {} geometries in view", table.name(), count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bounding_box;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod error;
pub mod geometry;
pub mod handler;
pub mod iterator;
pub mod query;
pub mod shared;
pub mod srid;
pub mod table;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bounding_box::BoundingBox;
pub use catalog::{list_tables, SpatialTableCatalog};
pub use codec::{ByteOrder, GeometryCodec, WkbCodec};
pub use config::{OpenMode, SpatialDatabaseConfig, DEFAULT_BUSY_TIMEOUT};
pub use cursor::GeometryCursor;
pub use error::{SpatialError, SpatialResult};
pub use geometry::{
    rectangle, Coord, Geometry, GeometryExt, GeometryKind, LineString, Point, Polygon,
};
pub use handler::{SpatialDatabaseHandler, VERSION_UNAVAILABLE};
pub use iterator::GeometryResultIterator;
pub use query::{BoundaryQuery, BoundaryQueryBuilder};
pub use shared::SharedSpatialDatabase;
pub use srid::{Srid, WEB_MERCATOR, WGS84};
pub use table::SpatialTable;
