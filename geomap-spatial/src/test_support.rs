//! Stand-ins for the Spatialite SQL functions the boundary query relies on,
//! for tests that run against plain SQLite.
//!
//! Enabled by the `test-support` feature.

use geo::MapCoords;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::f64::consts::PI;

use crate::bounding_box::BoundingBox;
use crate::codec::{GeometryCodec, WkbCodec};
use crate::geometry::{rectangle, Coord, GeometryExt};
use crate::srid::WEB_MERCATOR;

/// Registers stand-ins for the spatial functions of a bounded fetch.
///
/// - `ST_AsBinary(blob)` returns the blob
/// - `BuildMBR(w, s, e, n)` returns the rectangle as WKB, NULL for NULL edges
/// - `MBRIntersects(a, b)` compares bounding boxes, NULL for NULL arguments
///   and -1 when a blob is not a valid geometry
/// - `ST_Transform(blob, srid)` projects WGS 84 to web mercator for 3857 and
///   leaves the geometry as is for any other target
pub fn register_spatial_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("ST_AsBinary", 1, flags, |ctx| {
        ctx.get::<Option<Vec<u8>>>(0)
    })?;

    conn.create_scalar_function("BuildMBR", 4, flags, |ctx| {
        let edges: Vec<Option<f64>> = (0..4).map(|i| ctx.get(i)).collect::<Result<_, _>>()?;
        Ok(match edges[..] {
            [Some(w), Some(s), Some(e), Some(n)] => WkbCodec::new()
                .encode(&rectangle(&BoundingBox::new(w, s, e, n)))
                .ok(),
            _ => None,
        })
    })?;

    conn.create_scalar_function("MBRIntersects", 2, flags, |ctx| {
        let (a, b) = match (ctx.get::<Option<Vec<u8>>>(0)?, ctx.get::<Option<Vec<u8>>>(1)?) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(None),
        };
        let codec = WkbCodec::new();
        let mbr = codec.decode(&a).ok().and_then(|g| g.bounds());
        Ok(Some(match (mbr, codec.decode(&b)) {
            (Some(mbr), Ok(geometry)) => i64::from(geometry.mbr_intersects(&mbr)),
            _ => -1,
        }))
    })?;

    conn.create_scalar_function("ST_Transform", 2, flags, |ctx| {
        let target: i64 = ctx.get(1)?;
        let blob: Option<Vec<u8>> = ctx.get(0)?;
        let codec = WkbCodec::new();
        Ok(blob.map(|bytes| match codec.decode(&bytes) {
            Ok(geometry) if target == i64::from(WEB_MERCATOR.code()) => codec
                .encode(&geometry.map_coords(to_web_mercator))
                .unwrap_or(bytes),
            _ => bytes,
        }))
    })
}

/// Spherical mercator projection of a WGS 84 coordinate.
pub fn to_web_mercator(c: Coord) -> Coord {
    const HALF_WORLD: f64 = 20_037_508.342_789_244;
    let x = c.x * HALF_WORLD / 180.0;
    let y = ((90.0 + c.y) * PI / 360.0).tan().ln() / PI * HALF_WORLD;
    Coord { x, y }
}

#[cfg(test)]
pub(crate) use fixtures::*;
