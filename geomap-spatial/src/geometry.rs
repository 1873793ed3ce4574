//! Geometry types decoded from spatial tables.
//!
//! Decoded geometries are [`geo_types`] values in 2D `f64` coordinates. This
//! module adds the type discriminator used by geometry registries and the
//! bounding-box helpers the query layer relies on.

use geo::BoundingRect;
use geo_types::{coord, Rect};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::bounding_box::BoundingBox;

pub use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};

/// A decoded geometry.
pub type Geometry = geo_types::Geometry<f64>;

/// Geometry type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    /// Classifies a decoded geometry. Lines count as line strings, rectangles
    /// and triangles as polygons.
    pub fn from_geometry(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Line(_) | Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
                GeometryKind::Polygon
            }
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    /// Upper-case WKT keyword, also the label used by geometry registries.
    pub fn label(&self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::Polygon => "POLYGON",
            GeometryKind::MultiPoint => "MULTIPOINT",
            GeometryKind::MultiLineString => "MULTILINESTRING",
            GeometryKind::MultiPolygon => "MULTIPOLYGON",
            GeometryKind::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }

    /// Parses a registry label such as `"POINT"`, `"MultiPolygon"` or
    /// `"LINESTRING Z"`. Dimension suffixes are ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let base = label.split_whitespace().next()?.to_ascii_uppercase();
        match base.as_str() {
            "POINT" => Some(GeometryKind::Point),
            "LINESTRING" => Some(GeometryKind::LineString),
            "POLYGON" => Some(GeometryKind::Polygon),
            "MULTIPOINT" => Some(GeometryKind::MultiPoint),
            "MULTILINESTRING" => Some(GeometryKind::MultiLineString),
            "MULTIPOLYGON" => Some(GeometryKind::MultiPolygon),
            "GEOMETRYCOLLECTION" => Some(GeometryKind::GeometryCollection),
            _ => None,
        }
    }

    /// True for points and multi points.
    pub fn is_point(&self) -> bool {
        matches!(self, GeometryKind::Point | GeometryKind::MultiPoint)
    }

    /// True for line strings and multi line strings.
    pub fn is_line(&self) -> bool {
        matches!(self, GeometryKind::LineString | GeometryKind::MultiLineString)
    }

    /// True for polygons and multi polygons.
    pub fn is_polygon(&self) -> bool {
        matches!(self, GeometryKind::Polygon | GeometryKind::MultiPolygon)
    }
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bounding-box helpers for decoded geometries.
pub trait GeometryExt {
    fn kind(&self) -> GeometryKind;

    /// The minimum bounding rectangle, `None` for empty geometries.
    fn bounds(&self) -> Option<BoundingBox>;

    /// The test `MBRIntersects` performs in the engine: true when the
    /// bounding rectangle touches `bbox`, edges included.
    fn mbr_intersects(&self, bbox: &BoundingBox) -> bool {
        self.bounds().is_some_and(|own| own.intersects(bbox))
    }
}

impl GeometryExt for Geometry {
    fn kind(&self) -> GeometryKind {
        GeometryKind::from_geometry(self)
    }

    fn bounds(&self) -> Option<BoundingBox> {
        self.bounding_rect().map(BoundingBox::from)
    }
}

/// The closed polygon covering a bounding box. The corners are normalized,
/// so an inverted box gives the same polygon as its ordered counterpart.
pub fn rectangle(bbox: &BoundingBox) -> Geometry {
    let rect = Rect::new(
        coord! { x: bbox.min_x, y: bbox.min_y },
        coord! { x: bbox.max_x, y: bbox.max_y },
    );
    Geometry::Polygon(rect.to_polygon())
}
