use geo_types::Rect;
use std::hash::Hash;

/// A 2D bounding box represented by minimum and maximum coordinates.
///
/// `BoundingBox` is the viewport handed to the boundary query builder. The
/// x axis runs west to east and the y axis south to north, so a map viewport
/// given by its edges maps to `min_x = west`, `min_y = south`,
/// `max_x = east`, `max_y = north`.
///
/// The box is never normalized: an inverted box (`west > east` or
/// `south > north`) or a zero-area box is kept exactly as given and the
/// engine's rectangle constructor decides what it means.
///
/// # Examples
///
/// ```rust
/// use geomap_spatial::BoundingBox;
///
/// let viewport = BoundingBox::from_edges(46.6, 46.4, 11.4, 11.2);
/// assert_eq!(viewport.west(), 11.2);
/// assert_eq!(viewport.north(), 46.6);
/// assert!(viewport.contains_point(11.3, 46.5));
/// ```
#[derive(Clone, PartialEq, Default, Debug, serde::Deserialize, serde::Serialize)]
pub struct BoundingBox {
    /// Minimum X coordinate (west edge)
    pub min_x: f64,
    /// Minimum Y coordinate (south edge)
    pub min_y: f64,
    /// Maximum X coordinate (east edge)
    pub max_x: f64,
    /// Maximum Y coordinate (north edge)
    pub max_y: f64,
}

impl Hash for BoundingBox {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.min_x.to_bits().hash(state);
        self.min_y.to_bits().hash(state);
        self.max_x.to_bits().hash(state);
        self.max_y.to_bits().hash(state);
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BoundingBox({}, {}, {}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl BoundingBox {
    /// Creates a new bounding box with the specified coordinates.
    ///
    /// # Arguments
    ///
    /// * `min_x` - Minimum X coordinate
    /// * `min_y` - Minimum Y coordinate
    /// * `max_x` - Maximum X coordinate
    /// * `max_y` - Maximum Y coordinate
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a bounding box from the edges of a map viewport, in the
    /// north, south, east, west order used by map views.
    pub fn from_edges(north: f64, south: f64, east: f64, west: f64) -> BoundingBox {
        BoundingBox::new(west, south, east, north)
    }

    /// West edge.
    pub fn west(&self) -> f64 {
        self.min_x
    }

    /// South edge.
    pub fn south(&self) -> f64 {
        self.min_y
    }

    /// East edge.
    pub fn east(&self) -> f64 {
        self.max_x
    }

    /// North edge.
    pub fn north(&self) -> f64 {
        self.max_y
    }

    /// Width of the box. Negative for inverted boxes.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box. Negative for inverted boxes.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns true for zero-area and inverted boxes.
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Checks if a point is within this bounding box (inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Checks if this bounding box intersects another (inclusive edges).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}
