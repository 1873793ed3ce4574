//! Well-known binary (WKB) geometry codec.
//!
//! Geometries come out of the engine as `ST_AsBinary(...)` blobs. Parsing is
//! done by the [`wkb`] crate, which reads both byte orders as well as ISO and
//! extended dimension codes. Z and M ordinates are dropped when the parsed
//! blob is converted to a 2D [`Geometry`].
//!
//! The [`GeometryCodec`] trait is the seam used by the lazy iterator so a
//! caller can plug in another decoder for the same blobs.

use geo_traits::to_geo::ToGeoGeometry;
use wkb::reader::read_wkb;
use wkb::writer::{write_geometry, WriteOptions};
use wkb::Endianness;

use crate::error::{SpatialError, SpatialResult};
use crate::geometry::Geometry;

/// Byte order of the WKB written by a [`WkbCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// XDR, marker byte `0`.
    BigEndian,
    /// NDR, marker byte `1`.
    #[default]
    LittleEndian,
}

impl From<ByteOrder> for Endianness {
    fn from(order: ByteOrder) -> Self {
        match order {
            ByteOrder::BigEndian => Endianness::BigEndian,
            ByteOrder::LittleEndian => Endianness::LittleEndian,
        }
    }
}

/// Encodes and decodes geometries to and from a binary interchange format.
pub trait GeometryCodec {
    /// Decodes one geometry from a blob.
    fn decode(&self, bytes: &[u8]) -> SpatialResult<Geometry>;

    /// Encodes a geometry into a blob.
    fn encode(&self, geometry: &Geometry) -> SpatialResult<Vec<u8>>;
}

/// Standard WKB codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct WkbCodec {
    byte_order: ByteOrder,
}

impl WkbCodec {
    /// Creates a codec writing little endian WKB.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec writing the given byte order. Reading always honours
    /// the marker of each blob.
    pub fn with_byte_order(byte_order: ByteOrder) -> Self {
        Self { byte_order }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}

impl GeometryCodec for WkbCodec {
    fn decode(&self, bytes: &[u8]) -> SpatialResult<Geometry> {
        if bytes.is_empty() {
            return Err(SpatialError::DecodeFailure("empty WKB blob".to_string()));
        }
        let wkb = read_wkb(bytes).map_err(|e| SpatialError::DecodeFailure(e.to_string()))?;
        // geo-types has no empty point
        wkb.try_to_geometry().ok_or_else(|| {
            SpatialError::DecodeFailure("empty point has no 2D representation".to_string())
        })
    }

    fn encode(&self, geometry: &Geometry) -> SpatialResult<Vec<u8>> {
        let options = WriteOptions {
            endianness: self.byte_order.into(),
        };
        let mut bytes = Vec::new();
        write_geometry(&mut bytes, geometry, &options)
            .map_err(|e| SpatialError::InvalidOperation(format!("cannot encode geometry: {}", e)))?;
        Ok(bytes)
    }
}

impl<C: GeometryCodec + ?Sized> GeometryCodec for &C {
    fn decode(&self, bytes: &[u8]) -> SpatialResult<Geometry> {
        (**self).decode(bytes)
    }

    fn encode(&self, geometry: &Geometry) -> SpatialResult<Vec<u8>> {
        (**self).encode(geometry)
    }
}
