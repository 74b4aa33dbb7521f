//! Geographic point type and its planar view.
//!
//! - `Point`: WGS84 degrees, no altitude. Sequences of points are ordered;
//!   order defines polygon winding or path direction.
//! - Planar view: `x = lng`, `y = lat`. All GeoMath vector work happens on
//!   `nalgebra::Vector2` in this frame and converts back at the boundary.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A geographic position in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
}

impl Point {
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Planar vector `(lng, lat)`.
    #[inline]
    pub fn to_vec2(self) -> Vector2<f64> {
        Vector2::new(self.lng, self.lat)
    }

    #[inline]
    pub fn from_vec2(v: Vector2<f64>) -> Self {
        Self { lat: v.y, lng: v.x }
    }

    /// Translate by a point used as a displacement vector.
    #[inline]
    pub fn offset_by(self, d: Point) -> Self {
        Self {
            lat: self.lat + d.lat,
            lng: self.lng + d.lng,
        }
    }

    /// Translate by the negated displacement.
    #[inline]
    pub fn offset_against(self, d: Point) -> Self {
        Self {
            lat: self.lat - d.lat,
            lng: self.lng - d.lng,
        }
    }

    /// Bit-level equality of both coordinates (distinguishes `0.0` and `-0.0`).
    #[inline]
    pub fn bit_eq(&self, other: &Point) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lng.to_bits() == other.lng.to_bits()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    /// `(lat, lng)` tuple.
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}
