//! GeoMath: low-level vector and polygon primitives over `Point` sequences.
//!
//! Purpose
//! - Pure, allocation-light helpers used by band generation, containment and
//!   area reporting. Nothing here mutates its input or fails: degenerate input
//!   (fewer than 3 vertices for polygon ops) degrades to `0`, `false` or an
//!   empty result.
//!
//! Frame
//! - Planar approximation with `x = lng`, `y = lat` in degrees. Adequate for
//!   building-footprint sized regions, not globally accurate.
//! - Area projects to a local equirectangular plane in meters first.
//!
//! Code cross-refs: `band::{band_between_polygons, band_around_path}`.

mod types;

pub use types::Point;

use nalgebra::Vector2;
use std::cmp::Ordering;

use crate::cfg::EARTH_RADIUS_M;

/// Per-axis arithmetic mean. `None` for empty input.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(la, ln), p| (la + p.lat, ln + p.lng));
    Some(Point::new(lat / n, lng / n))
}

/// Per-axis average of two points.
#[inline]
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.lat + b.lat) / 2.0, (a.lng + b.lng) / 2.0)
}

/// Angle of `p` around `c`: `atan2(lat - c.lat, lng - c.lng)`.
#[inline]
fn angle_around(p: &Point, c: &Point) -> f64 {
    (p.lat - c.lat).atan2(p.lng - c.lng)
}

/// Indices of `points` sorted ascending by angle around their centroid (stable).
pub fn angle_order(points: &[Point]) -> Vec<usize> {
    let Some(c) = centroid(points) else {
        return Vec::new();
    };
    let keys: Vec<f64> = points.iter().map(|p| angle_around(p, &c)).collect();
    let mut idx: Vec<usize> = (0..points.len()).collect();
    idx.sort_by(|&a, &b| keys[a].partial_cmp(&keys[b]).unwrap_or(Ordering::Equal));
    idx
}

/// Vertices reordered counter-clockwise by angle from the centroid.
///
/// Heuristic canonical ordering so two independently drawn polygons of the
/// same shape can be index-aligned. Not a guaranteed correspondence for
/// concave or very differently shaped polygons.
pub fn sort_by_angle_from_centroid(points: &[Point]) -> Vec<Point> {
    angle_order(points).into_iter().map(|i| points[i]).collect()
}

/// Direction `p2 - p1` rotated by +90° (to the left of travel), scaled to
/// `length_degrees`. Returned as a displacement vector in `Point` form.
///
/// Zero-length segments give the zero vector.
pub fn perpendicular_offset(p1: Point, p2: Point, length_degrees: f64) -> Point {
    perpendicular_offset_scaled(p1, p2, length_degrees, 1.0)
}

/// Like `perpendicular_offset`, but computed in a plane where longitude is
/// compressed by `lng_scale` (e.g. `cos(lat)`), so the offset has the same
/// metric length in every direction. `lng_scale = 1` is the plain planar case.
pub(crate) fn perpendicular_offset_scaled(
    p1: Point,
    p2: Point,
    length_degrees: f64,
    lng_scale: f64,
) -> Point {
    let k = if lng_scale.is_finite() && lng_scale > 1e-12 {
        lng_scale
    } else {
        1.0
    };
    let d = p2.to_vec2() - p1.to_vec2();
    let d = Vector2::new(d.x * k, d.y);
    let norm = d.norm();
    if !norm.is_finite() || norm <= 0.0 {
        return Point::default();
    }
    let perp = Vector2::new(-d.y, d.x) * (length_degrees / norm);
    Point::new(perp.y, perp.x / k)
}

/// Polygon area in square meters via a local equirectangular projection and
/// the shoelace formula. `0` for fewer than 3 points.
pub fn area_square_meters(points: &[Point]) -> f64 {
    area_square_meters_with_radius(points, EARTH_RADIUS_M)
}

/// `area_square_meters` with an explicit sphere radius.
pub fn area_square_meters_with_radius(points: &[Point], radius_m: f64) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mean_lat = points.iter().map(|p| p.lat).sum::<f64>() / points.len() as f64;
    let kx = mean_lat.to_radians().cos() * radius_m;
    let projected: Vec<Vector2<f64>> = points
        .iter()
        .map(|p| Vector2::new(p.lng.to_radians() * kx, p.lat.to_radians() * radius_m))
        .collect();
    // Shoelace is translation invariant; centering keeps the products small.
    let origin = projected.iter().sum::<Vector2<f64>>() / projected.len() as f64;
    let projected: Vec<Vector2<f64>> = projected.into_iter().map(|v| v - origin).collect();
    let mut sum = 0.0;
    for k in 0..projected.len() {
        let a = projected[k];
        let b = projected[(k + 1) % projected.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum.abs() / 2.0
}

/// Even-odd ray-casting containment. `false` for fewer than 3 vertices.
///
/// Points exactly on an edge may land on either side.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i].lng, polygon[i].lat);
        let (xj, yj) = (polygon[j].lng, polygon[j].lat);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Copy of `points` with the first point appended when the ring is not
/// already closed (bit-identical first and last). Empty stays empty.
pub fn close_ring(points: &[Point]) -> Vec<Point> {
    let mut out = points.to_vec();
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if points.len() > 1 && !first.bit_eq(last) {
            out.push(*first);
        }
    }
    out
}

/// Drop a trailing point that duplicates the first (inverse of `close_ring`).
pub fn open_ring(points: &[Point]) -> Vec<Point> {
    let mut out = points.to_vec();
    let closed = match (out.first(), out.last()) {
        (Some(first), Some(last)) => out.len() > 1 && first.bit_eq(last),
        _ => false,
    };
    if closed {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests;
