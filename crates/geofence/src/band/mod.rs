//! BandGenerator: derive a structure's trigger band.
//!
//! Two algorithms, picked by which boundaries exist:
//! - Midpoint correspondence between two polygons (outer boundary and inner
//!   walking boundary), aligned by a `VertexMatcher`.
//! - Offset corridor of fixed thickness around a single path.
//!
//! The engine has no notion of an editing "mode": `regenerate_band` is a pure
//! function of the boundaries, and callers that draw the band by hand store it
//! directly on the structure instead.
//!
//! Code cross-refs: `geomath::{sort_by_angle_from_centroid, perpendicular_offset, midpoint}`,
//! `cfg::EngineCfg::{half_width_degrees, lng_scale_at}`.

mod matcher;

pub use matcher::{AngleSortMatcher, Correspondence, VertexMatcher};

use crate::cfg::EngineCfg;
use crate::error::BandError;
use crate::geomath::{self, perpendicular_offset_scaled, Point};
use crate::structure::Structure;

/// Midpoint band between `outer` and `inner` using angle-sort alignment.
///
/// Empty unless both inputs have 3 or more vertices. Output has
/// `min(len(outer), len(inner))` points, plus one if the ring needed closing.
pub fn band_between_polygons(outer: &[Point], inner: &[Point]) -> Vec<Point> {
    band_between_polygons_with(&AngleSortMatcher, outer, inner)
}

/// `band_between_polygons` with a caller-chosen vertex matcher.
pub fn band_between_polygons_with<M: VertexMatcher + ?Sized>(
    matcher: &M,
    outer: &[Point],
    inner: &[Point],
) -> Vec<Point> {
    if outer.len() < 3 || inner.len() < 3 {
        return Vec::new();
    }
    let corr = matcher.correspond(outer, inner);
    let mids: Vec<Point> = corr
        .pairs
        .iter()
        .map(|&(i, j)| geomath::midpoint(corr.outer[i], corr.inner[j]))
        .collect();
    geomath::close_ring(&mids)
}

/// Corridor of `thickness_m` around `path` with the default (fixed) degree
/// conversion.
pub fn band_around_path(path: &[Point], thickness_m: f64) -> Vec<Point> {
    band_around_path_cfg(path, thickness_m, &EngineCfg::default())
}

/// Corridor of `thickness_m` around `path`.
///
/// Walks the path forward emitting left offsets, then backward emitting right
/// offsets, and closes the ring at the first emitted point. Each vertex uses
/// the perpendicular of its outgoing segment (the last vertex uses its
/// incoming one). Empty for fewer than 2 points. Output has `2 * len + 1`
/// points.
pub fn band_around_path_cfg(path: &[Point], thickness_m: f64, cfg: &EngineCfg) -> Vec<Point> {
    if path.len() < 2 {
        return Vec::new();
    }
    let half = cfg.half_width_degrees(thickness_m);
    let mean_lat = geomath::centroid(path).map(|c| c.lat).unwrap_or(0.0);
    let k = cfg.lng_scale_at(mean_lat);
    let last = path.len() - 1;
    let offsets: Vec<Point> = (0..path.len())
        .map(|i| {
            let (a, b) = if i < last { (i, i + 1) } else { (i - 1, i) };
            perpendicular_offset_scaled(path[a], path[b], half, k)
        })
        .collect();
    let mut ring = Vec::with_capacity(2 * path.len() + 1);
    for (p, off) in path.iter().zip(&offsets) {
        ring.push(p.offset_by(*off));
    }
    for (p, off) in path.iter().zip(&offsets).rev() {
        ring.push(p.offset_against(*off));
    }
    ring.push(ring[0]);
    ring
}

/// Band derived from the structure's current boundaries.
///
/// Both boundaries are polygons → midpoint band. Otherwise a walk path of 2+
/// points → corridor at the band's thickness. Otherwise empty.
pub fn regenerate_band(structure: &Structure, cfg: &EngineCfg) -> Vec<Point> {
    if structure.has_boundary_polygon() && structure.has_walk_polygon() {
        band_between_polygons(&structure.map_points, &structure.walk_points)
    } else if structure.walk_points.len() >= 2 {
        band_around_path_cfg(&structure.walk_points, structure.trigger_band.thickness, cfg)
    } else {
        Vec::new()
    }
}

/// Check a band thickness in meters.
pub fn validate_thickness(thickness: f64) -> Result<f64, BandError> {
    if thickness.is_finite() && thickness > 0.0 {
        Ok(thickness)
    } else {
        Err(BandError::InvalidThickness(thickness))
    }
}

/// New thickness for the band. With 2+ band points the existing band line is
/// re-skinned as a corridor path; the map/walk boundaries are not consulted.
pub fn update_thickness(
    structure: &Structure,
    thickness: f64,
    cfg: &EngineCfg,
) -> Result<Structure, BandError> {
    let thickness = validate_thickness(thickness)?;
    let mut out = structure.clone();
    out.trigger_band.thickness = thickness;
    if out.trigger_band.points.len() >= 2 {
        out.trigger_band.points = band_around_path_cfg(&structure.trigger_band.points, thickness, cfg);
    }
    out.touch();
    Ok(out)
}

#[cfg(test)]
mod tests;
