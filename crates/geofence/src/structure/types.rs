//! Structure record and its trigger band.
//!
//! - `Structure`: a named geofenced entity keyed by a normalized `code`.
//! - `TriggerBand`: derived corridor points plus a thickness in meters.
//! - `StructureType`: small open enum; unknown labels collapse to `Other`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geomath::{self, Point};

/// Category of a structure. Serialized as a lowercase label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StructureType {
    Academic,
    Residential,
    Administrative,
    Services,
    Sports,
    #[default]
    Other,
}

impl StructureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureType::Academic => "academic",
            StructureType::Residential => "residential",
            StructureType::Administrative => "administrative",
            StructureType::Services => "services",
            StructureType::Sports => "sports",
            StructureType::Other => "other",
        }
    }
}

impl From<String> for StructureType {
    fn from(s: String) -> Self {
        StructureType::from(s.as_str())
    }
}

impl From<&str> for StructureType {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "academic" => StructureType::Academic,
            "residential" => StructureType::Residential,
            "administrative" => StructureType::Administrative,
            "services" => StructureType::Services,
            "sports" => StructureType::Sports,
            _ => StructureType::Other,
        }
    }
}

impl From<StructureType> for String {
    fn from(t: StructureType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for StructureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification corridor. `points` is empty until generated or drawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerBand {
    #[serde(default)]
    pub points: Vec<Point>,
    /// Meters, always `> 0`.
    pub thickness: f64,
}

impl TriggerBand {
    pub fn empty(thickness: f64) -> Self {
        Self {
            points: Vec::new(),
            thickness,
        }
    }
}

/// A named geofenced entity.
///
/// Invariants (upheld by `Workspace`, not by this plain record):
/// - `code` is normalized (`normalize_code`) and unique.
/// - `parent_id`, if set, names an existing structure and never closes a cycle.
/// - `trigger_band.thickness > 0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: StructureType,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Outer boundary; a polygon once it has 3 or more points.
    #[serde(default)]
    pub map_points: Vec<Point>,
    /// Inner boundary (3+ points) or an open walked path.
    #[serde(default)]
    pub walk_points: Vec<Point>,
    pub trigger_band: TriggerBand,
    pub last_modified: DateTime<Utc>,
}

impl Structure {
    /// New structure with empty geometry. `code` is normalized here.
    pub fn new(code: &str, name: impl Into<String>, thickness: f64) -> Self {
        Self {
            code: normalize_code(code),
            name: name.into(),
            description: String::new(),
            kind: StructureType::Other,
            parent_id: None,
            map_points: Vec::new(),
            walk_points: Vec::new(),
            trigger_band: TriggerBand::empty(thickness),
            last_modified: Utc::now(),
        }
    }

    #[inline]
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }

    #[inline]
    pub fn has_boundary_polygon(&self) -> bool {
        self.map_points.len() >= 3
    }

    #[inline]
    pub fn has_walk_polygon(&self) -> bool {
        self.walk_points.len() >= 3
    }

    /// Outer boundary area in m² (0 without a polygon).
    pub fn boundary_area_m2(&self, radius_m: f64) -> f64 {
        geomath::area_square_meters_with_radius(&self.map_points, radius_m)
    }

    /// Band area in m² (0 without a polygon).
    pub fn band_area_m2(&self, radius_m: f64) -> f64 {
        geomath::area_square_meters_with_radius(&self.trigger_band.points, radius_m)
    }

    #[inline]
    pub fn boundary_contains(&self, p: Point) -> bool {
        geomath::point_in_polygon(p, &self.map_points)
    }

    #[inline]
    pub fn band_contains(&self, p: Point) -> bool {
        geomath::point_in_polygon(p, &self.trigger_band.points)
    }
}

/// Canonical form of a structure code: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
