//! Engine configuration and fixed constants.
//!
//! Policy
//! - Constants live here so geometry code never hard-codes a magic number.
//! - `EngineCfg` is `Deserialize` with field defaults; a partial JSON file
//!   overrides only what it names.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the equirectangular area projection.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Meters per degree of latitude used by the corridor thickness conversion.
pub const METERS_PER_DEGREE: f64 = 111_000.0;
/// Band thickness assigned to new structures when none is given.
pub const DEFAULT_BAND_THICKNESS_M: f64 = 10.0;
/// Version tag written into export envelopes.
pub const EXPORT_VERSION: &str = "1.0";

/// How corridor thickness in meters becomes a degree offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CorridorScale {
    /// `meters / 111000 / 2` on both axes, latitude independent. Drifts for
    /// east-west paths away from the equator.
    #[default]
    Fixed,
    /// Same latitude offset, longitude stretched by `1 / cos(lat)` at the
    /// path's mean latitude.
    Latitude,
}

/// Engine-wide configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineCfg {
    pub earth_radius_m: f64,
    pub meters_per_degree: f64,
    pub default_band_thickness_m: f64,
    pub corridor_scale: CorridorScale,
    /// Written into `metadata.appVersion` of structure exports.
    pub app_version: String,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            earth_radius_m: EARTH_RADIUS_M,
            meters_per_degree: METERS_PER_DEGREE,
            default_band_thickness_m: DEFAULT_BAND_THICKNESS_M,
            corridor_scale: CorridorScale::Fixed,
            app_version: crate::VERSION.to_string(),
        }
    }
}

impl EngineCfg {
    /// Half-width of a corridor in degrees of latitude.
    #[inline]
    pub fn half_width_degrees(&self, thickness_m: f64) -> f64 {
        thickness_m / self.meters_per_degree / 2.0
    }

    /// Longitude compression applied to corridor offsets at `lat_deg`.
    #[inline]
    pub fn lng_scale_at(&self, lat_deg: f64) -> f64 {
        match self.corridor_scale {
            CorridorScale::Fixed => 1.0,
            CorridorScale::Latitude => lat_deg.to_radians().cos(),
        }
    }
}
