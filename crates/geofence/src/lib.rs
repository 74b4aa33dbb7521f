//! Campus geofence engine.
//!
//! Structures (buildings, areas) carry up to three boundaries in WGS84
//! degrees: an outer map boundary, an inner walk boundary or path, and a
//! trigger band between them. Triggers attach notification rules to a
//! structure. `Workspace` owns everything and enforces the invariants.
//!
//! Layout
//! - `geomath`: points, centroid/angle sorting, offsets, area, containment.
//! - `band`: trigger-band generation (midpoint band, path corridor).
//! - `structure`: the `Structure` record and its parent forest.
//! - `trigger`: membership/permanence rules, validation, `TriggerBook`.
//! - `history`: undo log for additive point edits.
//! - `exchange`: structure JSON envelope and GeoJSON import/export.
//! - `workspace`: the owning scope tying the above together.
//!
//! Geometry is planar on raw degrees except `geomath::area_square_meters`.
//! No polygon validity checks (self-intersection, winding) are made.

pub mod band;
pub mod cfg;
pub mod error;
pub mod exchange;
pub mod geomath;
pub mod history;
mod ids;
pub mod structure;
pub mod trigger;
pub mod workspace;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::{CorridorScale, EngineCfg};
pub use error::{BandError, ExchangeError, StructureError, TriggerError};
pub use geomath::Point;
pub use structure::{Structure, StructureType, TriggerBand};
pub use trigger::{Trigger, TriggerBook, TriggerDraft, TriggerKind, TriggerType};
pub use workspace::{DeleteMode, NewStructure, StructureDetails, Workspace};

/// Common exports for callers that drive a `Workspace`.
pub mod prelude {
    pub use crate::band::{band_around_path, band_between_polygons, regenerate_band};
    pub use crate::cfg::{CorridorScale, EngineCfg};
    pub use crate::error::{BandError, ExchangeError, StructureError, TriggerError};
    pub use crate::exchange::{export_geojson, export_structures, import_structures};
    pub use crate::geomath::{
        area_square_meters, centroid, point_in_polygon, sort_by_angle_from_centroid, Point,
    };
    pub use crate::structure::{build_forest, Structure, StructureType, TreeNode};
    pub use crate::trigger::{Trigger, TriggerDraft, TriggerKind, TriggerType};
    pub use crate::workspace::{DeleteMode, NewStructure, StructureDetails, Workspace};
}
