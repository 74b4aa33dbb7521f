//! GeoJSON `FeatureCollection` export and import.
//!
//! One feature per non-empty boundary, tagged by `properties.boundaryType`
//! (`mapPoints`, `walkPoints`, `triggerBand`). Positions are `[lng, lat]`.
//! Polygon rings are closed (last position repeats the first); import strips
//! the closing position again for boundaries. Band features carry
//! `ringClosed` so a band stored closed comes back closed.

use serde_json::{json, Map, Value};
use tracing::warn;

use super::{BandRecord, StructureRecord};
use crate::geomath::{close_ring, open_ring, Point};
use crate::structure::Structure;

const MAP_POINTS: &str = "mapPoints";
const WALK_POINTS: &str = "walkPoints";
const TRIGGER_BAND: &str = "triggerBand";

fn positions(points: &[Point]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.lng, p.lat]).collect()
}

fn polygon(points: &[Point]) -> Value {
    json!({ "type": "Polygon", "coordinates": [positions(&close_ring(points))] })
}

fn line_string(points: &[Point]) -> Value {
    json!({ "type": "LineString", "coordinates": positions(points) })
}

fn feature(s: &Structure, boundary: &str, geometry: Value) -> Value {
    let mut props = json!({
        "code": s.code,
        "name": s.name,
        "description": s.description,
        "type": s.kind.as_str(),
        "parentId": s.parent_id,
        "boundaryType": boundary,
        "lastModified": s.last_modified,
    });
    if boundary == TRIGGER_BAND {
        let band = &s.trigger_band.points;
        let closed = match (band.first(), band.last()) {
            (Some(first), Some(last)) => band.len() > 1 && first.bit_eq(last),
            _ => false,
        };
        props["thickness"] = json!(s.trigger_band.thickness);
        props["ringClosed"] = json!(closed);
    }
    json!({ "type": "Feature", "properties": props, "geometry": geometry })
}

/// GeoJSON export. Walk points become a `LineString` unless `force_polygon`
/// is set and there are 3 or more of them. Boundaries with too few points for
/// their geometry are left out.
pub fn export_geojson(structures: &[Structure], force_polygon: bool) -> Value {
    let mut features = Vec::new();
    for s in structures {
        if s.map_points.len() >= 3 {
            features.push(feature(s, MAP_POINTS, polygon(&s.map_points)));
        }
        if force_polygon && s.walk_points.len() >= 3 {
            features.push(feature(s, WALK_POINTS, polygon(&s.walk_points)));
        } else if s.walk_points.len() >= 2 {
            features.push(feature(s, WALK_POINTS, line_string(&s.walk_points)));
        }
        if s.trigger_band.points.len() >= 3 {
            features.push(feature(s, TRIGGER_BAND, polygon(&s.trigger_band.points)));
        }
    }
    json!({ "type": "FeatureCollection", "features": features })
}

fn read_positions(v: &Value) -> Option<Vec<Point>> {
    v.as_array()?
        .iter()
        .map(|pos| {
            let pos = pos.as_array()?;
            Some(Point::new(pos.get(1)?.as_f64()?, pos.first()?.as_f64()?))
        })
        .collect()
}

/// Geometry points plus whether it was a polygon. Polygon rings come back
/// as written, closing position included.
fn read_geometry(geometry: &Value) -> Option<(Vec<Point>, bool)> {
    let coords = geometry.get("coordinates")?;
    match geometry.get("type")?.as_str()? {
        "Polygon" => {
            let ring = coords.as_array()?.first()?;
            Some((read_positions(ring)?, true))
        }
        "LineString" => Some((read_positions(coords)?, false)),
        _ => None,
    }
}

fn text(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Group features by `code` (or `structureId`) and merge their geometries
/// per `boundaryType`. Features without a usable geometry are counted as
/// skipped.
pub(crate) fn records_from_features(features: &[Value]) -> (Vec<StructureRecord>, usize) {
    let mut keys: Vec<Option<String>> = Vec::new();
    let mut records: Vec<StructureRecord> = Vec::new();
    let mut skipped = 0;
    let empty = Map::new();

    for f in features {
        let props = f.get("properties").and_then(Value::as_object).unwrap_or(&empty);
        let Some((points, is_polygon)) = f.get("geometry").and_then(read_geometry) else {
            warn!("import: feature without Polygon/LineString geometry skipped");
            skipped += 1;
            continue;
        };
        let key = text(props, "code").or_else(|| text(props, "structureId"));
        // Features without a code never merge with each other.
        let idx = match key.as_ref().and_then(|k| keys.iter().position(|x| x.as_ref() == Some(k))) {
            Some(i) => i,
            None => {
                keys.push(key.clone());
                records.push(StructureRecord {
                    code: key,
                    ..StructureRecord::default()
                });
                records.len() - 1
            }
        };
        let r = &mut records[idx];
        r.name = r.name.take().or_else(|| text(props, "name"));
        r.description = r.description.take().or_else(|| text(props, "description"));
        r.kind = r.kind.take().or_else(|| text(props, "type"));
        r.parent_id = r.parent_id.take().or_else(|| text(props, "parentId"));
        if r.last_modified.is_none() {
            r.last_modified = props
                .get("lastModified")
                .and_then(|v| serde_json::from_value(v.clone()).ok());
        }
        let fallback = if is_polygon { MAP_POINTS } else { WALK_POINTS };
        let boundary = text(props, "boundaryType").unwrap_or_else(|| fallback.to_string());
        match boundary.as_str() {
            TRIGGER_BAND => {
                let thickness = props.get("thickness").and_then(Value::as_f64);
                let stored_open = props.get("ringClosed").and_then(Value::as_bool) == Some(false);
                let points = if is_polygon && stored_open {
                    open_ring(&points)
                } else {
                    points
                };
                r.trigger_band = Some(BandRecord { points, thickness });
            }
            WALK_POINTS if is_polygon => r.walk_points = open_ring(&points),
            WALK_POINTS => r.walk_points = points,
            _ if is_polygon => r.map_points = open_ring(&points),
            _ => r.map_points = points,
        }
    }
    (records, skipped)
}
