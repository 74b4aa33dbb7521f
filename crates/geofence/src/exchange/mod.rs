//! Structure import/export payloads.
//!
//! Export
//! - Versioned envelope `{version, structures, metadata{exportedAt, appVersion}}`.
//! - GeoJSON `FeatureCollection`, one feature per non-empty boundary (`geojson`).
//!
//! Import accepts, in priority order: the versioned envelope, a
//! metadata-wrapped variant (`{metadata, structures}` without a version, or
//! `{data: [...]}`), a GeoJSON `FeatureCollection`, a bare array, or a single
//! structure object. Records are normalized on the way in: codes are
//! case-normalized, and missing or duplicate codes get a fresh generated
//! code; missing optional fields are backfilled. Anything else is
//! `ExchangeError::UnsupportedFormat`.

pub mod geojson;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::band::validate_thickness;
use crate::cfg::{EngineCfg, EXPORT_VERSION};
use crate::error::ExchangeError;
use crate::geomath::Point;
use crate::ids;
use crate::structure::{normalize_code, Structure, StructureType, TriggerBand};

pub use geojson::export_geojson;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureExport {
    pub version: String,
    pub structures: Vec<Structure>,
    pub metadata: StructureExportMetadata,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub app_version: String,
}

/// Which payload shape an import recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportFormat {
    Envelope,
    MetadataWrapped,
    GeoJson,
    Array,
    Single,
}

/// A code that changed during import. `from` is `None` when the record had
/// no usable code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeRename {
    pub from: Option<String>,
    pub to: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportedStructures {
    pub format: ImportFormat,
    pub structures: Vec<Structure>,
    pub renamed: Vec<CodeRename>,
    /// Records that could not be read at all.
    pub skipped: usize,
}

/// Lenient view of one structure-like object.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct StructureRecord {
    #[serde(alias = "structureId")]
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub parent_id: Option<String>,
    pub map_points: Vec<Point>,
    pub walk_points: Vec<Point>,
    pub trigger_band: Option<BandRecord>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BandRecord {
    pub points: Vec<Point>,
    pub thickness: Option<f64>,
}

/// Versioned envelope of `structures`.
pub fn export_structures(structures: &[Structure], cfg: &EngineCfg) -> StructureExport {
    StructureExport {
        version: EXPORT_VERSION.to_string(),
        structures: structures.to_vec(),
        metadata: StructureExportMetadata {
            exported_at: Utc::now(),
            app_version: cfg.app_version.clone(),
        },
    }
}

/// Parse `json` in any supported shape. `existing` codes count as taken.
pub fn import_structures(
    json: &str,
    existing: &[Structure],
    cfg: &EngineCfg,
) -> Result<ImportedStructures, ExchangeError> {
    import_structures_with_rng(json, existing, cfg, &mut rand::thread_rng())
}

pub fn import_structures_with_rng<R: Rng + ?Sized>(
    json: &str,
    existing: &[Structure],
    cfg: &EngineCfg,
    rng: &mut R,
) -> Result<ImportedStructures, ExchangeError> {
    let value: Value = serde_json::from_str(json)?;
    let (format, records, skipped) = detect(value)?;
    debug!(?format, records = records.len(), skipped, "import payload recognized");
    let (structures, renamed) = normalize_records(records, existing, cfg, rng);
    if !renamed.is_empty() {
        info!(count = renamed.len(), "import assigned new structure codes");
    }
    Ok(ImportedStructures {
        format,
        structures,
        renamed,
        skipped,
    })
}

fn is_structure_like(v: &Value) -> bool {
    ["code", "structureId", "name", "mapPoints", "walkPoints"]
        .iter()
        .any(|k| v.get(k).is_some())
}

/// Records out of raw values; unreadable ones are counted and dropped.
fn read_records(values: Vec<Value>) -> (Vec<StructureRecord>, usize) {
    let mut skipped = 0;
    let records = values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<StructureRecord>(v) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(error = %e, "import: unreadable structure record skipped");
                skipped += 1;
                None
            }
        })
        .collect();
    (records, skipped)
}

fn detect(value: Value) -> Result<(ImportFormat, Vec<StructureRecord>, usize), ExchangeError> {
    let array_at = |v: &Value, key: &str| v.get(key).and_then(Value::as_array).cloned();

    if value.get("version").is_some() {
        if let Some(items) = array_at(&value, "structures") {
            let (r, s) = read_records(items);
            return Ok((ImportFormat::Envelope, r, s));
        }
    }
    if let Some(items) = array_at(&value, "structures")
        .or_else(|| array_at(&value, "data"))
        .or_else(|| value.get("data").and_then(|d| array_at(d, "structures")))
    {
        let (r, s) = read_records(items);
        return Ok((ImportFormat::MetadataWrapped, r, s));
    }
    if value.get("type").and_then(Value::as_str) == Some("FeatureCollection") {
        if let Some(features) = array_at(&value, "features") {
            let (r, s) = geojson::records_from_features(&features);
            return Ok((ImportFormat::GeoJson, r, s));
        }
    }
    if let Value::Array(items) = value {
        let (r, s) = read_records(items);
        return Ok((ImportFormat::Array, r, s));
    }
    if value.is_object() && is_structure_like(&value) {
        let (r, s) = read_records(vec![value]);
        return Ok((ImportFormat::Single, r, s));
    }
    Err(ExchangeError::UnsupportedFormat(
        "expected a structure envelope, GeoJSON FeatureCollection, array or structure object"
            .into(),
    ))
}

fn fresh_code<R: Rng + ?Sized>(taken: &HashSet<String>, rng: &mut R) -> String {
    loop {
        let code = ids::structure_code(rng);
        if !taken.contains(&code) {
            return code;
        }
    }
}

fn normalize_records<R: Rng + ?Sized>(
    records: Vec<StructureRecord>,
    existing: &[Structure],
    cfg: &EngineCfg,
    rng: &mut R,
) -> (Vec<Structure>, Vec<CodeRename>) {
    let mut taken: HashSet<String> = existing.iter().map(|s| s.code.clone()).collect();
    let mut renamed = Vec::new();
    let mut out = Vec::with_capacity(records.len());
    // Incoming code -> stored code; the first record carrying a code wins.
    let mut remap: HashMap<String, String> = HashMap::new();

    for r in records {
        let raw = r.code.as_deref().map(normalize_code).filter(|c| !c.is_empty());
        let key = raw.clone();
        let code = match raw {
            Some(c) if !taken.contains(&c) => c,
            other => {
                let to = fresh_code(&taken, rng);
                renamed.push(CodeRename {
                    from: other,
                    to: to.clone(),
                });
                to
            }
        };
        taken.insert(code.clone());
        if let Some(k) = key {
            remap.entry(k).or_insert_with(|| code.clone());
        }

        let band = r.trigger_band.unwrap_or_default();
        let thickness = band
            .thickness
            .and_then(|t| validate_thickness(t).ok())
            .unwrap_or(cfg.default_band_thickness_m);
        out.push(Structure {
            name: r.name.unwrap_or_else(|| code.clone()),
            code,
            description: r.description.unwrap_or_default(),
            kind: r.kind.map(StructureType::from).unwrap_or_default(),
            parent_id: r
                .parent_id
                .as_deref()
                .map(normalize_code)
                .filter(|p| !p.is_empty()),
            map_points: r.map_points,
            walk_points: r.walk_points,
            trigger_band: TriggerBand {
                points: band.points,
                thickness,
            },
            last_modified: r.last_modified.unwrap_or_else(Utc::now),
        });
    }

    // Parent links inside the payload follow their renamed targets.
    for s in out.iter_mut() {
        if let Some(p) = s.parent_id.as_mut() {
            if let Some(to) = remap.get(p.as_str()) {
                p.clone_from(to);
            }
        }
    }
    repair_parents(&mut out, &taken);
    (out, renamed)
}

/// Drop parent links that point nowhere, at the structure itself, or close a
/// cycle among the imported records.
fn repair_parents(structures: &mut [Structure], known: &HashSet<String>) {
    for i in 0..structures.len() {
        let Some(p) = structures[i].parent_id.clone() else {
            continue;
        };
        let dangling = !known.contains(&p) || p == structures[i].code;
        if dangling || closes_cycle(structures, i) {
            warn!(code = %structures[i].code, parent = %p, "import: parent link dropped");
            structures[i].parent_id = None;
        }
    }
}

/// Whether following parents from `structures[i]` returns to it.
fn closes_cycle(structures: &[Structure], i: usize) -> bool {
    let start = structures[i].code.as_str();
    let mut seen = HashSet::new();
    let mut cur = structures[i].parent_id.as_deref();
    while let Some(p) = cur {
        if p == start {
            return true;
        }
        if !seen.insert(p) {
            return false;
        }
        cur = structures
            .iter()
            .find(|s| s.code == p)
            .and_then(|s| s.parent_id.as_deref());
    }
    false
}
