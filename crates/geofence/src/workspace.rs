//! `Workspace`: the owning scope for structures, triggers and undo history.
//!
//! All mutation goes through here so the invariants hold regardless of the
//! caller: unique normalized codes, acyclic parents, positive band
//! thickness, validated duplicate-free triggers. Failed calls leave state
//! untouched.
//!
//! The workspace is a plain owned value with no interior locking; a
//! concurrent host keeps it behind one mutex or inside one task.

use tracing::{debug, info};

use crate::band;
use crate::cfg::EngineCfg;
use crate::error::{ExchangeError, StructureError, TriggerError};
use crate::exchange::{self, ImportedStructures, StructureExport};
use crate::geomath::Point;
use crate::history::{HistoryAction, HistoryLog};
use crate::structure::{self, normalize_code, Relationships, Structure, StructureType, TreeNode};
use crate::trigger::{ImportOutcome, Trigger, TriggerBook, TriggerDraft, TriggerExport};

/// What happens to children when a structure is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeleteMode {
    /// Children become roots.
    #[default]
    Detach,
    /// Children and all their descendants are deleted too.
    Cascade,
}

/// Fields for a new structure.
#[derive(Clone, Debug, Default)]
pub struct NewStructure {
    pub code: String,
    pub name: String,
    pub description: String,
    pub kind: StructureType,
    pub parent_id: Option<String>,
    /// `None` uses `EngineCfg::default_band_thickness_m`.
    pub thickness: Option<f64>,
}

/// Editable descriptive fields; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct StructureDetails {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<StructureType>,
}

/// Where a point falls relative to one structure.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement<'a> {
    pub structure: &'a Structure,
    pub in_boundary: bool,
    pub in_band: bool,
    /// Active triggers attached to the structure.
    pub triggers: Vec<&'a Trigger>,
}

/// Boundary and band area of one structure, in m².
#[derive(Clone, Debug, PartialEq)]
pub struct AreaReport {
    pub code: String,
    pub boundary_m2: f64,
    pub band_m2: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Workspace {
    cfg: EngineCfg,
    structures: Vec<Structure>,
    triggers: TriggerBook,
    history: HistoryLog,
}

impl Workspace {
    pub fn new(cfg: EngineCfg) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    pub fn cfg(&self) -> &EngineCfg {
        &self.cfg
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn triggers(&self) -> &TriggerBook {
        &self.triggers
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn structure(&self, code: &str) -> Option<&Structure> {
        let code = normalize_code(code);
        self.structures.iter().find(|s| s.code == code)
    }

    fn index_of(&self, code: &str) -> Result<usize, StructureError> {
        let code = normalize_code(code);
        self.structures
            .iter()
            .position(|s| s.code == code)
            .ok_or(StructureError::NotFound(code))
    }

    // ---- structures -------------------------------------------------------

    pub fn create_structure(&mut self, new: NewStructure) -> Result<&Structure, StructureError> {
        let code = normalize_code(&new.code);
        if code.is_empty() {
            return Err(StructureError::EmptyCode);
        }
        if self.structure(&code).is_some() {
            return Err(StructureError::DuplicateCode(code));
        }
        let parent_id = new
            .parent_id
            .as_deref()
            .map(normalize_code)
            .filter(|p| !p.is_empty());
        if let Some(p) = parent_id.as_deref() {
            if self.structure(p).is_none() {
                return Err(StructureError::UnknownParent(p.to_string()));
            }
        }
        let thickness =
            band::validate_thickness(new.thickness.unwrap_or(self.cfg.default_band_thickness_m))?;
        let mut s = Structure::new(&code, new.name, thickness);
        s.description = new.description;
        s.kind = new.kind;
        s.parent_id = parent_id;
        info!(code = %s.code, parent = ?s.parent_id, "structure created");
        self.structures.push(s);
        Ok(&self.structures[self.structures.len() - 1])
    }

    pub fn update_details(
        &mut self,
        code: &str,
        details: StructureDetails,
    ) -> Result<&Structure, StructureError> {
        let idx = self.index_of(code)?;
        let s = &mut self.structures[idx];
        if let Some(name) = details.name {
            s.name = name;
        }
        if let Some(description) = details.description {
            s.description = description;
        }
        if let Some(kind) = details.kind {
            s.kind = kind;
        }
        s.touch();
        Ok(&self.structures[idx])
    }

    /// Delete `code`; returns the removed codes, `code` first. Triggers are
    /// left in place and become orphaned.
    pub fn delete_structure(
        &mut self,
        code: &str,
        mode: DeleteMode,
    ) -> Result<Vec<String>, StructureError> {
        let idx = self.index_of(code)?;
        let code = self.structures[idx].code.clone();
        let mut removed = vec![code.clone()];
        if mode == DeleteMode::Cascade {
            removed.extend(
                structure::descendants(&code, &self.structures)
                    .into_iter()
                    .map(|s| s.code.clone()),
            );
        }
        self.structures.retain(|s| !removed.contains(&s.code));
        for s in self.structures.iter_mut() {
            if s.parent_id.as_deref().is_some_and(|p| removed.iter().any(|r| r == p)) {
                s.parent_id = None;
                s.touch();
            }
        }
        info!(code = %code, ?mode, removed = removed.len(), "structure deleted");
        Ok(removed)
    }

    // ---- hierarchy --------------------------------------------------------

    pub fn set_parent(&mut self, child: &str, parent: Option<&str>) -> Result<(), StructureError> {
        structure::set_parent(&mut self.structures, child, parent)
    }

    pub fn can_reparent(&self, child: &str, parent: Option<&str>) -> bool {
        structure::can_reparent(child, parent, &self.structures)
    }

    pub fn forest(&self) -> Vec<TreeNode<'_>> {
        structure::build_forest(&self.structures)
    }

    pub fn relationships(&self, code: &str) -> Option<Relationships<'_>> {
        structure::relationships(code, &self.structures)
    }

    // ---- point editing ----------------------------------------------------

    fn add_point(
        &mut self,
        code: &str,
        action: HistoryAction,
        p: Point,
    ) -> Result<&Structure, StructureError> {
        let idx = self.index_of(code)?;
        let s = &mut self.structures[idx];
        let prior = s.last_modified;
        match action {
            HistoryAction::AddMapPoint => s.map_points.push(p),
            HistoryAction::AddWalkPoint => s.walk_points.push(p),
            HistoryAction::AddTriggerPoint => s.trigger_band.points.push(p),
        }
        s.touch();
        self.history.record(action, &s.code, p, prior);
        Ok(&self.structures[idx])
    }

    /// Append to the outer boundary (undoable).
    pub fn add_map_point(&mut self, code: &str, p: Point) -> Result<&Structure, StructureError> {
        self.add_point(code, HistoryAction::AddMapPoint, p)
    }

    /// Append to the walk boundary/path (undoable).
    pub fn add_walk_point(&mut self, code: &str, p: Point) -> Result<&Structure, StructureError> {
        self.add_point(code, HistoryAction::AddWalkPoint, p)
    }

    /// Append to the hand-drawn band (undoable).
    pub fn add_band_point(&mut self, code: &str, p: Point) -> Result<&Structure, StructureError> {
        self.add_point(code, HistoryAction::AddTriggerPoint, p)
    }

    pub fn set_map_points(
        &mut self,
        code: &str,
        points: Vec<Point>,
    ) -> Result<&Structure, StructureError> {
        let idx = self.index_of(code)?;
        let s = &mut self.structures[idx];
        s.map_points = points;
        s.touch();
        Ok(&self.structures[idx])
    }

    pub fn set_walk_points(
        &mut self,
        code: &str,
        points: Vec<Point>,
    ) -> Result<&Structure, StructureError> {
        let idx = self.index_of(code)?;
        let s = &mut self.structures[idx];
        s.walk_points = points;
        s.touch();
        Ok(&self.structures[idx])
    }

    /// Store a band drawn or edited by the caller, bypassing regeneration.
    pub fn set_band_points(
        &mut self,
        code: &str,
        points: Vec<Point>,
    ) -> Result<&Structure, StructureError> {
        let idx = self.index_of(code)?;
        let s = &mut self.structures[idx];
        s.trigger_band.points = points;
        s.touch();
        Ok(&self.structures[idx])
    }

    /// Recompute the band from the current boundaries and store it.
    pub fn regenerate_band(&mut self, code: &str) -> Result<&Structure, StructureError> {
        let idx = self.index_of(code)?;
        let points = band::regenerate_band(&self.structures[idx], &self.cfg);
        let s = &mut self.structures[idx];
        debug!(code = %s.code, points = points.len(), "band regenerated");
        s.trigger_band.points = points;
        s.touch();
        Ok(&self.structures[idx])
    }

    pub fn set_band_thickness(
        &mut self,
        code: &str,
        thickness: f64,
    ) -> Result<&Structure, StructureError> {
        let idx = self.index_of(code)?;
        let updated = band::update_thickness(&self.structures[idx], thickness, &self.cfg)?;
        self.structures[idx] = updated;
        Ok(&self.structures[idx])
    }

    /// Revert the most recent additive point edit and restore the structure's
    /// prior `last_modified`. `None` when the log is empty or the edited
    /// structure no longer exists (the entry is consumed either way).
    pub fn undo(&mut self) -> Option<&Structure> {
        let entry = self.history.pop()?;
        let Some(idx) = self
            .structures
            .iter()
            .position(|s| s.code == entry.structure_code)
        else {
            debug!(code = %entry.structure_code, "undo target gone, entry dropped");
            return None;
        };
        let s = &mut self.structures[idx];
        match entry.action_type {
            HistoryAction::AddMapPoint => {
                s.map_points.pop();
                if s.map_points.len() < 3 {
                    s.trigger_band.points.clear();
                }
            }
            HistoryAction::AddWalkPoint => {
                s.walk_points.pop();
                if s.walk_points.len() < 3 {
                    s.trigger_band.points.clear();
                }
            }
            HistoryAction::AddTriggerPoint => {
                s.trigger_band.points.pop();
            }
        }
        s.last_modified = entry.prior_modified;
        Some(&self.structures[idx])
    }

    // ---- geometry queries -------------------------------------------------

    /// Structures whose boundary or band contains `p`, with their active
    /// triggers.
    pub fn locate(&self, p: Point) -> Vec<Placement<'_>> {
        self.structures
            .iter()
            .filter_map(|s| {
                let in_boundary = s.boundary_contains(p);
                let in_band = s.band_contains(p);
                if !(in_boundary || in_band) {
                    return None;
                }
                let triggers = self
                    .triggers
                    .for_structure(&s.code)
                    .filter(|t| t.is_active)
                    .collect();
                Some(Placement {
                    structure: s,
                    in_boundary,
                    in_band,
                    triggers,
                })
            })
            .collect()
    }

    pub fn areas(&self) -> Vec<AreaReport> {
        let r = self.cfg.earth_radius_m;
        self.structures
            .iter()
            .map(|s| AreaReport {
                code: s.code.clone(),
                boundary_m2: s.boundary_area_m2(r),
                band_m2: s.band_area_m2(r),
            })
            .collect()
    }

    // ---- triggers ---------------------------------------------------------

    /// Create a trigger for an existing structure.
    pub fn create_trigger(&mut self, draft: TriggerDraft) -> Result<&Trigger, TriggerError> {
        if self.structure(&draft.structure_code).is_none() {
            return Err(TriggerError::UnknownStructure(normalize_code(
                &draft.structure_code,
            )));
        }
        self.triggers.create(draft)
    }

    pub fn update_trigger(&mut self, id: &str, draft: TriggerDraft) -> Result<&Trigger, TriggerError> {
        if self.structure(&draft.structure_code).is_none() {
            return Err(TriggerError::UnknownStructure(normalize_code(
                &draft.structure_code,
            )));
        }
        self.triggers.update(id, draft)
    }

    pub fn set_trigger_active(&mut self, id: &str, active: bool) -> Result<&Trigger, TriggerError> {
        self.triggers.set_active(id, active)
    }

    pub fn delete_trigger(&mut self, id: &str) -> Result<Trigger, TriggerError> {
        self.triggers.delete(id)
    }

    /// Active triggers of a structure, or none if the structure is gone.
    pub fn active_triggers(&self, code: &str) -> Vec<&Trigger> {
        if self.structure(code).is_none() {
            return Vec::new();
        }
        self.triggers.for_structure(code).filter(|t| t.is_active).collect()
    }

    pub fn orphaned_triggers(&self) -> Vec<&Trigger> {
        self.triggers.orphaned(&self.structures)
    }

    pub fn prune_orphaned_triggers(&mut self) -> Vec<Trigger> {
        self.triggers.prune_orphans(&self.structures)
    }

    // ---- exchange ---------------------------------------------------------

    pub fn export_structures(&self) -> StructureExport {
        exchange::export_structures(&self.structures, &self.cfg)
    }

    pub fn export_geojson(&self, force_polygon: bool) -> serde_json::Value {
        exchange::export_geojson(&self.structures, force_polygon)
    }

    /// Parse and append structures. Codes already present are renamed in the
    /// incoming records, never overwritten.
    pub fn import_structures(&mut self, json: &str) -> Result<ImportedStructures, ExchangeError> {
        let imported = exchange::import_structures(json, &self.structures, &self.cfg)?;
        self.structures.extend(imported.structures.iter().cloned());
        info!(
            format = ?imported.format,
            added = imported.structures.len(),
            renamed = imported.renamed.len(),
            "structures imported"
        );
        Ok(imported)
    }

    pub fn export_triggers(&self) -> TriggerExport {
        self.triggers.export_all()
    }

    pub fn import_triggers(&mut self, json: &str, replace_all: bool) -> Result<ImportOutcome, ExchangeError> {
        self.triggers.import_json(json, replace_all)
    }
}

#[cfg(test)]
mod tests;
