use super::*;
use crate::error::BandError;
use crate::trigger::TriggerType;

fn square(lat: f64, lng: f64, d: f64) -> Vec<Point> {
    vec![
        Point::new(lat, lng),
        Point::new(lat, lng + d),
        Point::new(lat + d, lng + d),
        Point::new(lat + d, lng),
    ]
}

fn named(code: &str, parent: Option<&str>) -> NewStructure {
    NewStructure {
        code: code.into(),
        name: format!("{code} hall"),
        parent_id: parent.map(str::to_string),
        ..NewStructure::default()
    }
}

fn campus() -> Workspace {
    let mut ws = Workspace::default();
    ws.create_structure(named("main", None)).unwrap();
    ws.create_structure(named("lib", Some("main"))).unwrap();
    ws.create_structure(named("lib-east", Some("lib"))).unwrap();
    ws.create_structure(named("gym", None)).unwrap();
    ws
}

fn enter(code: &str) -> TriggerDraft {
    TriggerDraft::membership(code, TriggerType::Enter, "Welcome", "Hello there", "flow_1")
}

#[test]
fn create_structure_rejections_leave_state_alone() {
    let mut ws = campus();
    let before = ws.structures().to_vec();

    assert_eq!(
        ws.create_structure(named("  ", None)).unwrap_err(),
        StructureError::EmptyCode
    );
    assert_eq!(
        ws.create_structure(named("Lib", None)).unwrap_err(),
        StructureError::DuplicateCode("LIB".into())
    );
    assert_eq!(
        ws.create_structure(named("pool", Some("nowhere"))).unwrap_err(),
        StructureError::UnknownParent("NOWHERE".into())
    );
    let thin = NewStructure {
        thickness: Some(0.0),
        ..named("pool", None)
    };
    assert_eq!(
        ws.create_structure(thin).unwrap_err(),
        StructureError::Band(BandError::InvalidThickness(0.0))
    );
    assert_eq!(ws.structures(), &before[..]);

    let default_t = ws.cfg().default_band_thickness_m;
    let pool = ws.create_structure(named("pool", Some("gym"))).unwrap();
    assert_eq!(pool.code, "POOL");
    assert_eq!(pool.parent_id.as_deref(), Some("GYM"));
    assert_eq!(pool.trigger_band.thickness, default_t);
}

#[test]
fn update_details_touches_only_given_fields() {
    let mut ws = campus();
    let s = ws
        .update_details(
            "gym",
            StructureDetails {
                kind: Some(StructureType::Sports),
                ..StructureDetails::default()
            },
        )
        .unwrap();
    assert_eq!(s.kind, StructureType::Sports);
    assert_eq!(s.name, "gym hall");
    assert!(matches!(
        ws.update_details("nope", StructureDetails::default()),
        Err(StructureError::NotFound(_))
    ));
}

#[test]
fn undo_restores_exact_prior_state() {
    let mut ws = campus();
    let before = ws.structure("lib").cloned().unwrap();

    for p in square(43.70, 7.25, 0.01) {
        ws.add_map_point("lib", p).unwrap();
    }
    ws.add_walk_point("lib", Point::new(43.702, 7.252)).unwrap();
    ws.add_walk_point("LIB", Point::new(43.703, 7.253)).unwrap();
    for p in square(43.701, 7.251, 0.002).into_iter().take(3) {
        ws.add_band_point("lib", p).unwrap();
    }
    assert_eq!(ws.history().len(), 9);

    for _ in 0..9 {
        assert!(ws.undo().is_some());
    }
    assert_eq!(ws.structure("lib"), Some(&before));
    assert!(ws.history().is_empty());
    assert!(ws.undo().is_none());
}

#[test]
fn undo_clears_band_once_boundary_stops_being_a_polygon() {
    let mut ws = campus();
    ws.set_map_points("lib", square(43.70, 7.25, 0.01)[..3].to_vec())
        .unwrap();
    ws.set_band_points("lib", square(43.701, 7.251, 0.005)).unwrap();

    // 3 -> 4 -> 3 points: still a polygon, band kept.
    ws.add_map_point("lib", Point::new(43.71, 7.25)).unwrap();
    let s = ws.undo().unwrap();
    assert_eq!(s.map_points.len(), 3);
    assert_eq!(s.trigger_band.points.len(), 4);

    ws.set_map_points("lib", square(43.70, 7.25, 0.01)[..2].to_vec())
        .unwrap();
    ws.add_map_point("lib", Point::new(43.71, 7.26)).unwrap();
    let s = ws.undo().unwrap();
    assert_eq!(s.map_points.len(), 2);
    assert!(s.trigger_band.points.is_empty());
}

#[test]
fn undo_of_deleted_structure_is_dropped() {
    let mut ws = campus();
    ws.add_map_point("gym", Point::new(1.0, 1.0)).unwrap();
    ws.delete_structure("gym", DeleteMode::Detach).unwrap();
    assert!(ws.undo().is_none());
    assert!(ws.history().is_empty());
}

#[test]
fn regenerate_and_rethicken_band() {
    let mut ws = campus();
    ws.set_map_points("lib", square(43.70, 7.25, 0.01)).unwrap();
    ws.set_walk_points("lib", square(43.702, 7.252, 0.006)).unwrap();
    let s = ws.regenerate_band("lib").unwrap();
    assert_eq!(s.trigger_band.points.len(), 5);

    ws.set_map_points("gym", Vec::new()).unwrap();
    ws.set_walk_points("gym", vec![Point::new(0.0, 0.0), Point::new(0.0, 0.01)])
        .unwrap();
    let s = ws.regenerate_band("gym").unwrap();
    assert_eq!(s.trigger_band.points.len(), 5);

    let s = ws.set_band_thickness("gym", 40.0).unwrap();
    assert_eq!(s.trigger_band.thickness, 40.0);
    let err = ws.set_band_thickness("gym", f64::NAN).unwrap_err();
    assert!(matches!(err, StructureError::Band(BandError::InvalidThickness(_))));
    assert_eq!(ws.structure("gym").unwrap().trigger_band.thickness, 40.0);
}

#[test]
fn delete_detach_and_cascade() {
    let mut ws = campus();
    let removed = ws.delete_structure("main", DeleteMode::Detach).unwrap();
    assert_eq!(removed, ["MAIN"]);
    assert_eq!(ws.structure("lib").unwrap().parent_id, None);
    assert_eq!(
        ws.structure("lib-east").unwrap().parent_id.as_deref(),
        Some("LIB")
    );

    let mut ws = campus();
    let removed = ws.delete_structure("main", DeleteMode::Cascade).unwrap();
    assert_eq!(removed, ["MAIN", "LIB", "LIB-EAST"]);
    let left: Vec<&str> = ws.structures().iter().map(|s| s.code.as_str()).collect();
    assert_eq!(left, ["GYM"]);

    assert!(matches!(
        ws.delete_structure("main", DeleteMode::Detach),
        Err(StructureError::NotFound(_))
    ));
}

#[test]
fn hierarchy_through_workspace() {
    let mut ws = campus();
    assert_eq!(ws.forest().len(), 2);
    assert!(!ws.can_reparent("main", Some("lib-east")));
    let err = ws.set_parent("main", Some("lib-east")).unwrap_err();
    assert!(matches!(err, StructureError::WouldCycle { .. }));
    ws.set_parent("lib-east", Some("gym")).unwrap();
    let rel = ws.relationships("gym").unwrap();
    assert_eq!(rel.children.len(), 1);
    assert_eq!(rel.children[0].code, "LIB-EAST");
}

#[test]
fn triggers_require_a_live_structure() {
    let mut ws = campus();
    assert_eq!(
        ws.create_trigger(enter("pool")).unwrap_err(),
        TriggerError::UnknownStructure("POOL".into())
    );
    let id = ws.create_trigger(enter("gym")).unwrap().id.clone();
    ws.create_trigger(enter("lib")).unwrap();
    assert_eq!(ws.active_triggers("gym").len(), 1);

    ws.set_trigger_active(&id, false).unwrap();
    assert!(ws.active_triggers("gym").is_empty());

    ws.delete_structure("gym", DeleteMode::Detach).unwrap();
    assert!(ws.active_triggers("gym").is_empty());
    let orphans: Vec<&str> = ws.orphaned_triggers().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(orphans, [id.as_str()]);
    let pruned = ws.prune_orphaned_triggers();
    assert_eq!(pruned.len(), 1);
    assert_eq!(ws.triggers().len(), 1);
    assert!(ws.orphaned_triggers().is_empty());
}

#[test]
fn locate_reports_boundary_band_and_active_triggers() {
    let mut ws = campus();
    ws.set_map_points("lib", square(43.70, 7.25, 0.01)).unwrap();
    ws.set_walk_points("lib", square(43.702, 7.252, 0.006)).unwrap();
    ws.regenerate_band("lib").unwrap();
    ws.create_trigger(enter("lib")).unwrap();
    let mut exit = enter("lib");
    exit.kind = crate::trigger::TriggerKind::Membership {
        trigger_type: TriggerType::Exit,
    };
    exit.is_active = false;
    ws.create_trigger(exit).unwrap();

    let hits = ws.locate(Point::new(43.7005, 7.2505));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].structure.code, "LIB");
    assert!(hits[0].in_boundary);
    assert_eq!(hits[0].triggers.len(), 1);

    assert!(ws.locate(Point::new(0.0, 0.0)).is_empty());
}

#[test]
fn area_report_covers_every_structure() {
    let mut ws = campus();
    ws.set_map_points("gym", square(0.0, 0.0, 0.01)).unwrap();
    let areas = ws.areas();
    assert_eq!(areas.len(), 4);
    let gym = areas.iter().find(|a| a.code == "GYM").unwrap();
    // ~1.11 km on a side at the equator.
    assert!((gym.boundary_m2 - 1.2364e6).abs() < 1e4, "{}", gym.boundary_m2);
    assert_eq!(gym.band_m2, 0.0);
}

#[test]
fn import_merges_without_overwriting() {
    let mut ws = campus();
    let json = r#"[{"code": "gym", "name": "Other gym"}, {"code": "pool", "parentId": "gym"}]"#;
    let imported = ws.import_structures(json).unwrap();
    assert_eq!(imported.renamed.len(), 1);
    assert_eq!(ws.structures().len(), 6);
    assert_eq!(ws.structure("gym").unwrap().name, "gym hall");
    assert_eq!(ws.structure("pool").unwrap().parent_id.as_deref(), Some("GYM"));

    let exported = serde_json::to_string(&ws.export_structures()).unwrap();
    let mut copy = Workspace::default();
    copy.import_structures(&exported).unwrap();
    assert_eq!(copy.structures(), ws.structures());
}

#[test]
fn trigger_exchange_through_workspace() {
    let mut ws = campus();
    ws.create_trigger(enter("gym")).unwrap();
    let json = serde_json::to_string(&ws.export_triggers()).unwrap();
    let mut other = campus();
    let outcome = other.import_triggers(&json, false).unwrap();
    assert_eq!(outcome.added, 1);
    assert_eq!(other.triggers().all(), ws.triggers().all());
}

#[test]
fn reimporting_own_export_builds_a_parallel_tree() {
    let mut ws = campus();
    let exported = serde_json::to_string(&ws.export_structures()).unwrap();
    let imported = ws.import_structures(&exported).unwrap();
    assert_eq!(imported.renamed.len(), 4);
    let copy_of = |code: &str| {
        imported
            .renamed
            .iter()
            .find(|r| r.from.as_deref() == Some(code))
            .map(|r| r.to.clone())
            .unwrap()
    };
    let (main, lib, east) = (copy_of("MAIN"), copy_of("LIB"), copy_of("LIB-EAST"));
    assert_eq!(ws.structure(&lib).unwrap().parent_id.as_deref(), Some(main.as_str()));
    assert_eq!(ws.structure(&east).unwrap().parent_id.as_deref(), Some(lib.as_str()));
    assert_eq!(ws.structure("lib").unwrap().parent_id.as_deref(), Some("MAIN"));
    assert_eq!(ws.relationships("lib").unwrap().children.len(), 1);
    assert_eq!(ws.forest().len(), 4);
}
