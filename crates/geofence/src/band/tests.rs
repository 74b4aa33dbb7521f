use super::*;
use crate::cfg::CorridorScale;
use crate::geomath::{area_square_meters, point_in_polygon};
use proptest::prelude::*;

fn pts(v: &[(f64, f64)]) -> Vec<Point> {
    v.iter().copied().map(Point::from).collect()
}

fn close(a: Point, b: Point) -> bool {
    (a.lat - b.lat).abs() < 1e-12 && (a.lng - b.lng).abs() < 1e-12
}

#[test]
fn square_in_square_yields_midpoints() {
    let outer = pts(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
    let inner = pts(&[(0.5, 0.5), (0.5, 1.5), (1.5, 1.5), (1.5, 0.5)]);
    let band = band_between_polygons(&outer, &inner);
    let expected = pts(&[(0.25, 0.25), (0.25, 1.75), (1.75, 1.75), (1.75, 0.25)]);
    assert_eq!(band.len(), 5);
    for (got, want) in band.iter().zip(&expected) {
        assert!(close(*got, *want), "{got:?} != {want:?}");
    }
    assert!(band[4].bit_eq(&band[0]));
}

#[test]
fn input_order_does_not_matter() {
    let outer = pts(&[(2.0, 0.0), (0.0, 2.0), (0.0, 0.0), (2.0, 2.0)]);
    let inner = pts(&[(1.5, 1.5), (0.5, 0.5), (1.5, 0.5), (0.5, 1.5)]);
    let a = band_between_polygons(&outer, &inner);
    let mut outer_sorted = outer.clone();
    outer_sorted.reverse();
    let b = band_between_polygons(&outer_sorted, &inner);
    assert_eq!(a, b);
}

#[test]
fn mismatched_counts_use_shorter_polygon() {
    let outer = pts(&[(0.0, 0.0), (0.0, 2.0), (1.0, 3.0), (2.0, 2.0), (2.0, 0.0)]);
    let inner = pts(&[(0.5, 0.5), (0.5, 1.5), (1.5, 1.0)]);
    let band = band_between_polygons(&outer, &inner);
    assert_eq!(band.len(), 4);
    let corr = AngleSortMatcher.correspond(&outer, &inner);
    assert_eq!(corr.pairs.len(), 3);
    for (i, j) in corr.source_pairs() {
        assert!(i < outer.len() && j < inner.len());
    }
}

#[test]
fn too_few_vertices_give_empty_band() {
    let tri = pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0)]);
    let seg = pts(&[(0.0, 0.0), (0.0, 1.0)]);
    assert!(band_between_polygons(&tri, &seg).is_empty());
    assert!(band_between_polygons(&seg, &tri).is_empty());
    assert!(band_around_path(&seg[..1], 10.0).is_empty());
}

#[test]
fn corridor_around_eastward_segment() {
    // 222 m thickness → 0.001° half width.
    let path = pts(&[(0.0, 0.0), (0.0, 0.001)]);
    let ring = band_around_path(&path, 222.0);
    let expected = pts(&[
        (0.001, 0.0),
        (0.001, 0.001),
        (-0.001, 0.001),
        (-0.001, 0.0),
        (0.001, 0.0),
    ]);
    assert_eq!(ring.len(), expected.len());
    for (got, want) in ring.iter().zip(&expected) {
        assert!(close(*got, *want), "{got:?} != {want:?}");
    }
    assert!(point_in_polygon(Point::new(0.0, 0.0005), &ring));
    assert!(!point_in_polygon(Point::new(0.002, 0.0005), &ring));
}

#[test]
fn corridor_latitude_scaling_widens_longitude() {
    let path = pts(&[(60.0, 10.0), (60.001, 10.0)]);
    let fixed = band_around_path(&path, 222.0);
    let cfg = EngineCfg {
        corridor_scale: CorridorScale::Latitude,
        ..EngineCfg::default()
    };
    let scaled = band_around_path_cfg(&path, 222.0, &cfg);
    let w_fixed = (fixed[0].lng - 10.0).abs();
    let w_scaled = (scaled[0].lng - 10.0).abs();
    assert!((w_fixed - 0.001).abs() < 1e-12);
    assert!((w_scaled / w_fixed - 1.0 / 60.0_f64.to_radians().cos()).abs() < 1e-4);
}

fn structure_with(map: Vec<Point>, walk: Vec<Point>) -> Structure {
    let mut s = Structure::new("b1", "Library", 20.0);
    s.map_points = map;
    s.walk_points = walk;
    s
}

#[test]
fn regenerate_picks_algorithm_by_boundaries() {
    let cfg = EngineCfg::default();
    let outer = pts(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
    let inner = pts(&[(0.5, 0.5), (0.5, 1.5), (1.5, 1.5), (1.5, 0.5)]);
    let both = structure_with(outer.clone(), inner);
    assert_eq!(regenerate_band(&both, &cfg).len(), 5);

    // Two walk points are an open path, not a polygon.
    let path = pts(&[(0.0, 0.0), (0.0, 0.001)]);
    let walked = structure_with(outer.clone(), path);
    assert_eq!(regenerate_band(&walked, &cfg).len(), 5);

    let bare = structure_with(outer, Vec::new());
    assert!(regenerate_band(&bare, &cfg).is_empty());
}

#[test]
fn thickness_update_reskins_existing_band() {
    let cfg = EngineCfg::default();
    let mut s = structure_with(Vec::new(), Vec::new());
    s.trigger_band.points = pts(&[(0.0, 0.0), (0.0, 0.001)]);
    let thick = update_thickness(&s, 222.0, &cfg).unwrap();
    assert_eq!(thick.trigger_band.thickness, 222.0);
    assert_eq!(thick.trigger_band.points.len(), 5);
    assert!(area_square_meters(&thick.trigger_band.points) > 0.0);

    let mut empty = s.clone();
    empty.trigger_band.points.clear();
    let t = update_thickness(&empty, 5.0, &cfg).unwrap();
    assert!(t.trigger_band.points.is_empty());
    assert_eq!(t.trigger_band.thickness, 5.0);

    assert_eq!(
        update_thickness(&s, 0.0, &cfg),
        Err(BandError::InvalidThickness(0.0))
    );
    assert!(update_thickness(&s, f64::NAN, &cfg).is_err());
}

fn ring_strategy() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((-1.0..1.0f64, -1.0..1.0f64), 3..10)
        .prop_map(|v| v.into_iter().map(Point::from).collect())
}

proptest! {
    #[test]
    fn band_points_are_true_midpoints(outer in ring_strategy(), inner in ring_strategy()) {
        let band = band_between_polygons(&outer, &inner);
        let n = outer.len().min(inner.len());
        prop_assert!(band.len() == n || band.len() == n + 1);
        let corr = AngleSortMatcher.correspond(&outer, &inner);
        for (k, &(i, j)) in corr.pairs.iter().enumerate() {
            let (a, b, m) = (corr.outer[i], corr.inner[j], band[k]);
            prop_assert!(m.lat >= a.lat.min(b.lat) && m.lat <= a.lat.max(b.lat));
            prop_assert!(m.lng >= a.lng.min(b.lng) && m.lng <= a.lng.max(b.lng));
        }
    }
}
