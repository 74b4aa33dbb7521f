use super::*;
use proptest::prelude::*;

fn square(side: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, side),
        Point::new(side, side),
        Point::new(side, 0.0),
    ]
}

#[test]
fn centroid_is_per_axis_mean() {
    let c = centroid(&square(2.0)).unwrap();
    assert!((c.lat - 1.0).abs() < 1e-12 && (c.lng - 1.0).abs() < 1e-12);
    assert!(centroid(&[]).is_none());
}

#[test]
fn angle_sort_is_counter_clockwise_from_west() {
    // Sorted output starts at the most negative angle (south-west corner).
    let pts = square(2.0);
    let sorted = sort_by_angle_from_centroid(&pts);
    assert_eq!(sorted.len(), 4);
    // atan2 ascending: (-3π/4) SW, (-π/4) SE, (π/4) NE, (3π/4) NW
    assert_eq!(sorted[0], Point::new(0.0, 0.0));
    assert_eq!(sorted[1], Point::new(0.0, 2.0));
    assert_eq!(sorted[2], Point::new(2.0, 2.0));
    assert_eq!(sorted[3], Point::new(2.0, 0.0));
}

#[test]
fn perpendicular_points_left_of_travel() {
    // Travelling east (increasing lng); left is north.
    let off = perpendicular_offset(Point::new(0.0, 0.0), Point::new(0.0, 1.0), 0.5);
    assert!((off.lat - 0.5).abs() < 1e-12);
    assert!(off.lng.abs() < 1e-12);
    // Degenerate segment
    let zero = perpendicular_offset(Point::new(1.0, 1.0), Point::new(1.0, 1.0), 0.5);
    assert_eq!(zero, Point::default());
}

#[test]
fn scaled_perpendicular_stretches_longitude() {
    // Travelling north; left is west. With cos(lat)=0.5 the lng offset doubles.
    let off = perpendicular_offset_scaled(Point::new(0.0, 0.0), Point::new(1.0, 0.0), 0.1, 0.5);
    assert!((off.lng + 0.2).abs() < 1e-12);
    assert!(off.lat.abs() < 1e-12);
}

#[test]
fn area_of_small_square_near_equator() {
    // 0.001° square at the equator ≈ (111.195 m)^2
    let a = area_square_meters(&square(0.001));
    let side = 0.001_f64.to_radians() * EARTH_RADIUS_M;
    let expected = side * side * (0.0005_f64.to_radians().cos());
    assert!((a - expected).abs() / expected < 1e-9);
}

#[test]
fn degenerate_polygons_have_no_area_or_interior() {
    let two = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
    assert_eq!(area_square_meters(&two), 0.0);
    assert_eq!(area_square_meters(&[]), 0.0);
    assert!(!point_in_polygon(Point::new(0.5, 0.5), &two));
    assert!(!point_in_polygon(Point::new(0.0, 0.0), &[]));
}

#[test]
fn ray_cast_inside_outside() {
    let sq = square(2.0);
    assert!(point_in_polygon(Point::new(1.0, 1.0), &sq));
    assert!(!point_in_polygon(Point::new(3.0, 1.0), &sq));
    assert!(!point_in_polygon(Point::new(1.0, -0.1), &sq));
    // Concave "L": notch at the upper right is outside.
    let l = vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, 2.0),
        Point::new(1.0, 2.0),
        Point::new(1.0, 1.0),
        Point::new(2.0, 1.0),
        Point::new(2.0, 0.0),
    ];
    assert!(point_in_polygon(Point::new(0.5, 1.5), &l));
    assert!(!point_in_polygon(Point::new(1.5, 1.5), &l));
}

#[test]
fn ring_close_and_open() {
    let sq = square(1.0);
    let closed = close_ring(&sq);
    assert_eq!(closed.len(), 5);
    assert_eq!(closed[4], closed[0]);
    assert_eq!(close_ring(&closed).len(), 5);
    assert_eq!(open_ring(&closed), sq);
    assert!(close_ring(&[]).is_empty());
}

fn polygon_strategy() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((-60.0..60.0f64, -170.0..170.0f64), 0..12).prop_map(|v| {
        v.into_iter()
            .map(|(lat, lng)| Point::new(lat * 1e-3 + 43.7, lng * 1e-3 + 7.2))
            .collect()
    })
}

proptest! {
    #[test]
    fn area_invariant_under_rotation_and_reversal(pts in polygon_strategy(), shift in 0usize..12) {
        let a = area_square_meters(&pts);
        let mut rotated = pts.clone();
        if !rotated.is_empty() {
            let k = shift % rotated.len();
            rotated.rotate_left(k);
        }
        let mut reversed = pts.clone();
        reversed.reverse();
        let tol = 1e-6 * a + 1e-3;
        prop_assert!((area_square_meters(&rotated) - a).abs() <= tol);
        prop_assert!((area_square_meters(&reversed) - a).abs() <= tol);
        if pts.len() < 3 {
            prop_assert_eq!(a, 0.0);
        }
    }

    #[test]
    fn short_polygons_contain_nothing(
        pts in prop::collection::vec((-1.0..1.0f64, -1.0..1.0f64), 0..3),
        q in (-1.0..1.0f64, -1.0..1.0f64),
    ) {
        let poly: Vec<Point> = pts.into_iter().map(Point::from).collect();
        prop_assert!(!point_in_polygon(Point::from(q), &poly));
    }
}
