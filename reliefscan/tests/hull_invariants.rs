//! Property tests of the convex hull and antipodal maintenance.

use proptest::prelude::*;
use reliefscan::geom::Pt2i;
use reliefscan::hull::ConvexHull;

/// Builds a hull from a rightward polyline, skipping the colinear prefix.
fn build_hull(points: &[Pt2i]) -> Option<ConvexHull> {
    let mut hull: Option<ConvexHull> = None;
    for (i, p) in points.iter().enumerate() {
        match hull {
            Some(ref mut h) => {
                h.add_point(*p, false);
            }
            None if i >= 2 => {
                if !p.colinear_to(points[0], points[i - 1]) {
                    hull = Some(ConvexHull::new(points[0], points[i - 1], *p));
                }
            }
            None => {}
        }
    }
    hull
}

/// Minimum horizontal/vertical enclosing strip width, brute-forced over all
/// ordered point pairs.
fn brute_force_strip(points: &[Pt2i]) -> f64 {
    let mut best = f64::INFINITY;
    for e1 in points {
        for e2 in points {
            if e1 == e2 {
                continue;
            }
            let dx = (e2.x() - e1.x()) as f64;
            let dy = (e2.y() - e1.y()) as f64;
            for horizontal in [true, false] {
                let den = if horizontal { dy } else { dx };
                if den == 0.0 {
                    continue;
                }
                let mut width: f64 = 0.0;
                let mut one_side = true;
                for p in points {
                    let cross = (p.x() - e1.x()) as f64 * dy - (p.y() - e1.y()) as f64 * dx;
                    let d = if horizontal { cross / dy } else { -cross / dx };
                    if d < -1e-9 {
                        one_side = false;
                        break;
                    }
                    width = width.max(d);
                }
                if one_side {
                    best = best.min(width);
                }
            }
        }
    }
    best
}

/// Strategy: a rightward polyline of 4 to 24 points.
fn polyline() -> impl Strategy<Value = Vec<Pt2i>> {
    prop::collection::vec((1i32..4, -15i32..15), 4..24).prop_map(|steps| {
        let mut x = 0;
        steps
            .into_iter()
            .map(|(dx, y)| {
                x += dx;
                Pt2i::new(x, y)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_add_point_restore_is_identity(points in polyline(), extra_y in -30i32..30) {
        if let Some(mut hull) = build_hull(&points) {
            let verts = hull.vertices();
            let aph = hull.aph().triple();
            let apv = hull.apv().triple();
            let left = hull.first_vertex();
            let right = hull.last_vertex();

            let extra = Pt2i::new(points.last().unwrap().x() + 2, extra_y);
            if hull.add_point(extra, false) {
                hull.restore();
                prop_assert_eq!(hull.vertices(), verts);
                prop_assert_eq!(hull.aph().triple(), aph);
                prop_assert_eq!(hull.apv().triple(), apv);
                prop_assert_eq!(hull.first_vertex(), left);
                prop_assert_eq!(hull.last_vertex(), right);
            }
        }
    }

    #[test]
    fn prop_antipodal_thickness_is_minimal_strip_width(points in polyline()) {
        if let Some(hull) = build_hull(&points) {
            let t = hull.thickness();
            prop_assume!(t.den() != 0);
            let exact = t.num() as f64 / t.den() as f64;
            let brute = brute_force_strip(&points);
            prop_assert!(
                (exact - brute).abs() < 1e-6,
                "antipodal {} vs brute force {}", exact, brute
            );
        }
    }

    #[test]
    fn prop_hull_vertices_are_convex_ccw(points in polyline()) {
        if let Some(hull) = build_hull(&points) {
            let verts = hull.vertices();
            let n = verts.len();
            prop_assert!(n >= 3);
            for i in 0..n {
                let a = verts[i];
                let b = verts[(i + 1) % n];
                let c = verts[(i + 2) % n];
                // no clockwise turn along the boundary
                prop_assert!(
                    !c.to_left(b, a),
                    "clockwise turn at {:?} {:?} {:?}", a, b, c
                );
            }
        }
    }
}
