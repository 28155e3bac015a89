//! Polyline convex hull backed by a vertex arena.

use crate::geom::{EDist, Pt2i};
use crate::hull::antipodal::Antipodal;

/// Index of a hull vertex inside its arena.
pub type VertexId = u32;

#[derive(Clone, Copy, Debug)]
pub(crate) struct HullVertex {
    pub pt: Pt2i,
    pub lv: VertexId,
    pub rv: VertexId,
}

/// The vertex arena: every vertex ever inserted, chained in a circular
/// doubly-linked list through `lv`/`rv` indices. Disconnected vertices stay
/// in the arena until the hull is dropped, which makes `restore` O(1).
#[derive(Clone, Debug, Default)]
pub(crate) struct Arena {
    verts: Vec<HullVertex>,
}

impl Arena {
    #[inline]
    pub fn point(&self, v: VertexId) -> Pt2i {
        self.verts[v as usize].pt
    }

    #[inline]
    pub fn left(&self, v: VertexId) -> VertexId {
        self.verts[v as usize].lv
    }

    #[inline]
    pub fn right(&self, v: VertexId) -> VertexId {
        self.verts[v as usize].rv
    }

    #[inline]
    fn set_left(&mut self, v: VertexId, n: VertexId) {
        self.verts[v as usize].lv = n;
    }

    #[inline]
    fn set_right(&mut self, v: VertexId, n: VertexId) {
        self.verts[v as usize].rv = n;
    }

    fn push(&mut self, pt: Pt2i) -> VertexId {
        let id = self.verts.len() as VertexId;
        self.verts.push(HullVertex { pt, lv: id, rv: id });
        id
    }

    /// Cross product of vectors (p2 - p1) and (p4 - p3).
    #[inline]
    pub fn vprod(&self, p1: VertexId, p2: VertexId, p3: VertexId, p4: VertexId) -> i64 {
        let a = self.point(p1);
        let b = self.point(p2);
        let c = self.point(p3);
        let d = self.point(p4);
        (b.x() - a.x()) as i64 * (d.y() - c.y()) as i64
            - (d.x() - c.x()) as i64 * (b.y() - a.y()) as i64
    }
}

#[derive(Clone, Copy, Debug)]
struct Snapshot {
    aph: (VertexId, VertexId, VertexId),
    apv: (VertexId, VertexId, VertexId),
    left: VertexId,
    right: VertexId,
}

/// Convex hull of a polyline, with both antipodal pairs maintained on every
/// insertion.
///
/// Insertion always happens at one of the two current ends of the polyline.
/// `add_point` followed by `restore` leaves the hull in its exact previous
/// state: vertex links, extrema and both antipodal triples.
#[derive(Clone, Debug)]
pub struct ConvexHull {
    arena: Arena,
    left: VertexId,
    right: VertexId,
    last_to_left: bool,
    aph: Antipodal,
    apv: Antipodal,
    snapshot: Snapshot,
    lconnect: VertexId,
    ldisconnect: VertexId,
    rconnect: VertexId,
    rdisconnect: VertexId,
}

impl ConvexHull {
    /// Creates a hull from the first three points of a polyline.
    ///
    /// The points are given in polyline order (left end, center, right end)
    /// and must not be colinear.
    pub fn new(lpt: Pt2i, cpt: Pt2i, rpt: Pt2i) -> Self {
        debug_assert!(!lpt.colinear_to(cpt, rpt), "hull seed must not be colinear");
        let mut arena = Arena::default();
        let left = arena.push(lpt);
        let cvert = arena.push(cpt);
        let right = arena.push(rpt);

        if lpt.to_left(cpt, rpt) {
            arena.set_right(left, cvert);
            arena.set_left(cvert, left);
            arena.set_right(cvert, right);
            arena.set_left(right, cvert);
            arena.set_right(right, left);
            arena.set_left(left, right);
        } else {
            arena.set_right(left, right);
            arena.set_left(right, left);
            arena.set_right(right, cvert);
            arena.set_left(cvert, right);
            arena.set_right(cvert, left);
            arena.set_left(left, cvert);
        }

        let mut aph = Antipodal::horizontal();
        aph.init(&arena, left, cvert, right);
        let mut apv = Antipodal::vertical();
        apv.init(&arena, left, cvert, right);

        let snapshot = Snapshot {
            aph: aph.triple(),
            apv: apv.triple(),
            left,
            right,
        };
        ConvexHull {
            arena,
            left,
            right,
            last_to_left: false,
            aph,
            apv,
            snapshot,
            lconnect: left,
            ldisconnect: left,
            rconnect: right,
            rdisconnect: right,
        }
    }

    /// Returns the left (front) end vertex of the polyline.
    #[inline]
    pub fn first_vertex(&self) -> VertexId {
        self.left
    }

    /// Returns the right (back) end vertex of the polyline.
    #[inline]
    pub fn last_vertex(&self) -> VertexId {
        self.right
    }

    /// Returns the coordinates of a vertex.
    #[inline]
    pub fn point(&self, v: VertexId) -> Pt2i {
        self.arena.point(v)
    }

    /// Returns the CCW neighbour of a vertex.
    #[inline]
    pub fn right_of(&self, v: VertexId) -> VertexId {
        self.arena.right(v)
    }

    /// Returns the CW neighbour of a vertex.
    #[inline]
    pub fn left_of(&self, v: VertexId) -> VertexId {
        self.arena.left(v)
    }

    /// Returns the horizontal antipodal pair.
    #[inline]
    pub fn aph(&self) -> &Antipodal {
        &self.aph
    }

    /// Returns the vertical antipodal pair.
    #[inline]
    pub fn apv(&self) -> &Antipodal {
        &self.apv
    }

    /// Checks whether the given point would fall inside the hull when added
    /// on the given side.
    pub fn in_hull(&self, pt: Pt2i, to_left: bool) -> bool {
        let ext = if to_left { self.left } else { self.right };
        let er = self.arena.right(ext);
        let el = self.arena.left(ext);
        pt.to_left_or_on(self.arena.point(ext), self.arena.point(er))
            && pt.to_left_or_on(self.arena.point(el), self.arena.point(ext))
    }

    /// Appends a new point at one end of the polyline.
    ///
    /// Returns `false` without modifying anything when the point lies inside
    /// the hull. Otherwise snapshots the current state (for [`restore`])
    /// and updates the hull and both antipodal pairs.
    pub fn add_point(&mut self, pt: Pt2i, to_left: bool) -> bool {
        if self.in_hull(pt, to_left) {
            return false;
        }
        self.last_to_left = to_left;
        let vx = self.arena.push(pt);
        self.preserve();
        self.insert(vx, to_left, false);
        self.aph.update(&self.arena, vx);
        self.apv.update(&self.arena, vx);
        true
    }

    /// Appends a new point at one end, skipping the inside test.
    ///
    /// Valid for directional-scan input where a new point can never fall
    /// inside the hull and the two polyline ends can never pass each other.
    pub fn add_point_ds(&mut self, pt: Pt2i, to_left: bool) -> bool {
        self.last_to_left = to_left;
        let vx = self.arena.push(pt);
        self.preserve();
        self.insert(vx, to_left, true);
        self.aph.update(&self.arena, vx);
        self.apv.update(&self.arena, vx);
        true
    }

    /// Restores the hull to its state before the last insertion.
    pub fn restore(&mut self) {
        let rd = self.rdisconnect;
        let ld = self.ldisconnect;
        self.arena.set_left(self.rconnect, rd);
        self.arena.set_right(self.lconnect, ld);
        self.left = self.snapshot.left;
        self.right = self.snapshot.right;
        self.aph.set_triple(self.snapshot.aph);
        self.apv.set_triple(self.snapshot.apv);
    }

    /// Moves the last inserted point to a new position.
    ///
    /// Returns `false` (with the previous point removed) when the new
    /// position falls inside the hull.
    pub fn move_last_point(&mut self, pos: Pt2i) -> bool {
        self.restore();
        self.arena.verts.pop();
        if self.in_hull(pos, self.last_to_left) {
            return false;
        }
        self.add_point(pos, self.last_to_left)
    }

    /// Returns the hull thickness: the smaller of the two antipodal widths.
    pub fn thickness(&self) -> EDist {
        let h = self.aph.thickness(&self.arena);
        let v = self.apv.thickness(&self.arena);
        if v < h {
            v
        } else {
            h
        }
    }

    /// Returns the witnesses of the minimum enclosing strip: edge start,
    /// edge end and opposite vertex of the thinner antipodal pair.
    pub fn antipodal_edge_and_vertex(&self) -> (Pt2i, Pt2i, Pt2i) {
        let h = self.aph.thickness(&self.arena);
        let v = self.apv.thickness(&self.arena);
        let ap = if v < h { &self.apv } else { &self.aph };
        (
            self.arena.point(ap.edge_start()),
            self.arena.point(ap.edge_end()),
            self.arena.point(ap.vertex()),
        )
    }

    /// Returns the hull vertices in CCW order starting from the left end.
    pub fn vertices(&self) -> Vec<Pt2i> {
        let mut res = vec![self.arena.point(self.left)];
        let mut v = self.arena.right(self.left);
        while v != self.left {
            res.push(self.arena.point(v));
            v = self.arena.right(v);
        }
        res
    }

    fn preserve(&mut self) {
        self.snapshot = Snapshot {
            aph: self.aph.triple(),
            apv: self.apv.triple(),
            left: self.left,
            right: self.right,
        };
    }

    fn insert(&mut self, pt: VertexId, to_left: bool, ds: bool) {
        let opposite = if to_left { self.right } else { self.left };
        if to_left {
            self.lconnect = self.left;
            self.rconnect = self.left;
            self.left = pt;
        } else {
            self.lconnect = self.right;
            self.rconnect = self.right;
            self.right = pt;
        }

        let p = self.arena.point(pt);

        let mut op_in = false;
        self.ldisconnect = self.arena.right(self.lconnect);
        loop {
            let lc = self.arena.point(self.lconnect);
            let ll = self.arena.point(self.arena.left(self.lconnect));
            if !p.to_left_or_on(lc, ll) {
                break;
            }
            if self.lconnect == opposite {
                op_in = true;
            }
            self.ldisconnect = self.lconnect;
            self.lconnect = self.arena.left(self.lconnect);
        }
        if op_in && !ds {
            if to_left {
                self.right = self.lconnect;
            } else {
                self.left = self.lconnect;
            }
        }

        op_in = false;
        self.rdisconnect = self.arena.left(self.rconnect);
        loop {
            let rc = self.arena.point(self.rconnect);
            let rr = self.arena.point(self.arena.right(self.rconnect));
            if p.to_left(rc, rr) {
                break;
            }
            if self.rconnect == opposite {
                op_in = true;
            }
            self.rdisconnect = self.rconnect;
            self.rconnect = self.arena.right(self.rconnect);
        }
        if op_in && !ds {
            if to_left {
                self.right = self.rconnect;
            } else {
                self.left = self.rconnect;
            }
        }

        self.arena.set_right(self.lconnect, pt);
        self.arena.set_left(pt, self.lconnect);
        self.arena.set_left(self.rconnect, pt);
        self.arena.set_right(pt, self.rconnect);
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incremental_seed_scenario() {
        // insert (0,0),(10,0),(5,10),(3,5) as a polyline
        let mut hull = ConvexHull::new(Pt2i::new(0, 0), Pt2i::new(10, 0), Pt2i::new(5, 10));
        assert!(!hull.add_point(Pt2i::new(3, 5), false), "(3,5) lies inside");

        let verts = hull.vertices();
        assert_eq!(verts.len(), 3);
        assert!(verts.contains(&Pt2i::new(0, 0)));
        assert!(verts.contains(&Pt2i::new(10, 0)));
        assert!(verts.contains(&Pt2i::new(5, 10)));

        // the vertical pair leans on the horizontal edge (0,0)-(10,0)
        let apv = hull.apv();
        assert_eq!(hull.point(apv.vertex()), Pt2i::new(5, 10));
        let e = (hull.point(apv.edge_start()), hull.point(apv.edge_end()));
        assert!(
            e == (Pt2i::new(0, 0), Pt2i::new(10, 0)) || e == (Pt2i::new(10, 0), Pt2i::new(0, 0))
        );
        assert_eq!(hull.thickness(), EDist::int(10));
    }

    #[test]
    fn test_restore_roundtrip() {
        let mut hull = ConvexHull::new(Pt2i::new(0, 0), Pt2i::new(4, 1), Pt2i::new(8, 0));
        let before_verts = hull.vertices();
        let before_aph = hull.aph().triple();
        let before_apv = hull.apv().triple();
        let before_left = hull.first_vertex();
        let before_right = hull.last_vertex();

        assert!(hull.add_point(Pt2i::new(12, 5), false));
        assert_ne!(hull.vertices(), before_verts);
        hull.restore();

        assert_eq!(hull.vertices(), before_verts);
        assert_eq!(hull.aph().triple(), before_aph);
        assert_eq!(hull.apv().triple(), before_apv);
        assert_eq!(hull.first_vertex(), before_left);
        assert_eq!(hull.last_vertex(), before_right);
    }

    #[test]
    fn test_move_last_point() {
        let mut hull = ConvexHull::new(Pt2i::new(0, 0), Pt2i::new(4, 1), Pt2i::new(8, 0));
        assert!(hull.add_point(Pt2i::new(12, 5), false));
        assert!(hull.move_last_point(Pt2i::new(12, -2)));
        let verts = hull.vertices();
        assert!(verts.contains(&Pt2i::new(12, -2)));
        assert!(!verts.contains(&Pt2i::new(12, 5)));
    }

    /// Brute-force minimum horizontal/vertical strip width of a point set.
    fn brute_force_strip(points: &[Pt2i]) -> f64 {
        let mut best = f64::INFINITY;
        let n = points.len();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (e1, e2) = (points[i], points[j]);
                let dx = (e2.x() - e1.x()) as f64;
                let dy = (e2.y() - e1.y()) as f64;
                // horizontal width: measure along x; vertical: along y
                for (num_of, den) in [(true, dy), (false, dx)] {
                    if den == 0.0 {
                        continue;
                    }
                    let mut w: f64 = 0.0;
                    let mut ok = true;
                    for p in points {
                        let cross = (p.x() - e1.x()) as f64 * dy - (p.y() - e1.y()) as f64 * dx;
                        let d = if num_of { cross / dy } else { -cross / dx };
                        // all points must lie on one side of the edge line
                        if d < -1e-9 {
                            ok = false;
                            break;
                        }
                        if d > w {
                            w = d;
                        }
                    }
                    if ok && w < best {
                        best = w;
                    }
                }
            }
        }
        best
    }

    #[test]
    fn test_thickness_matches_brute_force() {
        let pts = [
            Pt2i::new(0, 0),
            Pt2i::new(5, 2),
            Pt2i::new(9, 3),
            Pt2i::new(13, 7),
            Pt2i::new(17, 8),
            Pt2i::new(21, 9),
        ];
        let mut hull = ConvexHull::new(pts[0], pts[1], pts[2]);
        for p in &pts[3..] {
            hull.add_point(*p, false);
        }
        let t = hull.thickness();
        let exact = t.num() as f64 / t.den() as f64;
        let brute = brute_force_strip(&pts);
        assert!(
            (exact - brute).abs() < 1e-9,
            "antipodal thickness {} vs brute force {}",
            exact,
            brute
        );
    }
}
