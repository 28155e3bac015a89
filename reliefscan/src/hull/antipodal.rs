//! Horizontal / vertical antipodal pair of a polyline convex hull.

use crate::geom::EDist;
use crate::hull::convex::{Arena, VertexId};

/// An antipodal (vertex, edge) pair of the hull for one axis direction.
///
/// The pair tracks the vertex and the edge whose supporting parallel lines
/// enclose the hull with the smallest distance measured along the selected
/// axis (X for the horizontal pair, Y for the vertical pair). The update on
/// vertex insertion is a case analysis on integer cross-product signs only.
#[derive(Clone, Copy, Debug)]
pub struct Antipodal {
    /// Measured coordinate (0 = X for the horizontal pair, 1 = Y).
    ix: usize,
    /// Ordering coordinate, orthogonal to `ix`.
    iy: usize,
    vpt: VertexId,
    ept1: VertexId,
    ept2: VertexId,
}

impl Antipodal {
    /// Builds an undetermined horizontal pair.
    pub(crate) fn horizontal() -> Self {
        Antipodal { ix: 0, iy: 1, vpt: 0, ept1: 0, ept2: 0 }
    }

    /// Builds an undetermined vertical pair.
    pub(crate) fn vertical() -> Self {
        Antipodal { ix: 1, iy: 0, vpt: 0, ept1: 0, ept2: 0 }
    }

    /// Returns the leaning vertex.
    #[inline]
    pub fn vertex(&self) -> VertexId {
        self.vpt
    }

    /// Returns the leaning edge start vertex.
    #[inline]
    pub fn edge_start(&self) -> VertexId {
        self.ept1
    }

    /// Returns the leaning edge end vertex.
    #[inline]
    pub fn edge_end(&self) -> VertexId {
        self.ept2
    }

    /// Returns the (vertex, edge start, edge end) triple.
    #[inline]
    pub fn triple(&self) -> (VertexId, VertexId, VertexId) {
        (self.vpt, self.ept1, self.ept2)
    }

    pub(crate) fn set_triple(&mut self, t: (VertexId, VertexId, VertexId)) {
        self.vpt = t.0;
        self.ept1 = t.1;
        self.ept2 = t.2;
    }

    /// Initializes the pair from three unordered vertices: the edge joins the
    /// two extreme vertices along the ordering coordinate, the remaining one
    /// leans opposite.
    pub(crate) fn init(&mut self, arena: &Arena, v1: VertexId, v2: VertexId, v3: VertexId) {
        let z = |v: VertexId| arena.point(v).get(self.iy);
        if z(v1) < z(v2) {
            if z(v2) < z(v3) {
                self.set(v2, v1, v3);
            } else if z(v1) < z(v3) {
                self.set(v3, v1, v2);
            } else {
                self.set(v1, v2, v3);
            }
        } else if z(v1) < z(v3) {
            self.set(v1, v2, v3);
        } else if z(v2) <= z(v3) {
            self.set(v3, v1, v2);
        } else {
            self.set(v2, v1, v3);
        }
    }

    #[inline]
    fn set(&mut self, v: VertexId, e1: VertexId, e2: VertexId) {
        self.vpt = v;
        self.ept1 = e1;
        self.ept2 = e2;
    }

    #[inline]
    fn set_vertex(&mut self, v: VertexId) {
        self.vpt = v;
    }

    #[inline]
    fn set_edge(&mut self, e1: VertexId, e2: VertexId) {
        self.ept1 = e1;
        self.ept2 = e2;
    }

    /// Returns the pair thickness along the measured axis as an exact
    /// rational (the denominator may be zero for a degenerate edge).
    pub(crate) fn thickness(&self, arena: &Arena) -> EDist {
        let v = arena.point(self.vpt);
        let e1 = arena.point(self.ept1);
        let e2 = arena.point(self.ept2);
        let den = e2.get(self.iy) - e1.get(self.iy);
        EDist::new(
            (v.get(self.ix) - e1.get(self.ix)) * den
                - (v.get(self.iy) - e1.get(self.iy)) * (e2.get(self.ix) - e1.get(self.ix)),
            den,
        )
    }

    /// Remainder of the edge line equation for the given vertex.
    fn remainder(&self, arena: &Arena, v: VertexId) -> i32 {
        let e1 = arena.point(self.ept1);
        let e2 = arena.point(self.ept2);
        let p = arena.point(v);
        let mut a = e2.y() - e1.y();
        let mut b = e2.x() - e1.x();
        if a == 0 {
            return (if b > 0 { -b } else { b }) * p.y();
        }
        if a < 0 {
            a = -a;
            b = -b;
        }
        a * p.x() - b * p.y()
    }

    /// Checks whether the edge direction lies in the first quadrant,
    /// i.e. sign(Ex) = sign(Ey).
    fn edge_in_first_quadrant(&self, arena: &Arena) -> bool {
        if self.iy != 0 {
            return true;
        }
        let e1 = arena.point(self.ept1);
        let e2 = arena.point(self.ept2);
        let a = e2.y() - e1.y();
        if a == 0 {
            return true;
        }
        if a > 0 {
            e1.x() < e2.x()
        } else {
            e2.x() < e1.x()
        }
    }

    /// Updates the pair after the insertion of vertex `pt` into the hull.
    ///
    /// Case analysis on where `pt` falls relative to the parallel lines
    /// supported by the current edge and vertex, then rotation of the pair
    /// along the hull when `pt` passes the vertex line.
    pub(crate) fn update(&mut self, arena: &Arena, pt: VertexId) {
        let rpt = arena.right(pt);
        let lpt = arena.left(pt);

        let rmp = self.remainder(arena, pt);
        let rmv = self.remainder(arena, self.vpt);
        let rme = self.remainder(arena, self.ept1);
        let zpt = arena.point(pt).get(self.iy);
        let zav = arena.point(self.vpt).get(self.iy);
        let zas = arena.point(self.ept1).get(self.iy);
        let zae = arena.point(self.ept2).get(self.iy);

        // neighbour of pt lying on the vertex line, if any
        let pvertex = if self.remainder(arena, rpt) == rmv {
            rpt
        } else if self.remainder(arena, lpt) == rmv {
            lpt
        } else {
            self.vpt
        };
        // neighbour of pt lying on the edge line, if any
        let pedge = if self.remainder(arena, rpt) == rme {
            rpt
        } else if self.remainder(arena, lpt) == rme {
            lpt
        } else {
            self.ept1
        };

        // P on the line supported by the edge
        if rmp == rme {
            if (zpt == zas) || (zpt == zae) || ((zpt < zas) != (zpt < zae)) {
                return;
            }
            // prolongation of the edge up to P
            self.set_edge(pt, pedge);
            return;
        }

        // P on the parallel line supported by the vertex
        if rmp == rmv {
            if (zpt == zas) || (zpt == zae) || ((zpt < zas) != (zpt < zae)) {
                self.set_vertex(pt);
            } else {
                if (zas == zae) || ((zas < zpt) != (zas < zae)) {
                    self.set_vertex(self.ept1);
                }
                if (zae < zpt) != (zae < zas) {
                    self.set_vertex(self.ept2);
                }
                self.set_edge(pt, pvertex);
            }
            return;
        }

        // P strictly between edge and vertex lines
        if (rmp < rmv) != (rmp < rme) {
            return;
        }

        // P at the height of the vertex
        if zpt == zav {
            if (rmv < rmp) != (rmv < rme) {
                self.set_vertex(pt);
                return;
            }
            let oldvpt = self.vpt;
            if zav != arena.point(lpt).get(self.iy) {
                if arena.vprod(oldvpt, arena.left(oldvpt), lpt, pt) > 0 {
                    self.set_vertex(oldvpt);
                    self.set_edge(lpt, pt);
                } else {
                    self.set_vertex(pt);
                    self.set_edge(oldvpt, arena.left(oldvpt));
                }
            } else if arena.vprod(oldvpt, arena.right(oldvpt), rpt, pt) < 0 {
                self.set_vertex(oldvpt);
                self.set_edge(rpt, pt);
            } else {
                self.set_vertex(pt);
                self.set_edge(oldvpt, arena.right(oldvpt));
            }
            return;
        }

        // Main case: rotate the pair along the hull to enclose P again.
        let mut first_quad = true;
        if self.edge_in_first_quadrant(arena) {
            if ((rmp > rme) && (rmp > rmv) && (zpt > zav))
                || ((rmp < rme) && (rmp < rmv) && (zpt < zav))
            {
                first_quad = false;
            }
        } else if ((rmp > rme) && (rmp > rmv) && (zpt < zav))
            || ((rmp < rme) && (rmp < rmv) && (zpt > zav))
        {
            first_quad = false;
        }

        if first_quad {
            let mut cvx = pvertex;
            if (rmv < rme) != (rmv < rmp) {
                cvx = if arena.right(self.ept1) == self.ept2 {
                    self.ept1
                } else {
                    self.ept2
                };
            }
            let mut zvx = arena.point(cvx).get(self.iy);
            let mut lvx = arena.left(cvx);
            let mut rvx = arena.right(cvx);

            while arena.vprod(cvx, rvx, rpt, pt) > 0 {
                cvx = rvx;
                lvx = arena.left(cvx);
                rvx = arena.right(cvx);
                zvx = arena.point(cvx).get(self.iy);
                let zpn = arena.point(lvx).get(self.iy);
                if (zpt == zvx) || (zpt == zpn) || ((zpt < zvx) != (zpt < zpn)) {
                    break;
                }
            }

            if zvx == zpt {
                if arena.vprod(cvx, rvx, rpt, pt) <= 0 {
                    self.set_vertex(cvx);
                    self.set_edge(rpt, pt);
                } else {
                    self.set_vertex(pt);
                    self.set_edge(cvx, rvx);
                }
            } else {
                let zpn = arena.point(rpt).get(self.iy);
                if (zvx == zpn) || ((zvx < zpt) != (zvx < zpn)) {
                    self.set_vertex(cvx);
                    self.set_edge(rpt, pt);
                } else {
                    self.set_vertex(pt);
                    self.set_edge(lvx, cvx);
                }
            }
        } else {
            let mut cvx = pvertex;
            if (rmv < rme) != (rmv < rmp) {
                cvx = if arena.left(self.ept1) == self.ept2 {
                    self.ept1
                } else {
                    self.ept2
                };
            }
            let mut zvx = arena.point(cvx).get(self.iy);
            let mut rvx = arena.right(cvx);
            let mut lvx = arena.left(cvx);

            while arena.vprod(cvx, lvx, lpt, pt) < 0 {
                cvx = lvx;
                rvx = arena.right(cvx);
                lvx = arena.left(cvx);
                zvx = arena.point(cvx).get(self.iy);
                let zvn = arena.point(rvx).get(self.iy);
                if (zpt == zvx) || (zpt == zvn) || ((zpt < zvx) != (zpt < zvn)) {
                    break;
                }
            }
            if zvx == zpt {
                if arena.vprod(cvx, lvx, lpt, pt) >= 0 {
                    self.set_vertex(cvx);
                    self.set_edge(lpt, pt);
                } else {
                    self.set_vertex(pt);
                    self.set_edge(cvx, lvx);
                }
            } else {
                let zvn = arena.point(lpt).get(self.iy);
                if (zvx == zvn) || ((zvx < zvn) != (zvx < zpt)) {
                    self.set_vertex(cvx);
                    self.set_edge(lpt, pt);
                } else {
                    self.set_vertex(pt);
                    self.set_edge(rvx, cvx);
                }
            }
        }
    }
}
