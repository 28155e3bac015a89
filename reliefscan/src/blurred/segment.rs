//! Blurred segment and its incremental builder.

use crate::blurred::BiPtList;
use crate::dss::{DigitalStraightSegment, DslType};
use crate::geom::{EDist, Pt2i, Vr2i};
use crate::hull::ConvexHull;

/// A set of points lying inside a digital straight band of bounded
/// thickness, together with the optimal enclosing segment and the antipodal
/// witnesses that produced it.
#[derive(Clone, Debug)]
pub struct BlurredSegment {
    plist: BiPtList,
    dss: DigitalStraightSegment,
    laps: Pt2i,
    lape: Pt2i,
    lapv: Pt2i,
}

impl BlurredSegment {
    /// Creates a blurred segment from its parts.
    pub fn new(
        plist: BiPtList,
        dss: DigitalStraightSegment,
        aps: Pt2i,
        ape: Pt2i,
        apv: Pt2i,
    ) -> Self {
        BlurredSegment { plist, dss, laps: aps, lape: ape, lapv: apv }
    }

    /// Fits a blurred segment to an ordered point sequence.
    ///
    /// Returns `None` for fewer than two points.
    pub fn fit(points: &[Pt2i]) -> Option<BlurredSegment> {
        if points.len() < 2 {
            return None;
        }
        let mut builder = BlurredSegmentBuilder::new(points[0]);
        for p in &points[1..] {
            builder.add_back(*p);
        }
        builder.finish()
    }

    /// Returns the optimal enclosing digital straight segment.
    #[inline]
    pub fn segment(&self) -> &DigitalStraightSegment {
        &self.dss
    }

    /// Returns the minimal vertical or horizontal width of the band.
    #[inline]
    pub fn minimal_width(&self) -> EDist {
        EDist::new(self.dss.width(), self.dss.period())
    }

    /// Returns whether the segment has non-null thickness.
    #[inline]
    pub fn is_thick(&self) -> bool {
        self.dss.width() > 1
    }

    /// Returns the count of points.
    #[inline]
    pub fn size(&self) -> usize {
        self.plist.size()
    }

    /// Returns the underlying point list.
    #[inline]
    pub fn points(&self) -> &BiPtList {
        &self.plist
    }

    /// Returns a support vector of the enclosing band.
    #[inline]
    pub fn support_vector(&self) -> Vr2i {
        self.dss.support_vector()
    }

    /// Returns the squared Euclidean distance between the two end points.
    pub fn squared_length(&self) -> i64 {
        let f = self.plist.front_point();
        let b = self.plist.back_point();
        f.vector_to(b).norm2()
    }

    /// Returns the start point of the last antipodal edge.
    #[inline]
    pub fn antipodal_edge_start(&self) -> Pt2i {
        self.laps
    }

    /// Returns the end point of the last antipodal edge.
    #[inline]
    pub fn antipodal_edge_end(&self) -> Pt2i {
        self.lape
    }

    /// Returns the last antipodal vertex.
    #[inline]
    pub fn antipodal_vertex(&self) -> Pt2i {
        self.lapv
    }

    /// Checks whether the given point is one of the three antipodal
    /// witnesses.
    pub fn is_antipodal(&self, pt: Pt2i) -> bool {
        pt == self.laps || pt == self.lape || pt == self.lapv
    }
}

/// Grows a blurred segment by inserting points at either end.
///
/// The convex hull is only materialized once the inserted points stop being
/// colinear; until then the enclosing segment is the thin line through the
/// end points.
#[derive(Clone, Debug)]
pub struct BlurredSegmentBuilder {
    plist: BiPtList,
    hull: Option<ConvexHull>,
}

impl BlurredSegmentBuilder {
    /// Starts a builder on the initial point of the polyline.
    pub fn new(initial: Pt2i) -> Self {
        BlurredSegmentBuilder { plist: BiPtList::new(initial), hull: None }
    }

    /// Adds a point on the front (left) side.
    pub fn add_front(&mut self, pt: Pt2i) {
        self.add(pt, true);
    }

    /// Adds a point on the back (right) side.
    pub fn add_back(&mut self, pt: Pt2i) {
        self.add(pt, false);
    }

    fn add(&mut self, pt: Pt2i, to_left: bool) {
        match self.hull {
            Some(ref mut hull) => {
                hull.add_point(pt, to_left);
            }
            None => {
                let front = self.plist.front_point();
                let back = self.plist.back_point();
                if self.plist.size() < 2 || pt.colinear_to(front, back) {
                    // still aligned, defer hull creation
                } else if to_left {
                    // all previous points lie on the front-back segment, so
                    // the triangle (pt, front, back) seeds a valid hull
                    self.hull = Some(ConvexHull::new(pt, front, back));
                } else {
                    self.hull = Some(ConvexHull::new(front, back, pt));
                }
            }
        }
        if to_left {
            self.plist.add_front(pt);
        } else {
            self.plist.add_back(pt);
        }
    }

    /// Returns the current thickness of the enclosing band.
    pub fn thickness(&self) -> EDist {
        match &self.hull {
            Some(h) => h.thickness(),
            None => EDist::int(0),
        }
    }

    /// Returns the count of inserted points.
    #[inline]
    pub fn size(&self) -> usize {
        self.plist.size()
    }

    /// Closes the builder and returns the blurred segment, or `None` when
    /// fewer than two points were inserted.
    pub fn finish(self) -> Option<BlurredSegment> {
        if self.plist.size() < 2 {
            return None;
        }
        let (xmin, ymin, xmax, ymax) = self.plist.extrema();
        match self.hull {
            Some(hull) => {
                let (s, e, v) = hull.antipodal_edge_and_vertex();
                let dss =
                    DigitalStraightSegment::from_antipodal(s, e, v, xmin, ymin, xmax, ymax).ok()?;
                Some(BlurredSegment::new(self.plist, dss, s, e, v))
            }
            None => {
                let front = self.plist.front_point();
                let back = self.plist.back_point();
                let dss = DigitalStraightSegment::from_points(
                    front,
                    back,
                    DslType::Thin,
                    xmin,
                    ymin,
                    xmax,
                    ymax,
                )
                .ok()?;
                Some(BlurredSegment::new(self.plist, dss, front, back, back))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colinear_points_give_thin_segment() {
        let pts: Vec<Pt2i> = (0..8).map(|i| Pt2i::new(i, 2 * i)).collect();
        let bs = BlurredSegment::fit(&pts).unwrap();
        assert!(!bs.is_thick());
        assert_eq!(bs.minimal_width(), EDist::new(1, 2));
        for p in &pts {
            assert!(bs.segment().contains(*p, 0));
        }
    }

    #[test]
    fn test_fit_encloses_all_points() {
        let pts = [
            Pt2i::new(0, 0),
            Pt2i::new(2, 1),
            Pt2i::new(4, 1),
            Pt2i::new(6, 3),
            Pt2i::new(8, 3),
            Pt2i::new(10, 5),
        ];
        let bs = BlurredSegment::fit(&pts).unwrap();
        assert!(bs.is_thick());
        for p in &pts {
            assert!(
                bs.segment().contains(*p, 1),
                "{:?} escapes the enclosing band",
                p
            );
        }
    }

    #[test]
    fn test_minimal_width_matches_hull_thickness() {
        let mut builder = BlurredSegmentBuilder::new(Pt2i::new(0, 0));
        for p in [
            Pt2i::new(2, 1),
            Pt2i::new(4, 1),
            Pt2i::new(6, 3),
            Pt2i::new(8, 4),
        ] {
            builder.add_back(p);
        }
        let hull_thickness = builder.thickness();
        let bs = builder.finish().unwrap();
        // the enclosing band spans the antipodal triple, one unit thicker
        // than the strip interior
        let w = bs.minimal_width();
        assert!(w >= hull_thickness);
        assert!(w <= hull_thickness.sum(1));
    }

    #[test]
    fn test_two_points_only() {
        let bs = BlurredSegment::fit(&[Pt2i::new(0, 0), Pt2i::new(5, 3)]).unwrap();
        assert_eq!(bs.size(), 2);
        assert!(BlurredSegment::fit(&[Pt2i::new(1, 1)]).is_none());
    }
}
