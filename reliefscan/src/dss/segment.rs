//! Digital straight segment: a digital line bounded along its dominant axis.

use crate::dss::line::{walk_bound_points, DigitalStraightLine, DslError, DslType};
use crate::geom::{EDist, Pt2i, Vr2i};

/// A digital straight line together with inclusive `[min, max]` bounds along
/// the dominant axis (X when the band is rather horizontal, Y otherwise).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitalStraightSegment {
    line: DigitalStraightLine,
    min: i32,
    max: i32,
}

impl DigitalStraightSegment {
    /// Creates a segment centered on two points, bounded by the given box.
    pub fn from_points(
        p1: Pt2i,
        p2: Pt2i,
        kind: DslType,
        xmin: i32,
        ymin: i32,
        xmax: i32,
        ymax: i32,
    ) -> Result<Self, DslError> {
        let line = DigitalStraightLine::from_points(p1, p2, kind)?;
        Ok(Self::bounded(line, xmin, ymin, xmax, ymax))
    }

    /// Creates a segment from an antipodal pair, bounded by the given box.
    pub fn from_antipodal(
        p1: Pt2i,
        p2: Pt2i,
        p3: Pt2i,
        xmin: i32,
        ymin: i32,
        xmax: i32,
        ymax: i32,
    ) -> Result<Self, DslError> {
        let line = DigitalStraightLine::from_antipodal(p1, p2, p3)?;
        Ok(Self::bounded(line, xmin, ymin, xmax, ymax))
    }

    /// Creates a segment joining two points with the given width in periods.
    pub fn from_points_width(p1: Pt2i, p2: Pt2i, width: i32) -> Result<Self, DslError> {
        let thin = DigitalStraightLine::from_points(p1, p2, DslType::Thin)?;
        let (a, b, _, _) = thin.equation();
        let nu = width * thin.period();
        let c = a * p1.x() + b * p1.y() - nu / 2;
        let line = DigitalStraightLine::new(a, b, c, nu.max(1));
        let (min, max) = if a < b.abs() {
            (p1.x().min(p2.x()), p1.x().max(p2.x()))
        } else {
            (p1.y().min(p2.y()), p1.y().max(p2.y()))
        };
        Ok(DigitalStraightSegment { line, min, max })
    }

    /// Creates a segment from raw parameters and axial bounds.
    pub fn from_parameters(a: i32, b: i32, c: i32, nu: i32, min: i32, max: i32) -> Self {
        DigitalStraightSegment {
            line: DigitalStraightLine::new(a, b, c, nu),
            min,
            max,
        }
    }

    fn bounded(line: DigitalStraightLine, xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        let (a, b, _, _) = line.equation();
        let (min, max) = if a < b.abs() { (xmin, xmax) } else { (ymin, ymax) };
        DigitalStraightSegment { line, min, max }
    }

    /// Returns the underlying digital straight line.
    #[inline]
    pub fn line(&self) -> &DigitalStraightLine {
        &self.line
    }

    /// Returns the lower axial bound.
    #[inline]
    pub fn min(&self) -> i32 {
        self.min
    }

    /// Returns the upper axial bound.
    #[inline]
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Returns the arithmetical width of the band.
    #[inline]
    pub fn width(&self) -> i32 {
        self.line.width()
    }

    /// Returns the period of the band.
    #[inline]
    pub fn period(&self) -> i32 {
        self.line.period()
    }

    /// Returns a support vector of the band.
    #[inline]
    pub fn support_vector(&self) -> Vr2i {
        self.line.support_vector()
    }

    /// Returns the minimal (vertical or horizontal) width as an exact
    /// rational value.
    #[inline]
    pub fn minimal_width(&self) -> EDist {
        EDist::new(self.line.width(), self.line.period())
    }

    /// Checks whether the point lies in the band widened by `tol` periods
    /// and inside the axial bounds.
    pub fn contains(&self, p: Pt2i, tol: i32) -> bool {
        let (a, b, c, nu) = self.line.equation();
        let pos = a * p.x() + b * p.y();
        let t = tol * self.line.period();
        if pos < c - t || pos >= c + nu + t {
            return false;
        }
        if a < b.abs() {
            p.x() >= self.min && p.x() <= self.max
        } else {
            p.y() >= self.min && p.y() <= self.max
        }
    }

    /// Checks strict band and bound membership.
    pub fn owns(&self, p: Pt2i) -> bool {
        self.contains(p, 0)
    }

    /// Returns a symmetrically eroded segment; the width never drops below
    /// one period and the axial bounds are unchanged.
    pub fn erosion(&self, num: i32, den: i32) -> DigitalStraightSegment {
        let (a, b, c, nu) = self.line.equation();
        let per = self.line.period();
        let mut new_nu = nu;
        if nu > per {
            new_nu = nu - (num * per) / den;
            if new_nu < per {
                new_nu = per;
            }
        }
        DigitalStraightSegment::from_parameters(a, b, c + (nu - new_nu) / 2, new_nu, self.min, self.max)
    }

    /// Returns a symmetrically dilated segment.
    pub fn dilation(&self, num: i32, den: i32) -> DigitalStraightSegment {
        let (a, b, c, nu) = self.line.equation();
        let new_nu = nu + (num * self.line.period()) / den;
        DigitalStraightSegment::from_parameters(a, b, c + (nu - new_nu) / 2, new_nu, self.min, self.max)
    }

    /// Returns a segment dilated by the given radius on both sides.
    pub fn dilation_radius(&self, radius: i32) -> DigitalStraightSegment {
        let (a, b, c, nu) = self.line.equation();
        DigitalStraightSegment::from_parameters(a, b, c - radius, nu + 2 * radius, self.min, self.max)
    }

    /// Returns the squared Euclidean length of the segment.
    pub fn length2(&self) -> i32 {
        let (a, b, c, _) = self.line.equation();
        let (numin, numax, den) = if a < b.abs() {
            (c - a * self.min, c - a * self.max, b)
        } else {
            (c - b * self.min, c - b * self.max, a)
        };
        let span = (self.max - self.min) as i64;
        let dn = (numax - numin) as i64;
        let d2 = den as i64 * den as i64;
        ((span * span * d2 + dn * dn + d2 / 2) / d2) as i32
    }

    /// Returns the end point coordinates of the central naive line as exact
    /// rationals `(x1, y1, x2, y2)`.
    pub fn naive_line(&self) -> (EDist, EDist, EDist, EDist) {
        let (a, b, c, nu) = self.line.equation();
        if a < b.abs() {
            (
                EDist::int(self.min),
                EDist::new(2 * c + nu - 1 - 2 * a * self.min, 2 * b),
                EDist::int(self.max),
                EDist::new(2 * c + nu - 1 - 2 * a * self.max, 2 * b),
            )
        } else {
            (
                EDist::new(2 * c + nu - 1 - 2 * b * self.min, 2 * a),
                EDist::int(self.min),
                EDist::new(2 * c + nu - 1 - 2 * b * self.max, 2 * a),
                EDist::int(self.max),
            )
        }
    }

    /// Returns a bounding point of the band, pulled inside the axial bounds.
    pub fn bounding_point(&self, upper: bool) -> Pt2i {
        let (a, b, _, _) = self.line.equation();
        let extr = self.line.bounding_point(upper);
        let mut dec = 0;
        let bb = b.abs();
        if a < bb {
            if extr.x() > self.max {
                dec = 1 + (extr.x() - self.max) / bb;
            } else if extr.x() < self.min {
                dec = -1 - (self.min - extr.x()) / bb;
            }
            if b < 0 {
                dec = -dec;
            }
        } else if extr.y() > self.max {
            dec = -1 - (extr.y() - self.max) / a;
        } else if extr.y() < self.min {
            dec = 1 + (self.min - extr.y()) / a;
        }
        Pt2i::new(extr.x() - dec * b, extr.y() + dec * a)
    }

    /// Appends every lattice point of the segment to the provided vector.
    ///
    /// Points are produced by scanning each position of the lower bounding
    /// line and climbing across the band.
    pub fn points(&self, pts: &mut Vec<Pt2i>) {
        let (a, b, c, nu) = self.line.equation();
        let (xmin, ymin, w, h) = if b > a || -b > a {
            let xmin = self.min;
            let w = self.max - self.min;
            let ymin = if b < 0 {
                (c + nu - a * self.min) / b - 1
            } else {
                (c - a * self.max) / b - 1
            };
            let h = if b < 0 {
                (c - a * self.max) / b + 1
            } else {
                (c + nu - a * self.min) / b + 1
            } - ymin;
            (xmin, ymin, w, h)
        } else {
            let ymin = self.min;
            let h = self.max - self.min;
            let xmin = if b < 0 {
                (c - b * self.min) / a - 1
            } else {
                (c - b * self.max) / a - 1
            };
            let w = if b < 0 {
                (c + nu - b * self.max) / a
            } else {
                (c + nu - b * self.min) / a
            } + 1
                - xmin;
            (xmin, ymin, w, h)
        };

        let mut lowbound = Vec::new();
        let pb = self.bounding_point(false);
        let (mut axmin, mut aymin, mut aw, mut ah) = (xmin, ymin, w, h);
        self.adjust_work_area(&mut axmin, &mut aymin, &mut aw, &mut ah);
        walk_bound_points(a, b, nu, pb, false, axmin, aymin, aw, ah, &mut lowbound);

        for start in lowbound {
            let mut p = start;
            while self.line.owns(p) && self.in_axial_bounds(p) {
                pts.push(p);
                p = if b > a {
                    Pt2i::new(p.x(), p.y() + 1)
                } else if -b > a {
                    Pt2i::new(p.x(), p.y() - 1)
                } else {
                    Pt2i::new(p.x() + 1, p.y())
                };
            }
        }
    }

    fn in_axial_bounds(&self, p: Pt2i) -> bool {
        let (a, b, _, _) = self.line.equation();
        if a < b.abs() {
            p.x() >= self.min && p.x() <= self.max
        } else {
            p.y() >= self.min && p.y() <= self.max
        }
    }

    fn adjust_work_area(&self, xmin: &mut i32, ymin: &mut i32, width: &mut i32, height: &mut i32) {
        let (a, b, _, _) = self.line.equation();
        if b > a || -b > a {
            if *xmin < self.min {
                *xmin = self.min;
            }
            // segment max limit is inclusive
            let x2 = (*xmin + *width).min(self.max + 1);
            *width = if *xmin >= x2 { 0 } else { x2 - *xmin };
        } else {
            if *ymin < self.min {
                *ymin = self.min;
            }
            let y2 = (*ymin + *height).min(self.max + 1);
            *height = if *ymin >= y2 { 0 } else { y2 - *ymin };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_with_tolerance() {
        let s = DigitalStraightSegment::from_points(
            Pt2i::new(0, 0),
            Pt2i::new(10, 0),
            DslType::Naive,
            0,
            0,
            10,
            0,
        )
        .unwrap();
        assert!(s.contains(Pt2i::new(5, 0), 0));
        assert!(!s.contains(Pt2i::new(5, 2), 0));
        assert!(s.contains(Pt2i::new(5, 2), 2));
        // axial clip
        assert!(!s.contains(Pt2i::new(12, 0), 2));
    }

    #[test]
    fn test_erosion_dilation_preserve_bounds() {
        let s = DigitalStraightSegment::from_parameters(1, 2, 0, 6, 0, 10);
        let e = s.erosion(2, 1);
        let d = s.dilation(2, 1);
        assert_eq!(e.min(), 0);
        assert_eq!(e.max(), 10);
        assert!(e.width() < s.width());
        assert!(d.width() > s.width());
        // erosion never drops below one period
        let tiny = s.erosion(100, 1);
        assert_eq!(tiny.width(), s.period());
    }

    #[test]
    fn test_points_enumeration_matches_owns() {
        let s = DigitalStraightSegment::from_parameters(1, 3, 0, 4, 0, 9);
        let mut pts = Vec::new();
        s.points(&mut pts);
        assert!(!pts.is_empty());
        for p in &pts {
            assert!(s.owns(*p), "{:?} enumerated but not owned", p);
        }
        // exhaustive cross-check over a covering box
        let mut expected = 0;
        for x in -20..20 {
            for y in -20..20 {
                if s.owns(Pt2i::new(x, y)) {
                    expected += 1;
                }
            }
        }
        assert_eq!(pts.len(), expected);
    }

    #[test]
    fn test_length2() {
        let s = DigitalStraightSegment::from_points_width(Pt2i::new(0, 0), Pt2i::new(9, 0), 1)
            .unwrap();
        assert_eq!(s.length2(), 81);
    }

    #[test]
    fn test_from_points_width_spans_ends() {
        let s =
            DigitalStraightSegment::from_points_width(Pt2i::new(2, 1), Pt2i::new(12, 4), 3).unwrap();
        assert!(s.contains(Pt2i::new(2, 1), 1));
        assert!(s.contains(Pt2i::new(12, 4), 1));
        assert_eq!(s.min(), 2);
        assert_eq!(s.max(), 12);
    }
}
