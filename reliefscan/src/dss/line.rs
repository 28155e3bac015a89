//! Arithmetic digital straight line.

use thiserror::Error;

use crate::geom::{EDist, Pt2i, Vr2i};

/// Width class of a digital straight line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DslType {
    /// Width 1.
    Thin,
    /// Width `max(|a|, |b|)`; the line is 8-connected.
    Naive,
    /// Width `|a| + |b|`; the line is 4-connected.
    Standard,
}

/// Errors raised by digital line construction.
#[derive(Debug, Error)]
pub enum DslError {
    /// The two defining points coincide.
    #[error("degenerate digital line: defining points coincide")]
    Degenerate,
}

/// A digital straight line `c <= ax + by < c + nu`.
///
/// Canonical form: `a >= 0`, `b > 0` when `a = 0`, `gcd(a, |b|) = 1` and
/// `nu > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitalStraightLine {
    a: i32,
    b: i32,
    c: i32,
    nu: i32,
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

impl DigitalStraightLine {
    /// Creates a digital line from raw equation parameters.
    ///
    /// The parameters are brought to canonical form; the membership set is
    /// unchanged by the normalization.
    pub fn new(a: i32, b: i32, c: i32, nu: i32) -> Self {
        let (mut a, mut b, mut c, mut nu) = (a, b, c, nu);
        if nu < 0 {
            c = c + 1 + nu;
            nu = -nu;
        }
        if a < 0 || (a == 0 && b < 0) {
            a = -a;
            b = -b;
            c = 1 - c - nu;
        }
        let pg = gcd(a, b.abs());
        if pg > 1 {
            a /= pg;
            b /= pg;
            c /= pg;
            nu /= pg;
        }
        DigitalStraightLine { a, b, c, nu }
    }

    /// Creates a digital line centered on two leaning points.
    pub fn from_points(p1: Pt2i, p2: Pt2i, kind: DslType) -> Result<Self, DslError> {
        if p1 == p2 {
            return Err(DslError::Degenerate);
        }
        let (mut a, mut b) = if p1.y() < p2.y() {
            (p2.y() - p1.y(), p1.x() - p2.x())
        } else {
            let mut b = p2.x() - p1.x();
            let a = p1.y() - p2.y();
            if a == 0 && b < 0 {
                b = -b;
            }
            (a, b)
        };
        let pg = gcd(a, b.abs());
        a /= pg;
        b /= pg;
        let mut c = a * p1.x() + b * p1.y();

        let nu = match kind {
            DslType::Naive => {
                let nu = b.abs().max(a);
                // Centering consistent with Pt2i::steps_to
                c -= nu / 2;
                nu
            }
            DslType::Standard => {
                let nu = a + b.abs();
                if (b > 0 && a > b) || (b < 0 && a < -b) {
                    c -= (nu - 1) / 2;
                } else {
                    c -= nu / 2;
                }
                nu
            }
            DslType::Thin => 1,
        };
        Ok(DigitalStraightLine { a, b, c, nu })
    }

    /// Creates the digital line spanned by an antipodal pair.
    ///
    /// The band runs through the edge (p1, p2) and reaches the opposite
    /// vertex p3 inclusively.
    pub fn from_antipodal(p1: Pt2i, p2: Pt2i, p3: Pt2i) -> Result<Self, DslError> {
        if p1 == p2 {
            return Err(DslError::Degenerate);
        }
        let (mut a, mut b) = if p1.y() < p2.y() {
            (p2.y() - p1.y(), p1.x() - p2.x())
        } else {
            let mut b = p2.x() - p1.x();
            let a = p1.y() - p2.y();
            if a == 0 && b < 0 {
                b = -b;
            }
            (a, b)
        };
        let pg = gcd(a, b.abs());
        a /= pg;
        b /= pg;
        let mut c = a * p1.x() + b * p1.y();
        let d = a * p3.x() + b * p3.y();
        let nu = if d < c {
            let nu = c - d + 1;
            c = d;
            nu
        } else {
            d - c + 1
        };
        Ok(DigitalStraightLine { a, b, c, nu })
    }

    /// Returns the equation parameters `(a, b, c, nu)`.
    #[inline]
    pub fn equation(&self) -> (i32, i32, i32, i32) {
        (self.a, self.b, self.c, self.nu)
    }

    /// Returns the parameters `(a, b, c0)` of the central naive line.
    #[inline]
    pub fn central_line(&self) -> (i32, i32, i32) {
        (self.a, self.b, self.c + self.nu / 2)
    }

    /// Returns the period of the line: `max(|a|, |b|)`.
    #[inline]
    pub fn period(&self) -> i32 {
        self.a.max(self.b.abs())
    }

    /// Returns the antiperiod: `min(|a|, |b|)`.
    #[inline]
    pub fn antiperiod(&self) -> i32 {
        self.a.min(self.b.abs())
    }

    /// Returns the standard width `|a| + |b|`.
    #[inline]
    pub fn standard(&self) -> i32 {
        self.a + self.b.abs()
    }

    /// Returns the arithmetical width nu.
    #[inline]
    pub fn width(&self) -> i32 {
        self.nu
    }

    /// Returns a support vector of the line.
    #[inline]
    pub fn support_vector(&self) -> Vr2i {
        Vr2i::new(-self.b, self.a)
    }

    /// Returns the band offset `ax + by - c` of the given point.
    #[inline]
    pub fn remainder(&self, p: Pt2i) -> i32 {
        self.a * p.x() + self.b * p.y() - self.c
    }

    /// Returns the signed count of line periods separating a point from the
    /// band: negative below, positive above, zero inside.
    pub fn manhattan(&self, p: Pt2i) -> i32 {
        let per = self.period();
        let pos = self.remainder(p);
        if pos < 0 {
            (pos + 1 - per) / per
        } else if pos >= self.nu {
            (pos + per - self.nu) / per
        } else {
            0
        }
    }

    /// Returns the index of the translated band containing the point when the
    /// plane is paved by this line, with index 0 for the band itself.
    pub fn side_shift(&self, p: Pt2i) -> i32 {
        let mut rmd = self.remainder(p);
        if self.a == 0 {
            rmd = -rmd;
        }
        if rmd < 0 {
            (rmd + 1) / self.nu - 1
        } else {
            rmd / self.nu
        }
    }

    /// 64-bit variant of [`side_shift`](Self::side_shift) for far points.
    pub fn side_shift_safe(&self, p: Pt2i) -> i32 {
        let mut rmd = self.a as i64 * p.x() as i64 + self.b as i64 * p.y() as i64 - self.c as i64;
        if self.a == 0 {
            rmd = -rmd;
        }
        if rmd < 0 {
            ((rmd + 1) / self.nu as i64) as i32 - 1
        } else {
            (rmd / self.nu as i64) as i32
        }
    }

    /// Checks whether the given point belongs to the line.
    #[inline]
    pub fn owns(&self, p: Pt2i) -> bool {
        let val = self.remainder(p);
        val >= 0 && val < self.nu
    }

    /// Checks whether the whole segment (p1, p2) belongs to the line.
    pub fn owns_segment(&self, p1: Pt2i, p2: Pt2i) -> bool {
        let v1 = self.remainder(p1);
        let v2 = self.remainder(p2);
        if v1 < v2 {
            v1 >= 0 && v2 < self.nu
        } else {
            v2 >= 0 && v1 < self.nu
        }
    }

    /// Checks whether the segment (p1, p2) meets the line.
    pub fn crosses(&self, p1: Pt2i, p2: Pt2i) -> bool {
        let v1 = self.remainder(p1);
        let v2 = self.remainder(p2);
        if v1 < v2 {
            v2 >= 0 && v1 < self.nu
        } else {
            v1 >= 0 && v2 < self.nu
        }
    }

    /// Returns the squared Euclidean thickness of the band.
    #[inline]
    pub fn squared_euclidean_thickness(&self) -> EDist {
        EDist::new(self.nu * self.nu, self.a * self.a + self.b * self.b)
    }

    /// Returns the center of the intersection with another digital line, or
    /// `None` when the lines are parallel.
    pub fn center_of_intersection(&self, l: &DigitalStraightLine) -> Option<Pt2i> {
        let den = self.a * l.b - self.b * l.a;
        if den == 0 {
            return None;
        }
        let c0 = self.c + self.nu / 2;
        let l0 = l.c + l.nu / 2;
        Some(Pt2i::new(
            (c0 * l.b - self.b * l0 + den / 2) / den,
            (self.a * l0 - c0 * l.a + den / 2) / den,
        ))
    }

    /// Returns the center of the intersection with the line through two
    /// points, or `None` when degenerate or parallel.
    pub fn center_of_intersection_with(&self, p1: Pt2i, p2: Pt2i) -> Option<Pt2i> {
        let mut sa = p2.y() - p1.y();
        let mut sb = p1.x() - p2.x();
        if sa == 0 {
            if sb == 0 {
                return None;
            }
            sb = sb.abs();
        }
        if sa < 0 {
            sa = -sa;
            sb = -sb;
        }
        let pg = gcd(sa, sb.abs());
        sa /= pg;
        sb /= pg;
        let den = self.a * sb - self.b * sa;
        if den == 0 {
            return None;
        }
        let sc = sa * p1.x() + sb * p1.y();
        let c0 = self.c + self.nu / 2;
        Some(Pt2i::new(
            (c0 * sb - self.b * sc + den / 2) / den,
            (self.a * sc - c0 * sa + den / 2) / den,
        ))
    }

    /// Returns a point of the lower (or upper) bounding naive line, obtained
    /// from a Bezout pair of (a, b).
    pub fn bounding_point(&self, upper: bool) -> Pt2i {
        let (mut sa, mut sb) = (self.a, self.b);
        let (mut u1, mut v1, mut u2, mut v2) = (1, 0, 0, 1);
        while sb != 0 {
            let r = sa % sb;
            let q = sa / sb;
            let u3 = u1 - q * u2;
            let v3 = v1 - q * v2;
            u1 = u2;
            v1 = v2;
            u2 = u3;
            v2 = v3;
            sa = sb;
            sb = r;
        }
        if sa < 0 {
            u1 = -u1;
            v1 = -v1;
        }
        if upper {
            Pt2i::new(u1 * (self.c + self.nu - 1), v1 * (self.c + self.nu - 1))
        } else {
            Pt2i::new(u1 * self.c, v1 * self.c)
        }
    }

    /// Appends the points of both bounding naive lines clipped to a viewport.
    pub fn bounds(&self, out: &mut Vec<Pt2i>, xmin: i32, ymin: i32, width: i32, height: i32) {
        self.bound_points(out, false, xmin, ymin, width, height);
        if self.nu > self.period() {
            self.bound_points(out, true, xmin, ymin, width, height);
        }
    }

    /// Appends the points of one bounding naive line clipped to a viewport.
    ///
    /// `opposite` selects the upper bound `ax + by = c + nu - 1`; it only
    /// exists when the band is thicker than naive.
    pub fn bound_points(
        &self,
        out: &mut Vec<Pt2i>,
        opposite: bool,
        xmin: i32,
        ymin: i32,
        width: i32,
        height: i32,
    ) {
        if opposite && self.nu < self.period() {
            return;
        }
        let pb = self.bounding_point(opposite);
        walk_bound_points(
            self.a, self.b, self.nu, pb, opposite, xmin, ymin, width, height, out,
        );
    }
}

/// Enumerates one bounding naive line from a known on-line point, octant by
/// octant, restricted to the given area.
pub(crate) fn walk_bound_points(
    a: i32,
    b: i32,
    nu: i32,
    pb: Pt2i,
    opposite: bool,
    xmin: i32,
    ymin: i32,
    width: i32,
    height: i32,
    points: &mut Vec<Pt2i>,
) {
    if width <= 0 || height <= 0 {
        return;
    }
    let mut x = pb.x();
    let mut y = pb.y();
    let mut r;
    if b > 0 {
        if b >= a {
            // rather horizontal, downwards (8th octant)
            let dec = if x <= xmin { (xmin - x) / b } else { (xmin - x) / b - 1 };
            x += dec * b;
            y -= dec * a;
            r = if opposite { b - 1 } else { 0 };
            while x < xmin {
                x += 1;
                r += a;
                if r >= b {
                    y -= 1;
                    r -= b;
                }
            }
            if (opposite || r < nu) && y >= ymin && y < ymin + height {
                points.push(Pt2i::new(x, y));
            }
            loop {
                x += 1;
                if x >= xmin + width {
                    break;
                }
                r += a;
                if r >= b {
                    y -= 1;
                    r -= b;
                }
                if (opposite || r < nu) && y >= ymin && y < ymin + height {
                    points.push(Pt2i::new(x, y));
                }
            }
        } else {
            // rather vertical, downwards (7th octant)
            let dec = if y >= ymin + height {
                (y - ymin - height) / a
            } else {
                (y - ymin - height) / a - 1
            };
            x += dec * b;
            y -= dec * a;
            r = if opposite { 0 } else { a - 1 };
            while y >= ymin + height {
                y -= 1;
                r += b;
                if r >= a {
                    x += 1;
                    r -= a;
                }
            }
            if (opposite || r >= a - nu) && x >= xmin && x < xmin + width {
                points.push(Pt2i::new(x, y));
            }
            while y > ymin {
                y -= 1;
                r += b;
                if r >= a {
                    x += 1;
                    r -= a;
                }
                if (opposite || r >= a - nu) && x >= xmin && x < xmin + width {
                    points.push(Pt2i::new(x, y));
                }
            }
        }
    } else if -b >= a {
        // rather horizontal, upwards (1st octant)
        let dec = if x <= xmin { (x - xmin) / b } else { (x - xmin) / b - 1 };
        x -= dec * b;
        y += dec * a;
        r = if opposite { b + 1 } else { 0 };
        while x < xmin {
            x += 1;
            r -= a;
            if r <= b {
                y += 1;
                r -= b;
            }
        }
        if (opposite || r > -nu) && y >= ymin && y < ymin + height {
            points.push(Pt2i::new(x, y));
        }
        loop {
            x += 1;
            if x >= xmin + width {
                break;
            }
            r -= a;
            if r <= b {
                y += 1;
                r -= b;
            }
            if (opposite || r > -nu) && y >= ymin && y < ymin + height {
                points.push(Pt2i::new(x, y));
            }
        }
    } else {
        // rather vertical, upwards (2nd octant)
        let dec = if y > ymin { (ymin - y) / a - 1 } else { (ymin - y) / a };
        x -= dec * b;
        y += dec * a;
        r = if opposite { 0 } else { a - 1 };
        while y < ymin {
            y += 1;
            r -= b;
            if r >= a {
                x += 1;
                r -= a;
            }
        }
        if (opposite || r >= a - nu) && x >= xmin && x < xmin + width {
            points.push(Pt2i::new(x, y));
        }
        loop {
            y += 1;
            if y >= ymin + height {
                break;
            }
            r -= b;
            if r >= a {
                x += 1;
                r -= a;
            }
            if (opposite || r >= a - nu) && x >= xmin && x < xmin + width {
                points.push(Pt2i::new(x, y));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_constructor_owns_both_points() {
        let cases = [
            (Pt2i::new(0, 0), Pt2i::new(10, 7)),
            (Pt2i::new(0, 0), Pt2i::new(7, 10)),
            (Pt2i::new(3, 2), Pt2i::new(-5, 9)),
            (Pt2i::new(1, 1), Pt2i::new(8, -4)),
            (Pt2i::new(0, 0), Pt2i::new(0, 5)),
            (Pt2i::new(0, 0), Pt2i::new(5, 0)),
        ];
        for (p1, p2) in cases {
            let l = DigitalStraightLine::from_points(p1, p2, DslType::Naive).unwrap();
            assert!(l.owns(p1), "line {:?} must own {:?}", l, p1);
            assert!(l.owns(p2), "line {:?} must own {:?}", l, p2);
        }
    }

    #[test]
    fn test_degenerate_points_rejected() {
        assert!(DigitalStraightLine::from_points(Pt2i::new(2, 2), Pt2i::new(2, 2), DslType::Thin)
            .is_err());
    }

    #[test]
    fn test_ownership_seed_scenario() {
        // a=3, b=4, c=0, nu=5
        let l = DigitalStraightLine::new(3, 4, 0, 5);
        assert!(l.owns(Pt2i::new(0, 0)));
        assert!(!l.owns(Pt2i::new(1, 1)));
        assert!(l.owns(Pt2i::new(1, 0)));
    }

    #[test]
    fn test_manhattan_agrees_with_owns() {
        let l = DigitalStraightLine::new(3, 4, 0, 5);
        for x in -10..10 {
            for y in -10..10 {
                let p = Pt2i::new(x, y);
                assert_eq!(l.manhattan(p) == 0, l.owns(p), "at {:?}", p);
            }
        }
    }

    #[test]
    fn test_manhattan_sign_follows_side() {
        let l = DigitalStraightLine::new(0, 1, 0, 1); // row y = 0
        assert!(l.manhattan(Pt2i::new(0, 3)) > 0);
        assert!(l.manhattan(Pt2i::new(0, -3)) < 0);
    }

    #[test]
    fn test_canonicalization() {
        let l = DigitalStraightLine::new(-3, -4, 2, 5);
        let (a, b, _, nu) = l.equation();
        assert!(a >= 0);
        assert_eq!(nu, 5);
        assert_eq!((a, b), (3, 4));
        // membership preserved under normalization
        let raw = |p: Pt2i| {
            let v = -3 * p.x() - 4 * p.y() - 2;
            v >= 0 && v < 5
        };
        for x in -8..8 {
            for y in -8..8 {
                let p = Pt2i::new(x, y);
                assert_eq!(l.owns(p), raw(p), "at {:?}", p);
            }
        }
    }

    #[test]
    fn test_center_of_intersection() {
        let h = DigitalStraightLine::new(0, 1, 0, 1); // y = 0
        let v = DigitalStraightLine::new(1, 0, 4, 1); // x = 4
        assert_eq!(h.center_of_intersection(&v), Some(Pt2i::new(4, 0)));
        let h2 = DigitalStraightLine::new(0, 1, 5, 1);
        assert_eq!(h.center_of_intersection(&h2), None);
    }

    #[test]
    fn test_bound_points_lie_on_line() {
        let l = DigitalStraightLine::new(2, 5, 3, 7);
        let mut pts = Vec::new();
        l.bounds(&mut pts, -20, -20, 40, 40);
        assert!(!pts.is_empty());
        for p in &pts {
            assert!(l.owns(*p), "bound point {:?} outside band", p);
        }
    }
}
