//! Bi-directional list of points.

use std::collections::VecDeque;

use crate::geom::Pt2i;

/// A list of points extendable at both ends, keeping track of its initial
/// point.
///
/// Invariant: `front_size() + 1 + back_size() == size()`; removals are
/// clamped so the initial point is never dropped.
#[derive(Clone, Debug)]
pub struct BiPtList {
    pts: VecDeque<Pt2i>,
    /// Index of the initial point.
    start: usize,
}

impl BiPtList {
    /// Creates a list holding a single initial point.
    pub fn new(pt: Pt2i) -> Self {
        let mut pts = VecDeque::new();
        pts.push_back(pt);
        BiPtList { pts, start: 0 }
    }

    /// Returns the count of points.
    #[inline]
    pub fn size(&self) -> usize {
        self.pts.len()
    }

    /// Returns the count of points on the front side of the initial point.
    #[inline]
    pub fn front_size(&self) -> usize {
        self.start
    }

    /// Returns the count of points on the back side of the initial point.
    #[inline]
    pub fn back_size(&self) -> usize {
        self.pts.len() - self.start - 1
    }

    /// Returns the initial point.
    #[inline]
    pub fn initial_point(&self) -> Pt2i {
        self.pts[self.start]
    }

    /// Returns the front end point.
    #[inline]
    pub fn front_point(&self) -> Pt2i {
        *self.pts.front().expect("list never empty")
    }

    /// Returns the back end point.
    #[inline]
    pub fn back_point(&self) -> Pt2i {
        *self.pts.back().expect("list never empty")
    }

    /// Adds a point on the front side.
    pub fn add_front(&mut self, pt: Pt2i) {
        self.pts.push_front(pt);
        self.start += 1;
    }

    /// Adds a point on the back side.
    pub fn add_back(&mut self, pt: Pt2i) {
        self.pts.push_back(pt);
    }

    /// Removes up to `n` points from the front side, never removing the
    /// initial point.
    pub fn remove_front(&mut self, n: usize) {
        let n = n.min(self.front_size());
        for _ in 0..n {
            self.pts.pop_front();
        }
        self.start -= n;
    }

    /// Removes up to `n` points from the back side, never removing the
    /// initial point.
    pub fn remove_back(&mut self, n: usize) {
        let n = n.min(self.back_size());
        for _ in 0..n {
            self.pts.pop_back();
        }
    }

    /// Returns the bounding box of the points as (xmin, ymin, xmax, ymax).
    pub fn extrema(&self) -> (i32, i32, i32, i32) {
        let p0 = self.pts[0];
        let mut xmin = p0.x();
        let mut ymin = p0.y();
        let mut xmax = p0.x();
        let mut ymax = p0.y();
        for p in &self.pts {
            xmin = xmin.min(p.x());
            xmax = xmax.max(p.x());
            ymin = ymin.min(p.y());
            ymax = ymax.max(p.y());
        }
        (xmin, ymin, xmax, ymax)
    }

    /// Returns the points from the front end to the back end.
    pub fn front_to_back_points(&self) -> Vec<Pt2i> {
        self.pts.iter().copied().collect()
    }

    /// Returns the front-side points, from the front end towards (and
    /// excluding) the initial point.
    pub fn front_points(&self) -> Vec<Pt2i> {
        self.pts.iter().take(self.start).copied().collect()
    }

    /// Returns the back-side points, from after the initial point to the
    /// back end.
    pub fn back_points(&self) -> Vec<Pt2i> {
        self.pts.iter().skip(self.start + 1).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_invariant() {
        let mut l = BiPtList::new(Pt2i::new(0, 0));
        l.add_front(Pt2i::new(-1, 0));
        l.add_front(Pt2i::new(-2, 0));
        l.add_back(Pt2i::new(1, 0));
        assert_eq!(l.front_size() + 1 + l.back_size(), l.size());
        assert_eq!(l.front_size(), 2);
        assert_eq!(l.back_size(), 1);
        assert_eq!(l.initial_point(), Pt2i::new(0, 0));
    }

    #[test]
    fn test_removals_keep_initial_point() {
        let mut l = BiPtList::new(Pt2i::new(0, 0));
        for i in 1..=4 {
            l.add_front(Pt2i::new(-i, 0));
            l.add_back(Pt2i::new(i, 0));
        }
        l.remove_front(100);
        l.remove_back(100);
        assert_eq!(l.size(), 1);
        assert_eq!(l.initial_point(), Pt2i::new(0, 0));
    }

    #[test]
    fn test_traversals() {
        let mut l = BiPtList::new(Pt2i::new(0, 0));
        l.add_front(Pt2i::new(-1, 0));
        l.add_back(Pt2i::new(1, 0));
        l.add_back(Pt2i::new(2, 0));
        assert_eq!(
            l.front_to_back_points(),
            vec![
                Pt2i::new(-1, 0),
                Pt2i::new(0, 0),
                Pt2i::new(1, 0),
                Pt2i::new(2, 0)
            ]
        );
        assert_eq!(l.front_points(), vec![Pt2i::new(-1, 0)]);
        assert_eq!(l.back_points(), vec![Pt2i::new(1, 0), Pt2i::new(2, 0)]);
        assert_eq!(l.extrema(), (-1, 0, 2, 0));
    }
}
