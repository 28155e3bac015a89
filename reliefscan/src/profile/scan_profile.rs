//! 1-D height profile of one scan.

use crate::cloud::{Pt3i, TileError, TileSet, PIXEL_MM};
use crate::geom::Pt2i;

/// The height profile of one scan: samples (position, height) in
/// millimeters, sorted by increasing position along the scan direction.
///
/// Heights are absolute; detectors work on a window translated to a height
/// reference so the exact-arithmetic fits stay in a safe integer range.
#[derive(Clone, Debug, Default)]
pub struct ScanProfile {
    pts: Vec<(i32, i32)>,
}

impl ScanProfile {
    /// Assembles the profile of a scan from the tile set.
    ///
    /// Every lattice point of `scan` (DTM pixel coordinates) queries the
    /// tile set; the collected 3-D points are projected onto the direction
    /// `(dx, dy)` (pixel units), measured from the center of the first scan
    /// pixel.
    pub fn assemble(
        tiles: &TileSet,
        scan: &[Pt2i],
        dx: i32,
        dy: i32,
    ) -> Result<ScanProfile, TileError> {
        let mut profile = ScanProfile::default();
        if scan.is_empty() {
            return Ok(profile);
        }
        let norm = ((dx as f64) * (dx as f64) + (dy as f64) * (dy as f64)).sqrt();
        if norm == 0.0 {
            return Ok(profile);
        }
        let ox = scan[0].x() as i64 * PIXEL_MM as i64 + PIXEL_MM as i64 / 2;
        let oy = scan[0].y() as i64 * PIXEL_MM as i64 + PIXEL_MM as i64 / 2;
        let ux = dx as f64 / norm;
        let uy = dy as f64 / norm;

        let mut cell = Vec::new();
        for px in scan {
            cell.clear();
            tiles.collect_pixel_points(&mut cell, px.x(), px.y())?;
            for p in &cell {
                profile.push_projected(*p, ox, oy, ux, uy);
            }
        }
        profile.pts.sort_unstable();
        Ok(profile)
    }

    fn push_projected(&mut self, p: Pt3i, ox: i64, oy: i64, ux: f64, uy: f64) {
        let rx = (p.x() as i64 - ox) as f64;
        let ry = (p.y() as i64 - oy) as f64;
        let pos = (rx * ux + ry * uy).round() as i32;
        self.pts.push((pos, p.z()));
    }

    /// Builds a profile directly from (position, height) samples.
    pub fn from_samples(mut pts: Vec<(i32, i32)>) -> ScanProfile {
        pts.sort_unstable();
        ScanProfile { pts }
    }

    /// Returns the count of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.pts.len()
    }

    /// Returns whether the profile holds no sample.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pts.is_empty()
    }

    /// Returns the samples (position, absolute height).
    #[inline]
    pub fn samples(&self) -> &[(i32, i32)] {
        &self.pts
    }

    /// Returns the lowest height of the profile, if any.
    pub fn min_height(&self) -> Option<i32> {
        self.pts.iter().map(|&(_, h)| h).min()
    }

    /// Returns the samples translated to a height reference, as lattice
    /// points (position, height - reference) suitable for exact fits.
    pub fn relative_to(&self, height_ref: i32) -> Vec<Pt2i> {
        self.pts
            .iter()
            .map(|&(pos, h)| Pt2i::new(pos, h - height_ref))
            .collect()
    }

    /// Returns the samples with negated relative heights, used for hollow
    /// detection.
    pub fn inverted_relative_to(&self, height_ref: i32) -> Vec<Pt2i> {
        self.pts
            .iter()
            .map(|&(pos, h)| Pt2i::new(pos, height_ref - h))
            .collect()
    }

    /// Returns the positional extent (min, max), if any sample exists.
    pub fn span(&self) -> Option<(i32, i32)> {
        let first = self.pts.first()?;
        let last = self.pts.last()?;
        Some((first.0, last.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_samples_sorts_by_position() {
        let p = ScanProfile::from_samples(vec![(30, 5), (10, 2), (20, 9)]);
        assert_eq!(p.samples(), &[(10, 2), (20, 9), (30, 5)]);
        assert_eq!(p.span(), Some((10, 30)));
        assert_eq!(p.min_height(), Some(2));
    }

    #[test]
    fn test_relative_translation() {
        let p = ScanProfile::from_samples(vec![(0, 1000), (10, 1200)]);
        assert_eq!(
            p.relative_to(1000),
            vec![Pt2i::new(0, 0), Pt2i::new(10, 200)]
        );
        assert_eq!(
            p.inverted_relative_to(1000),
            vec![Pt2i::new(0, 0), Pt2i::new(10, -200)]
        );
    }
}
