//! Directional scanner provider.

use std::sync::Arc;

use crate::geom::{Pt2i, Vr2i};
use crate::scan::{DirectionalScanner, ScanMode, ScanOctant};

/// Builds directional scanners in the relevant octant, with optional
/// orthographic or adaptive modalities.
///
/// The provider normalizes the input stroke so that p1 is lexicographically
/// lower than p2 (by (y, x)) and records whether the stroke was reversed, so
/// callers can keep a consistent left/right orientation.
#[derive(Debug)]
pub struct ScannerProvider {
    ortho: bool,
    last_scan_reversed: bool,
    xmin: i32,
    ymin: i32,
    xmax: i32,
    ymax: i32,
}

impl Default for ScannerProvider {
    fn default() -> Self {
        ScannerProvider {
            ortho: false,
            last_scan_reversed: false,
            xmin: 0,
            ymin: 0,
            xmax: 100,
            ymax: 100,
        }
    }
}

impl ScannerProvider {
    /// Creates a provider with a default scan area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan area size, keeping the current origin.
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.xmax = self.xmin + width;
        self.ymax = self.ymin + height;
    }

    /// Sets the scan area.
    pub fn set_area(&mut self, x0: i32, y0: i32, width: i32, height: i32) {
        self.xmin = x0;
        self.ymin = y0;
        self.xmax = x0 + width;
        self.ymax = y0 + height;
    }

    /// Selects the orthographic modality (scans aligned to rows/columns).
    pub fn set_ortho(&mut self, status: bool) {
        self.ortho = status;
    }

    /// Returns whether the last scanner creation reversed its input stroke.
    pub fn is_last_scan_reversed(&self) -> bool {
        self.last_scan_reversed
    }

    /// Returns whether a scan direction vector gets reversed at creation.
    pub fn is_reversed(vec: Vr2i) -> bool {
        vec.y() < 0 || (vec.y() == 0 && vec.x() < 0)
    }

    /// Returns a scanner whose central scan joins the two stroke points.
    pub fn scanner(&mut self, p1: Pt2i, p2: Pt2i, adaptive: bool) -> DirectionalScanner {
        // Enforce p1 lower than p2, or left of it at equal height
        self.last_scan_reversed =
            p1.y() > p2.y() || (p1.y() == p2.y() && p1.x() > p2.x());
        let (p1, p2) = if self.last_scan_reversed { (p2, p1) } else { (p1, p2) };

        let steps: Arc<[bool]> = p1.steps_to(p2).into();

        // Support line equation ax + by = c with a >= 0, b > 0 when a = 0
        let mut a = p2.x() - p1.x();
        let mut b = p2.y() - p1.y();
        if a < 0 || (a == 0 && b < 0) {
            a = -a;
            b = -b;
        }
        let c2 = a * p2.x() + b * p2.y();
        let octant = ScanOctant::of(a, b);
        let area = (self.xmin, self.ymin, self.xmax, self.ymax);

        if self.ortho {
            let (sx, sy) = ortho_start(octant, p1, p2);
            return DirectionalScanner::from_start(
                octant,
                ScanMode::Orthographic,
                area,
                a,
                b,
                c2,
                steps,
                sx,
                sy,
            );
        }
        let mode = if adaptive { ScanMode::Adaptive } else { ScanMode::Incremental };
        DirectionalScanner::from_start(octant, mode, area, a, b, c2, steps, p1.x(), p1.y())
    }

    /// Returns a scanner from a central scan center, director vector and
    /// length.
    pub fn scanner_from_center(
        &mut self,
        center: Pt2i,
        normal: Vr2i,
        length: i32,
        adaptive: bool,
    ) -> DirectionalScanner {
        let steps: Arc<[bool]> =
            center.steps_to(Pt2i::new(center.x() + normal.x(), center.y() + normal.y())).into();

        let mut a = normal.x();
        let mut b = normal.y();
        self.last_scan_reversed = b < 0 || (b == 0 && a < 0);
        if a < 0 || (a == 0 && b < 0) {
            a = -a;
            b = -b;
        }
        let octant = ScanOctant::of(a, b);
        let area = (self.xmin, self.ymin, self.xmax, self.ymax);
        let mode = if adaptive {
            if self.ortho {
                ScanMode::Orthographic
            } else {
                ScanMode::Adaptive
            }
        } else {
            ScanMode::Incremental
        };
        DirectionalScanner::from_center_length(
            octant,
            mode,
            area,
            a,
            b,
            steps,
            center.x(),
            center.y(),
            length,
        )
    }
}

/// Start position of the central orthographic scan: the row or column
/// through the stroke middle, at the height of the first support line.
fn ortho_start(octant: ScanOctant, p1: Pt2i, p2: Pt2i) -> (i32, i32) {
    match octant {
        ScanOctant::O1 => {
            let repx = (p1.x() + p2.x()) / 2;
            let repy = p1.y() - (p1.x() - repx) * (p1.x() - p2.x()) / (p2.y() - p1.y());
            (repx, repy)
        }
        ScanOctant::O2 => {
            let repy = (p1.y() + p2.y()) / 2;
            let repx = p1.x() + (repy - p1.y()) * (p2.y() - p1.y()) / (p1.x() - p2.x());
            (repx, repy)
        }
        ScanOctant::O8 => {
            let repx = (p1.x() + p2.x()) / 2;
            let repy = p1.y() - (repx - p1.x()) * (p2.x() - p1.x()) / (p2.y() - p1.y());
            (repx, repy)
        }
        ScanOctant::O7 => {
            let repy = (p1.y() + p2.y()) / 2;
            let repx = p1.x() - (repy - p1.y()) * (p2.y() - p1.y()) / (p2.x() - p1.x());
            (repx, repy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_normalization() {
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, 20, 20);
        provider.scanner(Pt2i::new(10, 7), Pt2i::new(0, 0), false);
        assert!(provider.is_last_scan_reversed());
        provider.scanner(Pt2i::new(0, 0), Pt2i::new(10, 7), false);
        assert!(!provider.is_last_scan_reversed());
    }

    #[test]
    fn test_reversed_strokes_cover_same_central_scan() {
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, 20, 20);
        let s1 = provider.scanner(Pt2i::new(0, 0), Pt2i::new(10, 7), false);
        let s2 = provider.scanner(Pt2i::new(10, 7), Pt2i::new(0, 0), false);
        let mut c1 = Vec::new();
        let mut c2 = Vec::new();
        s1.first(&mut c1);
        s2.first(&mut c2);
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_is_reversed_vector() {
        assert!(ScannerProvider::is_reversed(Vr2i::new(3, -1)));
        assert!(ScannerProvider::is_reversed(Vr2i::new(-3, 0)));
        assert!(!ScannerProvider::is_reversed(Vr2i::new(-3, 1)));
        assert!(!ScannerProvider::is_reversed(Vr2i::new(3, 0)));
    }

    #[test]
    fn test_scanner_from_center_produces_centered_scan() {
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, 40, 40);
        let sc = provider.scanner_from_center(Pt2i::new(20, 20), Vr2i::new(12, 5), 14, true);
        let mut scan = Vec::new();
        sc.first(&mut scan);
        assert!(!scan.is_empty());
        // the center belongs to the central scan
        assert!(scan.contains(&Pt2i::new(20, 20)));
        // scan length close to the requested one
        assert!((scan.len() as i32 - 14).abs() <= 2);
    }
}
