//! Carriage track structure and detector.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cloud::{TileError, TileSet, PIXEL_MM};
use crate::detect::DetectionStatus;
use crate::geom::Pt2i;
use crate::profile::{Plateau, PlateauModel, PlateauRef, PlateauStatus, ScanProfile};
use crate::scan::ScannerProvider;

/// Minimal stroke length (chessboard, in pixels) accepted by the detectors.
const MIN_STROKE_LENGTH: i32 = 4;

/// Window of trailing scans examined by the density pruning.
const DENSITY_WINDOW: usize = 8;

/// A detected carriage track: per-scan plateaux indexed by scan number
/// (negative right of the stroke, 0 central, positive left), the lattice
/// points of each scan and the height base all plateau heights refer to.
#[derive(Clone, Debug, Default)]
pub struct CarriageTrack {
    plateaux: BTreeMap<i32, Plateau>,
    scans: BTreeMap<i32, Vec<Pt2i>>,
    height_base: i32,
    scan_step: f64,
}

impl CarriageTrack {
    /// Returns the plateau of a scan, if that scan was reached.
    pub fn plateau(&self, num: i32) -> Option<&Plateau> {
        self.plateaux.get(&num)
    }

    /// Returns the lattice points of a scan.
    pub fn scan(&self, num: i32) -> Option<&[Pt2i]> {
        self.scans.get(&num).map(|v| v.as_slice())
    }

    /// Returns the count of scans holding an accepted plateau.
    pub fn accepted_count(&self) -> usize {
        self.plateaux.values().filter(|p| p.is_accepted()).count()
    }

    /// Returns the count of reached scans.
    pub fn scan_count(&self) -> usize {
        self.plateaux.len()
    }

    /// Returns the scan numbers holding an accepted plateau, in order.
    pub fn accepted_scans(&self) -> Vec<i32> {
        self.plateaux
            .iter()
            .filter(|(_, p)| p.is_accepted())
            .map(|(n, _)| *n)
            .collect()
    }

    /// Returns the height base (absolute mm) plateau heights refer to.
    pub fn height_base(&self) -> i32 {
        self.height_base
    }

    /// Returns the spacing between adjacent scans in millimeters.
    pub fn scan_step(&self) -> f64 {
        self.scan_step
    }

    /// Returns the track length along the structure in millimeters.
    pub fn length(&self) -> f64 {
        let accepted = self.accepted_scans();
        match (accepted.first(), accepted.last()) {
            (Some(a), Some(b)) => (b - a) as f64 * self.scan_step,
            _ => 0.0,
        }
    }

    /// Returns the mean plateau width in millimeters.
    pub fn mean_width(&self) -> f64 {
        let widths: Vec<i32> = self
            .plateaux
            .values()
            .filter(|p| p.is_accepted())
            .map(|p| p.estimated_width())
            .collect();
        if widths.is_empty() {
            0.0
        } else {
            widths.iter().map(|w| *w as f64).sum::<f64>() / widths.len() as f64
        }
    }

    /// Returns the centerline of the track: one lattice point per accepted
    /// scan, at the estimated plateau center.
    pub fn centerline(&self) -> Vec<Pt2i> {
        let mut line = Vec::new();
        for (num, pl) in &self.plateaux {
            if !pl.is_accepted() {
                continue;
            }
            if let Some(pt) = self.scan_point_at(*num, pl.estimated_center()) {
                line.push(pt);
            }
        }
        line
    }

    /// Returns the track bounds: the start-side and end-side edge points of
    /// each accepted plateau, suitable for a closed polygon.
    pub fn bounds(&self) -> (Vec<Pt2i>, Vec<Pt2i>) {
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        for (num, pl) in &self.plateaux {
            if !pl.is_accepted() {
                continue;
            }
            if let Some(pt) = self.scan_point_at(*num, pl.internal_start()) {
                starts.push(pt);
            }
            if let Some(pt) = self.scan_point_at(*num, pl.internal_end()) {
                ends.push(pt);
            }
        }
        (starts, ends)
    }

    /// Maps a position along a scan (mm from the scan start) back to the
    /// nearest scan lattice point.
    fn scan_point_at(&self, num: i32, pos_mm: i32) -> Option<Pt2i> {
        let scan = self.scans.get(&num)?;
        if scan.is_empty() {
            return None;
        }
        let idx = (pos_mm / PIXEL_MM).clamp(0, scan.len() as i32 - 1) as usize;
        Some(scan[idx])
    }

    fn insert(&mut self, num: i32, plateau: Plateau, scan: Vec<Pt2i>) {
        self.plateaux.insert(num, plateau);
        self.scans.insert(num, scan);
    }
}

/// Carriage track detector: propagates plateau fits from a stroke along the
/// structure, then prunes inconsistent tails.
pub struct CTrackDetector<'a> {
    tiles: &'a TileSet,
    model: PlateauModel,
    lack_tolerance: u32,
    initialization: bool,
    density_sensitive: bool,
    shift_length_pruning: bool,
    max_shift_length: i32,
    density_pruning: bool,
    min_density: i32,
    tail_pruning: bool,
    dynamic_reference: bool,
    status: DetectionStatus,
    track: Option<CarriageTrack>,
}

/// Length of the smoothing window of the dynamic reference.
const REFERENCE_WINDOW: usize = 3;

/// Averages the last accepted templates into a smoothed reference.
fn smoothed_reference(history: &[PlateauRef]) -> PlateauRef {
    let n = history.len() as i32;
    PlateauRef {
        start: history.iter().map(|r| r.start).sum::<i32>() / n,
        end: history.iter().map(|r| r.end).sum::<i32>() / n,
        height: history.iter().map(|r| r.height).sum::<i32>() / n,
    }
}

impl<'a> CTrackDetector<'a> {
    /// Creates a detector over a tile set with default settings.
    pub fn new(tiles: &'a TileSet) -> Self {
        CTrackDetector {
            tiles,
            model: PlateauModel::default(),
            lack_tolerance: 5,
            initialization: true,
            density_sensitive: true,
            shift_length_pruning: true,
            max_shift_length: 800,
            density_pruning: true,
            min_density: 30,
            tail_pruning: true,
            dynamic_reference: false,
            status: DetectionStatus::None,
            track: None,
        }
    }

    /// Returns whether the propagated template is a smoothed average of the
    /// last accepted fits instead of the last one alone.
    pub fn is_dynamic_reference(&self) -> bool {
        self.dynamic_reference
    }

    /// Switches the smoothed dynamic reference.
    pub fn set_dynamic_reference(&mut self, on: bool) {
        self.dynamic_reference = on;
    }

    /// Returns the plateau model.
    pub fn model(&self) -> &PlateauModel {
        &self.model
    }

    /// Returns a mutable plateau model for configuration.
    pub fn model_mut(&mut self) -> &mut PlateauModel {
        &mut self.model
    }

    /// Returns the miss-run length terminating a side.
    pub fn lack_tolerance(&self) -> u32 {
        self.lack_tolerance
    }

    /// Sets the miss-run length terminating a side.
    pub fn set_lack_tolerance(&mut self, tol: u32) {
        self.lack_tolerance = tol;
    }

    /// Returns whether the central template is searched automatically.
    pub fn is_initialization_on(&self) -> bool {
        self.initialization
    }

    /// Switches the automatic central template search.
    pub fn set_initialization(&mut self, on: bool) {
        self.initialization = on;
    }

    /// Returns whether empty scans count as detection misses.
    pub fn is_density_sensitive(&self) -> bool {
        self.density_sensitive
    }

    /// Switches the density sensitivity.
    pub fn set_density_sensitive(&mut self, on: bool) {
        self.density_sensitive = on;
    }

    /// Returns whether the center stability pruning runs.
    pub fn is_shift_length_pruning(&self) -> bool {
        self.shift_length_pruning
    }

    /// Switches the center stability pruning.
    pub fn set_shift_length_pruning(&mut self, on: bool) {
        self.shift_length_pruning = on;
    }

    /// Returns the maximal center shift between accepted scans (mm).
    pub fn max_shift_length(&self) -> i32 {
        self.max_shift_length
    }

    /// Sets the maximal center shift between accepted scans (mm).
    pub fn set_max_shift_length(&mut self, mm: i32) {
        self.max_shift_length = mm;
    }

    /// Returns whether the density pruning runs.
    pub fn is_density_pruning(&self) -> bool {
        self.density_pruning
    }

    /// Switches the density pruning.
    pub fn set_density_pruning(&mut self, on: bool) {
        self.density_pruning = on;
    }

    /// Returns the minimal accepted/scanned ratio (percent).
    pub fn min_density(&self) -> i32 {
        self.min_density
    }

    /// Sets the minimal accepted/scanned ratio (percent).
    pub fn set_min_density(&mut self, percent: i32) {
        self.min_density = percent;
    }

    /// Returns whether short trailing runs are rejected.
    pub fn is_tail_pruning(&self) -> bool {
        self.tail_pruning
    }

    /// Switches the tail pruning.
    pub fn set_tail_pruning(&mut self, on: bool) {
        self.tail_pruning = on;
    }

    /// Returns the last detection status.
    pub fn status(&self) -> DetectionStatus {
        self.status
    }

    /// Returns the last detected track.
    pub fn track(&self) -> Option<&CarriageTrack> {
        self.track.as_ref()
    }

    /// Runs a detection from a stroke drawn across the suspected track.
    ///
    /// The call is synchronous and replaces the previous result entirely.
    pub fn detect(&mut self, p1: Pt2i, p2: Pt2i) -> DetectionStatus {
        self.track = None;
        self.status = self.run(p1, p2);
        self.status
    }

    fn run(&mut self, p1: Pt2i, p2: Pt2i) -> DetectionStatus {
        if p1 == p2 {
            return DetectionStatus::None;
        }
        if p1.chessboard(p2) < MIN_STROKE_LENGTH {
            return DetectionStatus::FailTooNarrowInput;
        }
        let mut provider = ScannerProvider::new();
        provider.set_area(0, 0, self.tiles.pixel_width(), self.tiles.pixel_height());
        let scanner = provider.scanner(p1, p2, true);
        let reversed = provider.is_last_scan_reversed();
        let side_sign = if reversed { -1 } else { 1 };
        // profile positions follow the normalized scan direction
        let (dx, dy) = if reversed {
            (p1.x() - p2.x(), p1.y() - p2.y())
        } else {
            (p2.x() - p1.x(), p2.y() - p1.y())
        };

        let mut scan = Vec::new();
        scanner.first(&mut scan);
        if scan.is_empty() {
            return DetectionStatus::FailNoCentralPlateau;
        }
        let central_profile = match ScanProfile::assemble(self.tiles, &scan, dx, dy) {
            Ok(p) => p,
            Err(TileError::Missing(_)) => return DetectionStatus::FailNoAvailableScan,
            Err(_) => return DetectionStatus::FailNoAvailableScan,
        };
        if central_profile.len() < 3 {
            return DetectionStatus::FailNoCentralPlateau;
        }

        let height_base = central_profile.min_height().unwrap_or(0);
        let rel = central_profile.relative_to(height_base);
        let reference = self.central_reference(&rel);
        let central = Plateau::detect(&rel, reference, &self.model);
        if central.status() != PlateauStatus::Ok {
            debug!(status = ?central.status(), "central plateau rejected");
            return DetectionStatus::FailNoCentralPlateau;
        }

        let mut track = CarriageTrack {
            height_base,
            scan_step: scan_step_mm(dx, dy),
            ..CarriageTrack::default()
        };
        track.insert(0, central.clone(), scan.clone());

        // propagate on each side independently
        for to_left in [true, false] {
            let num_sign = if to_left { side_sign } else { -side_sign };
            let mut sc = scanner.clone();
            let mut template = template_of(&central);
            let mut history = vec![template];
            let mut last_center = central.estimated_center();
            let mut last_height = central.min_height();
            let mut prev_accepted = true;
            let mut misses = 0u32;
            let mut num = 0i32;
            loop {
                num += 1;
                scan.clear();
                let n = if to_left {
                    sc.next_on_left(&mut scan)
                } else {
                    sc.next_on_right(&mut scan)
                };
                if n == 0 {
                    break;
                }
                let profile = match ScanProfile::assemble(self.tiles, &scan, dx, dy) {
                    Ok(p) => p,
                    Err(TileError::Missing(_)) => return DetectionStatus::FailNoAvailableScan,
                    Err(_) => return DetectionStatus::FailNoAvailableScan,
                };
                let rel = profile.relative_to(height_base);
                let plateau = Plateau::detect(&rel, template, &self.model);
                let accepted = plateau.is_accepted();
                if accepted {
                    let mut next = template_of(&plateau);
                    if self.dynamic_reference {
                        history.push(next);
                        if history.len() > REFERENCE_WINDOW {
                            history.remove(0);
                        }
                        next = smoothed_reference(&history);
                    }
                    // predictions from the drift of the two last accepted fits
                    if self.model.deviation_prediction && prev_accepted {
                        let drift = plateau.estimated_center() - last_center;
                        next.start += drift;
                        next.end += drift;
                    }
                    if self.model.slope_prediction && prev_accepted {
                        next.height += plateau.min_height() - last_height;
                    }
                    last_center = plateau.estimated_center();
                    last_height = plateau.min_height();
                    template = next;
                    misses = 0;
                } else if self.density_sensitive || plateau.status() != PlateauStatus::NotEnoughInputPts
                {
                    misses += 1;
                }
                prev_accepted = accepted;
                track.insert(num_sign * num, plateau, scan.clone());
                if misses > self.lack_tolerance {
                    break;
                }
            }
        }

        self.finish(track)
    }

    /// Seeds the central template: around the middle of the scan when the
    /// automatic initialization is on, on the full span otherwise.
    fn central_reference(&self, rel: &[Pt2i]) -> PlateauRef {
        let first = rel.first().map(|p| p.x()).unwrap_or(0);
        let last = rel.last().map(|p| p.x()).unwrap_or(0);
        let mid = (first + last) / 2;
        if self.initialization {
            // a zero-width seed skips the width-ratio controls; the first
            // accepted fit installs the real template
            let height = rel
                .iter()
                .min_by_key(|p| (p.x() - mid).abs())
                .map(|p| p.y())
                .unwrap_or(0);
            PlateauRef { start: mid, end: mid, height }
        } else {
            let height = rel.iter().map(|p| p.y()).min().unwrap_or(0);
            PlateauRef { start: first, end: last, height }
        }
    }

    /// Pruning passes and terminal status on the assembled track.
    fn finish(&mut self, mut track: CarriageTrack) -> DetectionStatus {
        let mut hectic_pruned = 0usize;
        let mut sparse_pruned = 0usize;

        for side in [1i32, -1i32] {
            let nums: Vec<i32> = track
                .plateaux
                .keys()
                .copied()
                .filter(|n| n.signum() == side)
                .collect();
            let ordered: Vec<i32> = {
                let mut v = nums;
                v.sort_by_key(|n| n.abs());
                v
            };

            // center stability: a sudden lateral jump rejects the tail
            if self.shift_length_pruning {
                let mut last_center = track
                    .plateau(0)
                    .map(|p| p.estimated_center())
                    .unwrap_or(0);
                let mut cut = false;
                for n in &ordered {
                    let pl = track.plateaux.get_mut(n).expect("listed scan");
                    if cut {
                        if pl.is_accepted() {
                            pl.reject();
                            hectic_pruned += 1;
                        }
                        continue;
                    }
                    if pl.is_accepted() {
                        if (pl.estimated_center() - last_center).abs() > self.max_shift_length {
                            cut = true;
                            pl.reject();
                            hectic_pruned += 1;
                        } else {
                            last_center = pl.estimated_center();
                        }
                    }
                }
            }

            // density: the trailing window must keep enough accepted scans
            if self.density_pruning && ordered.len() >= DENSITY_WINDOW {
                let mut cut_from = None;
                for w in 0..=(ordered.len() - DENSITY_WINDOW) {
                    let window = &ordered[w..w + DENSITY_WINDOW];
                    let acc = window
                        .iter()
                        .filter(|n| track.plateau(**n).map(|p| p.is_accepted()).unwrap_or(false))
                        .count();
                    if (acc * 100) < DENSITY_WINDOW * self.min_density as usize {
                        cut_from = Some(w);
                        break;
                    }
                }
                if let Some(w) = cut_from {
                    for n in &ordered[w..] {
                        let pl = track.plateaux.get_mut(n).expect("listed scan");
                        if pl.is_accepted() {
                            pl.reject();
                            sparse_pruned += 1;
                        }
                    }
                }
            }

            // tail: a short trailing accepted run is dropped entirely
            if self.tail_pruning {
                let mut run: Vec<i32> = Vec::new();
                for n in &ordered {
                    if track.plateau(*n).map(|p| p.is_accepted()).unwrap_or(false) {
                        run.push(*n);
                    } else {
                        run.clear();
                    }
                }
                if !run.is_empty() && run.len() < self.model.tail_min_size {
                    for n in run {
                        track.plateaux.get_mut(&n).expect("listed scan").reject();
                    }
                }
            }
        }

        let accepted = track.accepted_count();
        let scanned = track.scan_count();
        let status = if accepted < 3 {
            if hectic_pruned > accepted {
                DetectionStatus::FailTooHecticPlateaux
            } else if sparse_pruned > accepted {
                DetectionStatus::FailTooSparsePlateaux
            } else {
                DetectionStatus::FailNoConsistentSequence
            }
        } else if self.density_pruning
            && scanned > 0
            && accepted * 100 < scanned * self.min_density as usize
        {
            DetectionStatus::FailTooSparsePlateaux
        } else if !track
            .plateaux
            .values()
            .any(|p| p.is_accepted() && p.consistent_start() && p.consistent_end())
        {
            DetectionStatus::FailNoBounds
        } else {
            DetectionStatus::Ok
        };
        debug!(?status, accepted, scanned, "carriage track detection finished");
        self.track = Some(track);
        status
    }
}

/// Template carried to the next scan: the accepted bounds and minimal
/// height of the last fit.
fn template_of(pl: &Plateau) -> PlateauRef {
    PlateauRef {
        start: pl.internal_start(),
        end: pl.internal_end(),
        height: pl.min_height(),
    }
}

/// Perpendicular spacing between adjacent scans, in millimeters.
fn scan_step_mm(dx: i32, dy: i32) -> f64 {
    let (a, b) = (dx.abs() as f64, dy.abs() as f64);
    let norm = (a * a + b * b).sqrt();
    if norm == 0.0 {
        return PIXEL_MM as f64;
    }
    // side moves shift the scan start by one pixel along the secondary axis
    if b > a {
        PIXEL_MM as f64 * b / norm
    } else {
        PIXEL_MM as f64 * a / norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_step() {
        assert!((scan_step_mm(10, 0) - 500.0).abs() < 1e-9);
        assert!((scan_step_mm(0, 10) - 500.0).abs() < 1e-9);
        let diag = scan_step_mm(10, 10);
        assert!(diag > 350.0 && diag < 500.0);
    }

    #[test]
    fn test_template_of_carries_bounds() {
        let profile: Vec<Pt2i> = (0..12)
            .map(|i| Pt2i::new(i * 500, if (4..=8).contains(&i) { 100 } else { 900 }))
            .collect();
        let model = PlateauModel::default();
        let reference = PlateauRef { start: 2000, end: 4000, height: 100 };
        let pl = Plateau::detect(&profile, reference, &model);
        assert_eq!(pl.status(), PlateauStatus::Ok);
        let t = template_of(&pl);
        assert_eq!(t.start, pl.internal_start());
        assert_eq!(t.end, pl.internal_end());
        assert_eq!(t.height, pl.min_height());
    }
}
