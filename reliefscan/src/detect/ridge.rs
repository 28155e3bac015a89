//! Ridge / hollow structure and detector.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cloud::{TileError, TileSet, PIXEL_MM};
use crate::detect::DetectionStatus;
use crate::geom::Pt2i;
use crate::profile::{Bump, BumpModel, BumpRef, BumpStatus, ScanProfile};
use crate::scan::ScannerProvider;

/// Minimal stroke length (chessboard, in pixels) accepted by the detectors.
const MIN_STROKE_LENGTH: i32 = 4;

/// Window of trailing scans examined by the density pruning.
const DENSITY_WINDOW: usize = 8;

/// Kind of elongated relief structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructureKind {
    /// Elongated mound: bumps on the raw heights.
    Ridge,
    /// Elongated ditch: bumps on the negated heights.
    Hollow,
}

/// A detected ridge or hollow: per-scan bumps indexed by scan number
/// (negative right of the stroke, 0 central, positive left), with the
/// lattice points of each scan, the per-scan profiles (kept for the measure
/// lines) and the height base.
#[derive(Clone, Debug, Default)]
pub struct Ridge {
    bumps: BTreeMap<i32, Bump>,
    scans: BTreeMap<i32, Vec<Pt2i>>,
    profiles: BTreeMap<i32, Vec<Pt2i>>,
    height_base: i32,
    scan_step: f64,
    hollow: bool,
}

impl Ridge {
    /// Returns the bump of a scan, if that scan was reached.
    pub fn bump(&self, num: i32) -> Option<&Bump> {
        self.bumps.get(&num)
    }

    /// Returns the lattice points of a scan.
    pub fn scan(&self, num: i32) -> Option<&[Pt2i]> {
        self.scans.get(&num).map(|v| v.as_slice())
    }

    /// Returns the relative profile of a scan.
    pub fn profile(&self, num: i32) -> Option<&[Pt2i]> {
        self.profiles.get(&num).map(|v| v.as_slice())
    }

    /// Returns whether the structure is a hollow (heights negated).
    pub fn is_hollow(&self) -> bool {
        self.hollow
    }

    /// Returns the count of scans holding an accepted bump.
    pub fn accepted_count(&self) -> usize {
        self.bumps.values().filter(|b| b.is_accepted()).count()
    }

    /// Returns the count of reached scans.
    pub fn scan_count(&self) -> usize {
        self.bumps.len()
    }

    /// Returns the scan numbers holding an accepted bump, in order.
    pub fn accepted_scans(&self) -> Vec<i32> {
        self.bumps
            .iter()
            .filter(|(_, b)| b.is_accepted())
            .map(|(n, _)| *n)
            .collect()
    }

    /// Returns the height base (absolute mm) bump altitudes refer to.
    pub fn height_base(&self) -> i32 {
        self.height_base
    }

    /// Returns the spacing between adjacent scans in millimeters.
    pub fn scan_step(&self) -> f64 {
        self.scan_step
    }

    /// Returns the structure length along its course in millimeters.
    pub fn length(&self) -> f64 {
        let accepted = self.accepted_scans();
        match (accepted.first(), accepted.last()) {
            (Some(a), Some(b)) => (b - a) as f64 * self.scan_step,
            _ => 0.0,
        }
    }

    /// Returns the mean bump width in millimeters.
    pub fn mean_width(&self) -> f64 {
        let ws: Vec<i32> = self
            .bumps
            .values()
            .filter(|b| b.is_accepted())
            .map(|b| b.estimated_width())
            .collect();
        if ws.is_empty() {
            0.0
        } else {
            ws.iter().map(|w| *w as f64).sum::<f64>() / ws.len() as f64
        }
    }

    /// Returns the mean bump height in millimeters.
    pub fn mean_height(&self) -> f64 {
        let hs: Vec<i32> = self
            .bumps
            .values()
            .filter(|b| b.is_accepted())
            .map(|b| b.estimated_height())
            .collect();
        if hs.is_empty() {
            0.0
        } else {
            hs.iter().map(|h| *h as f64).sum::<f64>() / hs.len() as f64
        }
    }

    /// Returns the earthwork volume estimate: the integral of the per-scan
    /// areas over the structure course, in cubic millimeters.
    pub fn volume(&self) -> f64 {
        self.bumps
            .values()
            .filter(|b| b.is_accepted())
            .map(|b| b.estimated_area() as f64 * self.scan_step)
            .sum()
    }

    /// Returns the centerline: one lattice point per accepted scan, at the
    /// estimated summit position.
    pub fn centerline(&self) -> Vec<Pt2i> {
        let mut line = Vec::new();
        for (num, b) in &self.bumps {
            if !b.is_accepted() {
                continue;
            }
            if let Some(pt) = self.scan_point_at(*num, b.estimated_summit().0) {
                line.push(pt);
            }
        }
        line
    }

    /// Returns the structure bounds: the start-side and end-side crossing
    /// points of each accepted bump.
    pub fn bounds(&self) -> (Vec<Pt2i>, Vec<Pt2i>) {
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        for (num, b) in &self.bumps {
            if !b.is_accepted() {
                continue;
            }
            if let Some(pt) = self.scan_point_at(*num, b.start()) {
                starts.push(pt);
            }
            if let Some(pt) = self.scan_point_at(*num, b.end()) {
                ends.push(pt);
            }
        }
        (starts, ends)
    }

    /// Moves the measure line of one scan and recomputes its area.
    pub fn set_measure_line(&mut self, num: i32, translation: f32, rotation: f32) {
        if let (Some(bump), Some(profile)) = (self.bumps.get_mut(&num), self.profiles.get(&num)) {
            bump.set_measure_line(translation, rotation, profile);
        }
    }

    fn scan_point_at(&self, num: i32, pos_mm: i32) -> Option<Pt2i> {
        let scan = self.scans.get(&num)?;
        if scan.is_empty() {
            return None;
        }
        let idx = (pos_mm / PIXEL_MM).clamp(0, scan.len() as i32 - 1) as usize;
        Some(scan[idx])
    }

    fn insert(&mut self, num: i32, bump: Bump, scan: Vec<Pt2i>, profile: Vec<Pt2i>) {
        self.bumps.insert(num, bump);
        self.scans.insert(num, scan);
        self.profiles.insert(num, profile);
    }
}

/// Ridge / hollow detector: propagates bump fits from a stroke along the
/// structure, then prunes inconsistent tails.
pub struct RidgeDetector<'a> {
    tiles: &'a TileSet,
    model: BumpModel,
    kind: StructureKind,
    lack_tolerance: u32,
    density_pruning: bool,
    min_density: i32,
    tail_pruning: bool,
    tail_min_size: usize,
    dynamic_reference: bool,
    status: DetectionStatus,
    ridge: Option<Ridge>,
}

/// Length of the smoothing window of the dynamic reference.
const REFERENCE_WINDOW: usize = 3;

/// Averages the last accepted templates into a smoothed reference.
fn smoothed_reference(history: &[BumpRef]) -> BumpRef {
    let n = history.len() as i32;
    BumpRef {
        start: history.iter().map(|r| r.start).sum::<i32>() / n,
        end: history.iter().map(|r| r.end).sum::<i32>() / n,
        altitude: history.iter().map(|r| r.altitude).sum::<i32>() / n,
        width: history.iter().map(|r| r.width).sum::<i32>() / n,
        height: history.iter().map(|r| r.height).sum::<i32>() / n,
    }
}

impl<'a> RidgeDetector<'a> {
    /// Creates a ridge detector over a tile set with default settings.
    pub fn new(tiles: &'a TileSet) -> Self {
        RidgeDetector {
            tiles,
            model: BumpModel::default(),
            kind: StructureKind::Ridge,
            lack_tolerance: 5,
            density_pruning: true,
            min_density: 30,
            tail_pruning: true,
            tail_min_size: 4,
            dynamic_reference: false,
            status: DetectionStatus::None,
            ridge: None,
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

    /// Returns the bump model.
    pub fn model(&self) -> &BumpModel {
        &self.model
    }

    /// Returns a mutable bump model for configuration.
    pub fn model_mut(&mut self) -> &mut BumpModel {
        &mut self.model
    }

    /// Returns the detected structure kind.
    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    /// Selects ridge or hollow detection.
    pub fn set_kind(&mut self, kind: StructureKind) {
        self.kind = kind;
    }

    /// Returns the miss-run length terminating a side.
    pub fn lack_tolerance(&self) -> u32 {
        self.lack_tolerance
    }

    /// Sets the miss-run length terminating a side.
    pub fn set_lack_tolerance(&mut self, tol: u32) {
        self.lack_tolerance = tol;
    }

    /// Switches the density pruning.
    pub fn set_density_pruning(&mut self, on: bool) {
        self.density_pruning = on;
    }

    /// Sets the minimal accepted/scanned ratio (percent).
    pub fn set_min_density(&mut self, percent: i32) {
        self.min_density = percent;
    }

    /// Switches the tail pruning.
    pub fn set_tail_pruning(&mut self, on: bool) {
        self.tail_pruning = on;
    }

    /// Sets the minimal trailing accepted run length.
    pub fn set_tail_min_size(&mut self, size: usize) {
        self.tail_min_size = size;
    }

    /// Returns the last detection status.
    pub fn status(&self) -> DetectionStatus {
        self.status
    }

    /// Returns the last detected structure.
    pub fn ridge(&self) -> Option<&Ridge> {
        self.ridge.as_ref()
    }

    /// Returns the last detected structure mutably, for measure line edits.
    pub fn ridge_mut(&mut self) -> Option<&mut Ridge> {
        self.ridge.as_mut()
    }

    /// Runs a detection from a stroke drawn across the suspected structure.
    pub fn detect(&mut self, p1: Pt2i, p2: Pt2i) -> DetectionStatus {
        self.ridge = None;
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
        let hollow = self.kind == StructureKind::Hollow;

        let mut scan = Vec::new();
        scanner.first(&mut scan);
        if scan.is_empty() {
            return DetectionStatus::FailNoCentralBump;
        }
        let central_profile = match ScanProfile::assemble(self.tiles, &scan, dx, dy) {
            Ok(p) => p,
            Err(TileError::Missing(_)) => return DetectionStatus::FailNoAvailableScan,
            Err(_) => return DetectionStatus::FailNoAvailableScan,
        };
        if central_profile.is_empty() {
            return DetectionStatus::FailNoCentralBump;
        }

        let height_base = if hollow {
            central_profile.samples().iter().map(|&(_, h)| h).max().unwrap_or(0)
        } else {
            central_profile.min_height().unwrap_or(0)
        };
        let rel = if hollow {
            central_profile.inverted_relative_to(height_base)
        } else {
            central_profile.relative_to(height_base)
        };
        let reference = central_reference(&rel);
        let central = Bump::detect(&rel, reference, &self.model);
        if central.status() != BumpStatus::Ok {
            debug!(status = ?central.status(), "central bump rejected");
            return DetectionStatus::FailNoCentralBump;
        }

        let mut ridge = Ridge {
            height_base,
            scan_step: scan_step_mm(dx, dy),
            hollow,
            ..Ridge::default()
        };
        ridge.insert(0, central.clone(), scan.clone(), rel);

        for to_left in [true, false] {
            let num_sign = if to_left { side_sign } else { -side_sign };
            let mut sc = scanner.clone();
            let mut template = template_of(&central);
            let mut history = vec![template];
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
                let rel = if hollow {
                    profile.inverted_relative_to(height_base)
                } else {
                    profile.relative_to(height_base)
                };
                let bump = Bump::detect(&rel, template, &self.model);
                if bump.is_accepted() {
                    let mut next = template_of(&bump);
                    if self.dynamic_reference {
                        history.push(next);
                        if history.len() > REFERENCE_WINDOW {
                            history.remove(0);
                        }
                        next = smoothed_reference(&history);
                    }
                    template = next;
                    misses = 0;
                } else {
                    misses += 1;
                }
                ridge.insert(num_sign * num, bump, scan.clone(), rel);
                if misses > self.lack_tolerance {
                    break;
                }
            }
        }

        self.finish(ridge)
    }

    /// Pruning passes and terminal status on the assembled structure.
    fn finish(&mut self, mut ridge: Ridge) -> DetectionStatus {
        let mut sparse_pruned = 0usize;

        for side in [1i32, -1i32] {
            let ordered: Vec<i32> = {
                let mut v: Vec<i32> = ridge
                    .bumps
                    .keys()
                    .copied()
                    .filter(|n| n.signum() == side)
                    .collect();
                v.sort_by_key(|n| n.abs());
                v
            };

            if self.density_pruning && ordered.len() >= DENSITY_WINDOW {
                let mut cut_from = None;
                for w in 0..=(ordered.len() - DENSITY_WINDOW) {
                    let window = &ordered[w..w + DENSITY_WINDOW];
                    let acc = window
                        .iter()
                        .filter(|n| ridge.bump(**n).map(|b| b.is_accepted()).unwrap_or(false))
                        .count();
                    if (acc * 100) < DENSITY_WINDOW * self.min_density as usize {
                        cut_from = Some(w);
                        break;
                    }
                }
                if let Some(w) = cut_from {
                    for n in &ordered[w..] {
                        let b = ridge.bumps.get_mut(n).expect("listed scan");
                        if b.is_accepted() {
                            b.reject();
                            sparse_pruned += 1;
                        }
                    }
                }
            }

            if self.tail_pruning {
                let mut run: Vec<i32> = Vec::new();
                for n in &ordered {
                    if ridge.bump(*n).map(|b| b.is_accepted()).unwrap_or(false) {
                        run.push(*n);
                    } else {
                        run.clear();
                    }
                }
                if !run.is_empty() && run.len() < self.tail_min_size {
                    for n in run {
                        ridge.bumps.get_mut(&n).expect("listed scan").reject();
                    }
                }
            }
        }

        let accepted = ridge.accepted_count();
        let scanned = ridge.scan_count();
        let status = if accepted < 3 {
            if sparse_pruned > accepted {
                DetectionStatus::FailTooSparsePlateaux
            } else {
                DetectionStatus::FailNoConsistentSequence
            }
        } else if self.density_pruning
            && scanned > 0
            && accepted * 100 < scanned * self.min_density as usize
        {
            DetectionStatus::FailTooSparsePlateaux
        } else if ridge
            .bumps
            .values()
            .all(|b| !b.is_accepted() || b.estimated_width() == 0)
        {
            DetectionStatus::FailNoBounds
        } else {
            DetectionStatus::Ok
        };
        debug!(?status, accepted, scanned, "ridge detection finished");
        self.ridge = Some(ridge);
        status
    }
}

/// Seeds the central template on the middle third of the scan.
fn central_reference(rel: &[Pt2i]) -> BumpRef {
    let first = rel.first().map(|p| p.x()).unwrap_or(0);
    let last = rel.last().map(|p| p.x()).unwrap_or(0);
    let third = (last - first) / 3;
    let max_h = rel.iter().map(|p| p.y()).max().unwrap_or(0);
    BumpRef {
        start: first + third,
        end: last - third,
        altitude: max_h,
        width: 0,
        height: 0,
    }
}

/// Template carried to the next scan.
fn template_of(b: &Bump) -> BumpRef {
    BumpRef {
        start: b.start(),
        end: b.end(),
        altitude: b.estimated_summit().1,
        width: b.estimated_width(),
        height: b.estimated_height(),
    }
}

/// Perpendicular spacing between adjacent scans, in millimeters.
fn scan_step_mm(dx: i32, dy: i32) -> f64 {
    let (a, b) = (dx.abs() as f64, dy.abs() as f64);
    let norm = (a * a + b * b).sqrt();
    if norm == 0.0 {
        return PIXEL_MM as f64;
    }
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
    fn test_central_reference_middle_third() {
        let rel: Vec<Pt2i> = (0..10).map(|i| Pt2i::new(i * 300, i % 4)).collect();
        let r = central_reference(&rel);
        assert_eq!(r.start, 900);
        assert_eq!(r.end, 1800);
    }

    #[test]
    fn test_template_of_carries_estimates() {
        let profile: Vec<Pt2i> = [0, 0, 200, 600, 1000, 600, 200, 0, 0]
            .iter()
            .enumerate()
            .map(|(i, h)| Pt2i::new(i as i32 * 500, *h))
            .collect();
        let model = BumpModel::default();
        let reference = BumpRef { start: 1000, end: 3000, altitude: 1000, width: 2000, height: 1000 };
        let bump = Bump::detect(&profile, reference, &model);
        assert_eq!(bump.status(), BumpStatus::Ok);
        let t = template_of(&bump);
        assert_eq!(t.start, bump.start());
        assert_eq!(t.end, bump.end());
        assert_eq!(t.height, bump.estimated_height());
    }
}
