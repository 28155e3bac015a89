//! Single-scan plateau fit for carriage tracks.

use crate::blurred::BlurredSegment;
use crate::geom::{EDist, Pt2i};

/// Detection parameters of the plateau fit, in millimeters unless noted.
#[derive(Clone, Debug)]
pub struct PlateauModel {
    /// Minimal plateau length.
    pub min_length: i32,
    /// Maximal plateau length.
    pub max_length: i32,
    /// Height tolerance around the reference height (strict bound).
    pub thickness_tolerance: i32,
    /// Tolerated height drift between successive scans.
    pub slope_tolerance: i32,
    /// Tolerated center shift relative to the reference.
    pub side_shift_tolerance: i32,
    /// Maximal tilt of the bounding blurred segment, in percent.
    pub bs_max_tilt: i32,
    /// Maximal positional gap between consecutive accepted samples.
    pub max_point_gap: i32,
    /// Maximal narrowing relative to the reference width, in percent.
    pub max_narrowing: i32,
    /// Maximal widening relative to the reference width, in percent.
    pub max_widening: i32,
    /// Minimal count of accepted plateaux in a final sequence.
    pub tail_min_size: usize,
    /// Direction-aware prediction of the reference center.
    pub deviation_prediction: bool,
    /// Slope-aware prediction of the reference height.
    pub slope_prediction: bool,
}

impl Default for PlateauModel {
    fn default() -> Self {
        PlateauModel {
            min_length: 1000,
            max_length: 10_000,
            thickness_tolerance: 250,
            slope_tolerance: 300,
            side_shift_tolerance: 1500,
            bs_max_tilt: 20,
            max_point_gap: 1000,
            max_narrowing: 50,
            max_widening: 60,
            tail_min_size: 4,
            deviation_prediction: false,
            slope_prediction: false,
        }
    }
}

/// Number of profile samples below which no fit is attempted.
const MIN_FIT_PTS: usize = 3;

/// Predicted template a plateau is fitted against: the previous accepted
/// plateau bounds and minimal height, possibly shifted by prediction.
#[derive(Clone, Copy, Debug)]
pub struct PlateauRef {
    /// Predicted start position.
    pub start: i32,
    /// Predicted end position.
    pub end: i32,
    /// Predicted minimal height (relative to the driver height base).
    pub height: i32,
}

impl PlateauRef {
    /// Returns the predicted center position.
    #[inline]
    pub fn center(&self) -> i32 {
        (self.start + self.end) / 2
    }

    /// Returns the predicted width.
    #[inline]
    pub fn width(&self) -> i32 {
        self.end - self.start
    }
}

/// Outcome of a plateau fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlateauStatus {
    /// Successful fit.
    Ok,
    /// Not enough profile samples to attempt a fit.
    NotEnoughInputPts,
    /// The candidate run is shorter than the minimal length.
    TooNarrow,
    /// Too few samples at the reference height.
    NotEnoughAltPts,
    /// Too few connected samples at the reference height.
    NotEnoughCnxPts,
    /// The fitted center drifts too far from the reference.
    NoBoundPos,
    /// The optimal height band of the run exceeds the height tolerance:
    /// the surface is not flat enough.
    OptimalHeightUnderUsed,
    /// Width shrank too much relative to the reference.
    TooLargeNarrowing,
    /// Width grew too much relative to the reference.
    TooLargeWidening,
    /// No bounding blurred segment could be fitted.
    NoBs,
    /// The bounding blurred segment is too tilted.
    TooLargeBsTilt,
    /// No sample lies within the reference height band.
    OutOfHeightRef,
}

/// A single-scan plateau fit.
///
/// Positions and heights are millimeters; heights are relative to the
/// driving detector's height base. `accepted` starts equal to
/// `status == Ok` but may be cleared afterwards by the pruning passes.
#[derive(Clone, Debug)]
pub struct Plateau {
    status: PlateauStatus,
    accepted: bool,
    reference: PlateauRef,
    internal_start: i32,
    internal_end: i32,
    external_start: i32,
    external_end: i32,
    min_height: i32,
    estimated_center: i32,
    estimated_width: i32,
    estimated_deviation: f32,
    consistent_start: bool,
    consistent_end: bool,
    consistent_width: bool,
}

impl Plateau {
    /// Fits a plateau on a profile against a reference template.
    ///
    /// `profile` holds (position, height) samples sorted by position, with
    /// heights relative to the same base as `reference.height`.
    pub fn detect(profile: &[Pt2i], reference: PlateauRef, model: &PlateauModel) -> Plateau {
        let mut pl = Plateau::rejected(PlateauStatus::Ok, reference);
        if profile.len() < MIN_FIT_PTS {
            pl.status = PlateauStatus::NotEnoughInputPts;
            return pl;
        }

        // samples strictly inside the reference height band
        let tol = model.thickness_tolerance;
        let candidates: Vec<Pt2i> = profile
            .iter()
            .copied()
            .filter(|p| (p.y() - reference.height).abs() < tol)
            .collect();
        if candidates.is_empty() {
            pl.status = PlateauStatus::OutOfHeightRef;
            return pl;
        }
        if candidates.len() < MIN_FIT_PTS {
            pl.status = PlateauStatus::NotEnoughAltPts;
            return pl;
        }

        // largest connected run of candidates
        let run = largest_run(&candidates, model.max_point_gap);
        if run.len() < MIN_FIT_PTS {
            pl.status = PlateauStatus::NotEnoughCnxPts;
            return pl;
        }
        let start = run[0].x();
        let end = run[run.len() - 1].x();
        if end - start < model.min_length {
            pl.status = PlateauStatus::TooNarrow;
            return pl;
        }

        // bounding blurred segment of the run
        let bs = match BlurredSegment::fit(run) {
            Some(bs) => bs,
            None => {
                pl.status = PlateauStatus::NoBs;
                return pl;
            }
        };
        let sv = bs.support_vector();
        let (dp, dh) = (sv.x().abs(), sv.y().abs());
        if dp == 0 || 100 * dh > model.bs_max_tilt * dp {
            pl.status = PlateauStatus::TooLargeBsTilt;
            return pl;
        }
        if bs.minimal_width() > EDist::int(tol) {
            pl.status = PlateauStatus::OptimalHeightUnderUsed;
            return pl;
        }

        pl.internal_start = start;
        pl.internal_end = end;
        pl.external_start = start - tol;
        pl.external_end = end + tol;
        pl.min_height = run.iter().map(|p| p.y()).min().unwrap_or(reference.height);
        pl.estimated_center = (start + end) / 2;
        pl.estimated_width = end - start;
        pl.estimated_deviation = if sv.x() != 0 {
            sv.y() as f32 / sv.x() as f32
        } else {
            0.0
        };

        // positional drift against the reference
        if (pl.estimated_center - reference.center()).abs() > model.side_shift_tolerance {
            pl.status = PlateauStatus::NoBoundPos;
            return pl;
        }

        // width change against the reference
        let rw = reference.width();
        if rw > 0 {
            if 100 * pl.estimated_width < rw * (100 - model.max_narrowing) {
                pl.status = PlateauStatus::TooLargeNarrowing;
                return pl;
            }
            if 100 * pl.estimated_width > rw * (100 + model.max_widening) {
                pl.status = PlateauStatus::TooLargeWidening;
                return pl;
            }
        } else if pl.estimated_width > model.max_length {
            pl.status = PlateauStatus::TooLargeWidening;
            return pl;
        }

        pl.consistent_start = (pl.internal_start - reference.start).abs() <= model.side_shift_tolerance;
        pl.consistent_end = (pl.internal_end - reference.end).abs() <= model.side_shift_tolerance;
        pl.consistent_width = rw <= 0
            || (100 * pl.estimated_width >= rw * (100 - model.max_narrowing)
                && 100 * pl.estimated_width <= rw * (100 + model.max_widening));
        pl.status = PlateauStatus::Ok;
        pl.accepted = true;
        pl
    }

    fn rejected(status: PlateauStatus, reference: PlateauRef) -> Plateau {
        Plateau {
            status,
            accepted: false,
            reference,
            internal_start: 0,
            internal_end: 0,
            external_start: 0,
            external_end: 0,
            min_height: reference.height,
            estimated_center: reference.center(),
            estimated_width: 0,
            estimated_deviation: 0.0,
            consistent_start: false,
            consistent_end: false,
            consistent_width: false,
        }
    }

    /// Returns the fit status.
    #[inline]
    pub fn status(&self) -> PlateauStatus {
        self.status
    }

    /// Returns whether the plateau is accepted (a fit may be rejected later
    /// by tail pruning even with an `Ok` status).
    #[inline]
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Withdraws the acceptance of this plateau.
    pub(crate) fn reject(&mut self) {
        self.accepted = false;
    }

    /// Returns the accepted flat extent start.
    #[inline]
    pub fn internal_start(&self) -> i32 {
        self.internal_start
    }

    /// Returns the accepted flat extent end.
    #[inline]
    pub fn internal_end(&self) -> i32 {
        self.internal_end
    }

    /// Returns the broader tolerance extent start.
    #[inline]
    pub fn external_start(&self) -> i32 {
        self.external_start
    }

    /// Returns the broader tolerance extent end.
    #[inline]
    pub fn external_end(&self) -> i32 {
        self.external_end
    }

    /// Returns the reference template the fit was run against.
    #[inline]
    pub fn reference(&self) -> PlateauRef {
        self.reference
    }

    /// Returns the minimal height of the accepted run.
    #[inline]
    pub fn min_height(&self) -> i32 {
        self.min_height
    }

    /// Returns the estimated center position.
    #[inline]
    pub fn estimated_center(&self) -> i32 {
        self.estimated_center
    }

    /// Returns the estimated width.
    #[inline]
    pub fn estimated_width(&self) -> i32 {
        self.estimated_width
    }

    /// Returns the estimated lateral deviation (height drift per position
    /// unit of the bounding segment).
    #[inline]
    pub fn estimated_deviation(&self) -> f32 {
        self.estimated_deviation
    }

    /// Returns the start-bound consistency flag.
    #[inline]
    pub fn consistent_start(&self) -> bool {
        self.consistent_start
    }

    /// Returns the end-bound consistency flag.
    #[inline]
    pub fn consistent_end(&self) -> bool {
        self.consistent_end
    }

    /// Returns the width consistency flag.
    #[inline]
    pub fn consistent_width(&self) -> bool {
        self.consistent_width
    }
}

/// Largest run of consecutive samples whose positional gaps stay within
/// `max_gap`.
fn largest_run(pts: &[Pt2i], max_gap: i32) -> &[Pt2i] {
    let mut best = (0usize, 0usize);
    let mut start = 0usize;
    for i in 1..=pts.len() {
        let broken = i == pts.len() || pts[i].x() - pts[i - 1].x() > max_gap;
        if broken {
            if i - start > best.1 - best.0 {
                best = (start, i);
            }
            start = i;
        }
    }
    &pts[best.0..best.1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> PlateauModel {
        PlateauModel {
            min_length: 3,
            max_point_gap: 2,
            thickness_tolerance: 1,
            side_shift_tolerance: 3,
            ..PlateauModel::default()
        }
    }

    #[test]
    fn test_flat_profile_seed_scenario() {
        // heights 2,2,2,2,3,3,3,3,2,2,2,2 with a template on indices 4..7
        let profile: Vec<Pt2i> = [2, 2, 2, 2, 3, 3, 3, 3, 2, 2, 2, 2]
            .iter()
            .enumerate()
            .map(|(i, h)| Pt2i::new(i as i32, *h))
            .collect();
        let reference = PlateauRef { start: 4, end: 7, height: 3 };
        let pl = Plateau::detect(&profile, reference, &model());
        assert_eq!(pl.status(), PlateauStatus::Ok);
        assert!(pl.is_accepted());
        assert_eq!(pl.internal_start(), 4);
        assert_eq!(pl.internal_end(), 7);
        assert_eq!(pl.min_height(), 3);
    }

    #[test]
    fn test_out_of_height_reference() {
        let profile: Vec<Pt2i> = (0..8).map(|i| Pt2i::new(i, 20)).collect();
        let reference = PlateauRef { start: 2, end: 5, height: 3 };
        let pl = Plateau::detect(&profile, reference, &model());
        assert_eq!(pl.status(), PlateauStatus::OutOfHeightRef);
        assert!(!pl.is_accepted());
    }

    #[test]
    fn test_too_narrow_run() {
        let mut m = model();
        m.min_length = 5;
        let profile: Vec<Pt2i> = [9, 3, 3, 3, 9, 9, 9, 9]
            .iter()
            .enumerate()
            .map(|(i, h)| Pt2i::new(i as i32, *h))
            .collect();
        let reference = PlateauRef { start: 1, end: 3, height: 3 };
        let pl = Plateau::detect(&profile, reference, &m);
        assert_eq!(pl.status(), PlateauStatus::TooNarrow);
    }

    #[test]
    fn test_center_drift_rejected() {
        let profile: Vec<Pt2i> = [3, 3, 3, 3, 3, 9, 9, 9, 9, 9, 9, 9]
            .iter()
            .enumerate()
            .map(|(i, h)| Pt2i::new(i as i32, *h))
            .collect();
        // template far on the right of the detected run
        let reference = PlateauRef { start: 7, end: 11, height: 3 };
        let pl = Plateau::detect(&profile, reference, &model());
        assert_eq!(pl.status(), PlateauStatus::NoBoundPos);
    }

    #[test]
    fn test_tilted_run_rejected() {
        let mut m = model();
        m.thickness_tolerance = 30;
        m.min_length = 3;
        m.bs_max_tilt = 10;
        // steadily climbing surface: the bounding segment tilts at 50%
        let profile: Vec<Pt2i> = (0..10).map(|i| Pt2i::new(i * 2, i)).collect();
        let reference = PlateauRef { start: 0, end: 18, height: 5 };
        let pl = Plateau::detect(&profile, reference, &m);
        assert_eq!(pl.status(), PlateauStatus::TooLargeBsTilt);
    }

    #[test]
    fn test_rough_surface_rejected() {
        let mut m = model();
        m.thickness_tolerance = 4;
        m.min_length = 3;
        // heights oscillate across the whole band width
        let profile: Vec<Pt2i> = (0..12)
            .map(|i| Pt2i::new(i, if i % 2 == 0 { 0 } else { 6 }))
            .collect();
        let reference = PlateauRef { start: 0, end: 11, height: 3 };
        let pl = Plateau::detect(&profile, reference, &m);
        assert_eq!(pl.status(), PlateauStatus::OptimalHeightUnderUsed);
    }

    #[test]
    fn test_largest_run_selection() {
        let pts: Vec<Pt2i> = [0, 1, 2, 10, 11, 12, 13, 14, 30]
            .iter()
            .map(|&x| Pt2i::new(x, 0))
            .collect();
        let run = largest_run(&pts, 2);
        assert_eq!(run.len(), 5);
        assert_eq!(run[0].x(), 10);
        assert_eq!(run[4].x(), 14);
    }
}
