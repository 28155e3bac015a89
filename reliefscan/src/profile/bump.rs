//! Single-scan bump fit for ridges and hollows.

use crate::blurred::BlurredSegment;
use crate::geom::{EDist, Pt2i};

/// Severity of a template control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlLevel {
    /// Control disabled.
    #[default]
    Off,
    /// Violations are reported in the default flags only.
    Reported,
    /// Violations also withdraw the bump acceptance.
    Strict,
}

impl ControlLevel {
    /// Parses the integer encoding used by the configuration file.
    pub fn from_code(code: i64) -> ControlLevel {
        match code {
            1 => ControlLevel::Reported,
            2 => ControlLevel::Strict,
            _ => ControlLevel::Off,
        }
    }

    /// Returns the integer encoding used by the configuration file.
    pub fn code(self) -> i64 {
        match self {
            ControlLevel::Off => 0,
            ControlLevel::Reported => 1,
            ControlLevel::Strict => 2,
        }
    }
}

/// Bitmask of soft-failed template controls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultFlags(u8);

impl DefaultFlags {
    /// Position control failed.
    pub const POSITION: u8 = 1;
    /// Altitude control failed.
    pub const ALTITUDE: u8 = 2;
    /// Width control failed.
    pub const WIDTH: u8 = 4;
    /// Height control failed.
    pub const HEIGHT: u8 = 8;

    /// Sets one flag.
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Checks one flag.
    pub fn contains(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Returns whether no control failed.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the raw bit mask.
    pub fn bits(&self) -> u8 {
        self.0
    }
}

/// Detection parameters of the bump fit, in millimeters unless noted.
#[derive(Clone, Debug)]
pub struct BumpModel {
    /// Minimal bump width.
    pub min_width: i32,
    /// Minimal bump height above the baseline.
    pub min_height: i32,
    /// Reference the mass center instead of the geometric center for the
    /// position control.
    pub mass_center_ref: bool,
    /// Position control severity.
    pub position_control: ControlLevel,
    /// Absolute position shift tolerance.
    pub position_shift_tolerance: i32,
    /// Relative position shift tolerance, in percent of the template width.
    pub position_rel_shift_tolerance: i32,
    /// Altitude control severity.
    pub altitude_control: ControlLevel,
    /// Absolute altitude shift tolerance.
    pub altitude_shift_tolerance: i32,
    /// Relative altitude shift tolerance, in percent of the template height.
    pub altitude_rel_shift_tolerance: i32,
    /// Width control severity.
    pub width_control: ControlLevel,
    /// Absolute width shift tolerance.
    pub width_shift_tolerance: i32,
    /// Relative width shift tolerance, in percent of the template width.
    pub width_rel_shift_tolerance: i32,
    /// Height control severity.
    pub height_control: ControlLevel,
    /// Absolute height shift tolerance.
    pub height_shift_tolerance: i32,
    /// Relative height shift tolerance, in percent of the template height.
    pub height_rel_shift_tolerance: i32,
    /// Fit straight trends on the bump flanks to carry the baseline.
    pub detect_trend: bool,
    /// Minimal bump height over converging trends; below it the profile is
    /// an angular slope break, not a bump.
    pub trend_min_pinch: i32,
    /// Maximal positional gap between consecutive samples inside the
    /// template span.
    pub max_point_gap: i32,
}

impl Default for BumpModel {
    fn default() -> Self {
        BumpModel {
            min_width: 1000,
            min_height: 200,
            mass_center_ref: false,
            position_control: ControlLevel::Reported,
            position_shift_tolerance: 2000,
            position_rel_shift_tolerance: 30,
            altitude_control: ControlLevel::Reported,
            altitude_shift_tolerance: 500,
            altitude_rel_shift_tolerance: 30,
            width_control: ControlLevel::Reported,
            width_shift_tolerance: 2000,
            width_rel_shift_tolerance: 40,
            height_control: ControlLevel::Reported,
            height_shift_tolerance: 300,
            height_rel_shift_tolerance: 40,
            detect_trend: false,
            trend_min_pinch: 200,
            max_point_gap: 1000,
        }
    }
}

/// Number of profile samples below which no fit is attempted.
const MIN_FIT_PTS: usize = 3;

/// Number of flank samples required to fit a trend.
const MIN_TREND_PTS: usize = 3;

/// Template a bump is fitted against.
#[derive(Clone, Copy, Debug)]
pub struct BumpRef {
    /// Predicted start position.
    pub start: i32,
    /// Predicted end position.
    pub end: i32,
    /// Predicted summit altitude (relative to the driver height base).
    pub altitude: i32,
    /// Predicted width.
    pub width: i32,
    /// Predicted height above the baseline.
    pub height: i32,
}

impl BumpRef {
    /// Returns the predicted center position.
    #[inline]
    pub fn center(&self) -> i32 {
        (self.start + self.end) / 2
    }
}

/// Outcome of a bump fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BumpStatus {
    /// Successful fit (template controls may still raise default flags).
    Ok,
    /// Not enough profile samples to attempt a fit.
    NotEnoughInputPts,
    /// A positional hole crosses the template span.
    HoleInInputPts,
    /// No relief reaches the minimal height above the baseline.
    TooLow,
    /// The baseline crossings delimit a span below the minimal width.
    TooNarrow,
    /// The scan produced no sample at all.
    EmptyScan,
    /// No baseline could be established under the bump.
    NoBumpLine,
    /// The whole profile fits a thin straight band: no relief.
    Linear,
    /// The flank trends pinch into a slope break instead of a bump.
    Angular,
}

/// A straight trend fitted on one bump flank.
#[derive(Clone, Debug)]
pub struct TrendFit {
    a: i32,
    b: i32,
    c0: f64,
    thickness: EDist,
    first: Pt2i,
    last: Pt2i,
}

impl TrendFit {
    /// Fits a trend on flank samples; `None` when the flank is too short or
    /// vertical.
    pub fn fit(samples: &[Pt2i]) -> Option<TrendFit> {
        if samples.len() < MIN_TREND_PTS {
            return None;
        }
        let bs = BlurredSegment::fit(samples)?;
        let (a, b, c, nu) = bs.segment().line().equation();
        if b == 0 {
            return None;
        }
        Some(TrendFit {
            a,
            b,
            c0: c as f64 + (nu - 1) as f64 / 2.0,
            thickness: bs.minimal_width(),
            first: samples[0],
            last: samples[samples.len() - 1],
        })
    }

    /// Height of the trend central line at the given position.
    pub fn height_at(&self, pos: i32) -> f64 {
        (self.c0 - self.a as f64 * pos as f64) / self.b as f64
    }

    /// Slope of the trend (height per position unit).
    pub fn slope(&self) -> f64 {
        -(self.a as f64) / self.b as f64
    }

    /// Thickness of the fitted band.
    pub fn thickness(&self) -> EDist {
        self.thickness
    }

    /// First fitted sample.
    pub fn first(&self) -> Pt2i {
        self.first
    }

    /// Last fitted sample.
    pub fn last(&self) -> Pt2i {
        self.last
    }
}

/// Baseline under the bump: a straight line in (position, height) space.
#[derive(Clone, Copy, Debug)]
struct Baseline {
    x0: i32,
    y0: f64,
    slope: f64,
}

impl Baseline {
    fn at(&self, pos: i32) -> f64 {
        self.y0 + self.slope * (pos - self.x0) as f64
    }
}

/// A single-scan bump fit.
///
/// Positions and heights are millimeters, heights relative to the driving
/// detector's height base. Hollows are detected on negated heights, so a
/// hollow bump's altitude grows downwards in map space.
#[derive(Clone, Debug)]
pub struct Bump {
    status: BumpStatus,
    accepted: bool,
    defaults: DefaultFlags,
    reference: BumpRef,
    start: i32,
    end: i32,
    estimated_center: (i32, i32),
    estimated_mass_center: (i32, i32),
    estimated_summit: (i32, i32),
    estimated_width: i32,
    estimated_height: i32,
    start_trend: Option<TrendFit>,
    end_trend: Option<TrendFit>,
    baseline: Option<Baseline>,
    area: i64,
    area_lower: i64,
    area_upper: i64,
    measure_translation: f32,
    measure_rotation: f32,
}

impl Bump {
    /// Fits a bump on a profile against a reference template.
    ///
    /// `profile` holds (position, height) samples sorted by position, with
    /// heights relative to the driver height base; for hollows the heights
    /// are negated upstream.
    pub fn detect(profile: &[Pt2i], reference: BumpRef, model: &BumpModel) -> Bump {
        let mut bump = Bump::rejected(BumpStatus::Ok, reference);
        if profile.is_empty() {
            bump.status = BumpStatus::EmptyScan;
            return bump;
        }
        if profile.len() < MIN_FIT_PTS {
            bump.status = BumpStatus::NotEnoughInputPts;
            return bump;
        }

        // positional holes across the template span
        let w_start = reference.start - model.position_shift_tolerance;
        let w_end = reference.end + model.position_shift_tolerance;
        for w in profile.windows(2) {
            if w[1].x() > w_start && w[0].x() < w_end && w[1].x() - w[0].x() > model.max_point_gap
            {
                bump.status = BumpStatus::HoleInInputPts;
                return bump;
            }
        }

        // a profile enclosed in a thin straight band carries no relief
        if let Some(bs) = BlurredSegment::fit(profile) {
            if bs.minimal_width() < EDist::int(model.min_height) {
                bump.status = BumpStatus::Linear;
                return bump;
            }
        }

        // baseline from the flank trends, or from the profile heights at the
        // template bounds
        let baseline = match bump.setup_baseline(profile, &reference, model) {
            Ok(b) => b,
            Err(status) => {
                bump.status = status;
                return bump;
            }
        };
        bump.baseline = Some(baseline);

        // peak above the baseline inside the search window
        let window: Vec<(usize, i32)> = profile
            .iter()
            .enumerate()
            .filter(|(_, p)| p.x() >= w_start && p.x() <= w_end)
            .map(|(i, p)| (i, (p.y() as f64 - baseline.at(p.x())).round() as i32))
            .collect();
        if window.is_empty() {
            bump.status = BumpStatus::NoBumpLine;
            return bump;
        }
        let (peak_pos_in_window, &(peak_idx, peak_rel)) = match window
            .iter()
            .enumerate()
            .max_by_key(|(_, (_, rel))| *rel)
        {
            Some((i, entry)) => (i, entry),
            None => {
                bump.status = BumpStatus::NoBumpLine;
                return bump;
            }
        };
        if peak_rel < model.min_height {
            bump.status = BumpStatus::TooLow;
            return bump;
        }

        // angular profiles: converging trends with no room for a bump
        if let (Some(st), Some(et)) = (&bump.start_trend, &bump.end_trend) {
            let den = st.slope() - et.slope();
            if den.abs() > 1e-9 {
                let ipos = (et.height_at(0) - st.height_at(0)) / den;
                if ipos > reference.start as f64
                    && ipos < reference.end as f64
                    && peak_rel < model.trend_min_pinch
                {
                    bump.status = BumpStatus::Angular;
                    return bump;
                }
            }
        }

        // sweep outward from the peak to the baseline crossings; the first
        // non-positive sample on each side is the crossing itself
        let mut si = peak_pos_in_window;
        while si > 0 && window[si - 1].1 > 0 {
            si -= 1;
        }
        if si > 0 {
            si -= 1;
        }
        let mut ei = peak_pos_in_window;
        while ei + 1 < window.len() && window[ei + 1].1 > 0 {
            ei += 1;
        }
        if ei + 1 < window.len() {
            ei += 1;
        }
        let start = profile[window[si].0].x();
        let end = profile[window[ei].0].x();
        if end - start < model.min_width {
            bump.status = BumpStatus::TooNarrow;
            return bump;
        }

        bump.start = start;
        bump.end = end;
        bump.estimated_width = end - start;
        bump.estimated_height = peak_rel;
        bump.estimated_summit = (profile[peak_idx].x(), profile[peak_idx].y());

        // mass center of the region above the baseline
        let mut mass = 0i64;
        let mut mpos = 0i64;
        let mut malt = 0i64;
        for &(i, rel) in &window[si..=ei] {
            if rel <= 0 {
                continue;
            }
            let p = profile[i];
            mass += rel as i64;
            mpos += rel as i64 * p.x() as i64;
            malt += rel as i64 * (baseline.at(p.x()) + rel as f64 / 2.0) as i64;
        }
        if mass > 0 {
            bump.estimated_mass_center = ((mpos / mass) as i32, (malt / mass) as i32);
        } else {
            bump.estimated_mass_center = bump.estimated_summit;
        }
        let center_pos = (start + end) / 2;
        let center_alt = (baseline.at(center_pos) + peak_rel as f64 / 2.0).round() as i32;
        bump.estimated_center = (center_pos, center_alt);

        bump.compute_areas(profile, &window[si..=ei]);
        bump.apply_controls(&reference, model);
        bump.status = BumpStatus::Ok;
        bump
    }

    fn setup_baseline(
        &mut self,
        profile: &[Pt2i],
        reference: &BumpRef,
        model: &BumpModel,
    ) -> Result<Baseline, BumpStatus> {
        let (first, last) = (profile[0].x(), profile[profile.len() - 1].x());
        if last < reference.start || first > reference.end {
            return Err(BumpStatus::NoBumpLine);
        }
        if model.detect_trend {
            let left: Vec<Pt2i> = profile
                .iter()
                .copied()
                .filter(|p| p.x() < reference.start)
                .collect();
            let right: Vec<Pt2i> = profile
                .iter()
                .copied()
                .filter(|p| p.x() > reference.end)
                .collect();
            self.start_trend = TrendFit::fit(&left);
            self.end_trend = TrendFit::fit(&right);
            if let (Some(st), Some(et)) = (&self.start_trend, &self.end_trend) {
                let y0 = st.height_at(reference.start);
                let y1 = et.height_at(reference.end);
                let span = (reference.end - reference.start) as f64;
                return Ok(Baseline {
                    x0: reference.start,
                    y0,
                    slope: (y1 - y0) / span.max(1.0),
                });
            }
        }
        // heights of the samples nearest to the template bounds
        let near = |target: i32| {
            profile
                .iter()
                .min_by_key(|p| (p.x() - target).abs())
                .map(|p| p.y())
        };
        let s_alt = near(reference.start).ok_or(BumpStatus::NoBumpLine)?;
        let e_alt = near(reference.end).ok_or(BumpStatus::NoBumpLine)?;
        let span = (reference.end - reference.start) as f64;
        Ok(Baseline {
            x0: reference.start,
            y0: s_alt as f64,
            slope: (e_alt - s_alt) as f64 / span.max(1.0),
        })
    }

    /// Integrates the region above the baseline and derives the area bounds
    /// from the trend band thickness.
    fn compute_areas(&mut self, profile: &[Pt2i], region: &[(usize, i32)]) {
        let mut area = 0i64;
        let mut spread = 0i64;
        for &(i, rel) in region {
            if rel <= 0 {
                continue;
            }
            let left = if i > 0 { profile[i].x() - profile[i - 1].x() } else { 0 };
            let right = if i + 1 < profile.len() {
                profile[i + 1].x() - profile[i].x()
            } else {
                0
            };
            let spacing = ((left + right).max(1) / 2) as i64;
            area += rel as i64 * spacing;
            spread += spacing;
        }
        let q = match (&self.start_trend, &self.end_trend) {
            (Some(st), Some(et)) => {
                let t1 = st.thickness();
                let t2 = et.thickness();
                let f1 = if t1.den() > 0 { t1.floor() } else { 0 };
                let f2 = if t2.den() > 0 { t2.floor() } else { 0 };
                ((f1 + f2) / 4) as i64
            }
            _ => 0,
        };
        self.area = area;
        self.area_lower = area - q * spread;
        self.area_upper = area + q * spread;
    }

    fn apply_controls(&mut self, reference: &BumpRef, model: &BumpModel) {
        self.accepted = true;
        let checks = [
            (
                model.position_control,
                DefaultFlags::POSITION,
                if model.mass_center_ref {
                    self.estimated_mass_center.0 - reference.center()
                } else {
                    self.estimated_center.0 - reference.center()
                },
                model.position_shift_tolerance,
                model.position_rel_shift_tolerance,
                reference.width,
            ),
            (
                model.altitude_control,
                DefaultFlags::ALTITUDE,
                self.estimated_summit.1 - reference.altitude,
                model.altitude_shift_tolerance,
                model.altitude_rel_shift_tolerance,
                reference.height,
            ),
            (
                model.width_control,
                DefaultFlags::WIDTH,
                self.estimated_width - reference.width,
                model.width_shift_tolerance,
                model.width_rel_shift_tolerance,
                reference.width,
            ),
            (
                model.height_control,
                DefaultFlags::HEIGHT,
                self.estimated_height - reference.height,
                model.height_shift_tolerance,
                model.height_rel_shift_tolerance,
                reference.height,
            ),
        ];
        for (control, flag, delta, tol_abs, tol_rel, ref_value) in checks {
            if control == ControlLevel::Off || ref_value <= 0 {
                continue;
            }
            let allowed = tol_abs as i64 + tol_rel as i64 * ref_value as i64 / 100;
            if (delta as i64).abs() > allowed {
                self.defaults.set(flag);
                if control == ControlLevel::Strict {
                    self.accepted = false;
                }
            }
        }
    }

    fn rejected(status: BumpStatus, reference: BumpRef) -> Bump {
        Bump {
            status,
            accepted: false,
            defaults: DefaultFlags::default(),
            reference,
            start: 0,
            end: 0,
            estimated_center: (reference.center(), reference.altitude),
            estimated_mass_center: (reference.center(), reference.altitude),
            estimated_summit: (reference.center(), reference.altitude),
            estimated_width: 0,
            estimated_height: 0,
            start_trend: None,
            end_trend: None,
            baseline: None,
            area: 0,
            area_lower: 0,
            area_upper: 0,
            measure_translation: 0.0,
            measure_rotation: 0.0,
        }
    }

    /// Returns the fit status.
    #[inline]
    pub fn status(&self) -> BumpStatus {
        self.status
    }

    /// Returns whether the bump was found (`Ok` status).
    #[inline]
    pub fn is_found(&self) -> bool {
        self.status == BumpStatus::Ok
    }

    /// Returns whether the bump is accepted: found, and no strict template
    /// control was violated (tail pruning may withdraw it later).
    #[inline]
    pub fn is_accepted(&self) -> bool {
        self.status == BumpStatus::Ok && self.accepted
    }

    /// Withdraws the acceptance of this bump.
    pub(crate) fn reject(&mut self) {
        self.accepted = false;
    }

    /// Returns the soft-failed control flags.
    #[inline]
    pub fn defaults(&self) -> DefaultFlags {
        self.defaults
    }

    /// Returns the reference template the fit was run against.
    #[inline]
    pub fn reference(&self) -> BumpRef {
        self.reference
    }

    /// Returns the baseline crossing start position.
    #[inline]
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Returns the baseline crossing end position.
    #[inline]
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Returns the estimated geometric center (position, altitude).
    #[inline]
    pub fn estimated_center(&self) -> (i32, i32) {
        self.estimated_center
    }

    /// Returns the estimated mass center (position, altitude).
    #[inline]
    pub fn estimated_mass_center(&self) -> (i32, i32) {
        self.estimated_mass_center
    }

    /// Returns the estimated summit (position, altitude).
    #[inline]
    pub fn estimated_summit(&self) -> (i32, i32) {
        self.estimated_summit
    }

    /// Returns the estimated width.
    #[inline]
    pub fn estimated_width(&self) -> i32 {
        self.estimated_width
    }

    /// Returns the estimated height above the baseline.
    #[inline]
    pub fn estimated_height(&self) -> i32 {
        self.estimated_height
    }

    /// Returns the start flank trend, if fitted.
    #[inline]
    pub fn start_trend(&self) -> Option<&TrendFit> {
        self.start_trend.as_ref()
    }

    /// Returns the end flank trend, if fitted.
    #[inline]
    pub fn end_trend(&self) -> Option<&TrendFit> {
        self.end_trend.as_ref()
    }

    /// Returns the estimated area between profile and baseline (mm^2).
    #[inline]
    pub fn estimated_area(&self) -> i64 {
        self.area
    }

    /// Returns the lower bound of the estimated area.
    #[inline]
    pub fn estimated_area_lower_bound(&self) -> i64 {
        self.area_lower
    }

    /// Returns the upper bound of the estimated area.
    #[inline]
    pub fn estimated_area_upper_bound(&self) -> i64 {
        self.area_upper
    }

    /// Returns the measure line translation ratio.
    #[inline]
    pub fn measure_line_translation_ratio(&self) -> f32 {
        self.measure_translation
    }

    /// Returns the measure line rotation ratio.
    #[inline]
    pub fn measure_line_rotation_ratio(&self) -> f32 {
        self.measure_rotation
    }

    /// Moves the measure line and recomputes the measured area on the given
    /// profile.
    ///
    /// The measure line is the baseline translated by
    /// `translation * height` and tilted by `rotation * height` across the
    /// bump span; operators adjust it to bound the earthwork volume.
    pub fn set_measure_line(&mut self, translation: f32, rotation: f32, profile: &[Pt2i]) {
        self.measure_translation = translation;
        self.measure_rotation = rotation;
        let base = match self.baseline {
            Some(b) => b,
            None => return,
        };
        let h = self.estimated_height as f64;
        let span = (self.end - self.start).max(1) as f64;
        let shifted = Baseline {
            x0: base.x0,
            y0: base.y0 + translation as f64 * h,
            slope: base.slope + rotation as f64 * h / span,
        };
        let mut area = 0i64;
        for (i, p) in profile.iter().enumerate() {
            if p.x() < self.start || p.x() > self.end {
                continue;
            }
            let rel = (p.y() as f64 - shifted.at(p.x())).round() as i64;
            if rel <= 0 {
                continue;
            }
            let left = if i > 0 { p.x() - profile[i - 1].x() } else { 0 };
            let right = if i + 1 < profile.len() { profile[i + 1].x() - p.x() } else { 0 };
            area += rel * ((left + right).max(1) / 2) as i64;
        }
        self.area = area;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> BumpModel {
        BumpModel {
            min_width: 3,
            min_height: 2,
            max_point_gap: 2,
            position_shift_tolerance: 3,
            ..BumpModel::default()
        }
    }

    fn profile(heights: &[i32]) -> Vec<Pt2i> {
        heights
            .iter()
            .enumerate()
            .map(|(i, h)| Pt2i::new(i as i32, *h))
            .collect()
    }

    #[test]
    fn test_bump_seed_scenario() {
        // profile 0,0,1,3,5,3,1,0,0 with template center 4, width 5, height 5
        let p = profile(&[0, 0, 1, 3, 5, 3, 1, 0, 0]);
        let reference = BumpRef { start: 2, end: 6, altitude: 5, width: 5, height: 5 };
        let bump = Bump::detect(&p, reference, &model());
        assert_eq!(bump.status(), BumpStatus::Ok);
        assert!(bump.is_accepted());
        assert_eq!(bump.estimated_summit(), (4, 5));
        assert_eq!(bump.estimated_center().0, 4);
        assert!((bump.estimated_height() - 5).abs() <= 1);
        assert!((bump.estimated_width() - 5).abs() <= 1);
    }

    #[test]
    fn test_empty_and_sparse_scans() {
        let reference = BumpRef { start: 0, end: 4, altitude: 0, width: 4, height: 3 };
        let bump = Bump::detect(&[], reference, &model());
        assert_eq!(bump.status(), BumpStatus::EmptyScan);
        let bump = Bump::detect(&profile(&[1, 2]), reference, &model());
        assert_eq!(bump.status(), BumpStatus::NotEnoughInputPts);
    }

    #[test]
    fn test_hole_in_input() {
        let pts = vec![
            Pt2i::new(0, 0),
            Pt2i::new(1, 3),
            Pt2i::new(8, 3),
            Pt2i::new(9, 0),
        ];
        let reference = BumpRef { start: 1, end: 8, altitude: 3, width: 7, height: 3 };
        let bump = Bump::detect(&pts, reference, &model());
        assert_eq!(bump.status(), BumpStatus::HoleInInputPts);
    }

    #[test]
    fn test_flat_profile_is_linear() {
        let p = profile(&[4, 4, 4, 4, 4, 4, 4, 4]);
        let reference = BumpRef { start: 2, end: 5, altitude: 4, width: 3, height: 3 };
        let bump = Bump::detect(&p, reference, &model());
        assert_eq!(bump.status(), BumpStatus::Linear);
    }

    #[test]
    fn test_too_low_relief() {
        let p = profile(&[0, 0, 1, 2, 3, 2, 1, 0, 0]);
        let mut m = model();
        m.min_height = 5;
        let reference = BumpRef { start: 2, end: 6, altitude: 3, width: 4, height: 5 };
        let bump = Bump::detect(&p, reference, &m);
        // the whole profile is thicker than a line but the peak stays low
        assert!(bump.status() == BumpStatus::TooLow || bump.status() == BumpStatus::Linear);
    }

    #[test]
    fn test_hollow_on_inverted_heights() {
        // a ditch profile, negated by the caller as for hollow detection
        let ditch = [0, 0, -1, -3, -5, -3, -1, 0, 0];
        let p: Vec<Pt2i> = ditch
            .iter()
            .enumerate()
            .map(|(i, h)| Pt2i::new(i as i32, -*h))
            .collect();
        let reference = BumpRef { start: 2, end: 6, altitude: 5, width: 5, height: 5 };
        let bump = Bump::detect(&p, reference, &model());
        assert_eq!(bump.status(), BumpStatus::Ok);
        assert_eq!(bump.estimated_summit(), (4, 5));
    }

    #[test]
    fn test_strict_control_withdraws_acceptance() {
        let p = profile(&[0, 0, 1, 3, 5, 3, 1, 0, 0]);
        let mut m = model();
        m.height_control = ControlLevel::Strict;
        m.height_shift_tolerance = 1;
        m.height_rel_shift_tolerance = 0;
        // template expects a much taller bump
        let reference = BumpRef { start: 2, end: 6, altitude: 12, width: 5, height: 12 };
        let bump = Bump::detect(&p, reference, &m);
        assert_eq!(bump.status(), BumpStatus::Ok);
        assert!(bump.defaults().contains(DefaultFlags::HEIGHT));
        assert!(!bump.is_accepted());
    }

    #[test]
    fn test_measure_line_translation_reduces_area() {
        let p = profile(&[0, 0, 1, 3, 5, 3, 1, 0, 0]);
        let reference = BumpRef { start: 2, end: 6, altitude: 5, width: 5, height: 5 };
        let mut bump = Bump::detect(&p, reference, &model());
        let area0 = bump.estimated_area();
        assert!(area0 > 0);
        bump.set_measure_line(0.5, 0.0, &p);
        assert!(bump.estimated_area() < area0);
    }
}
