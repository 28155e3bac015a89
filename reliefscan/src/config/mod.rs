//! Detection configuration file.
//!
//! Text key=value settings grouped in `[sections]`, with `;` or `#`
//! comments. The `[ASD]` section selects the cloud access mode and the
//! detection mode; `[Ridge]` and `[CTrack]` carry the detector tunings in
//! meters; `[Stroke]` records the last stroke for replay. Unknown keys are
//! ignored and missing keys keep their defaults, so files round-trip across
//! versions.

use std::path::Path;

use ini::Ini;
use thiserror::Error;

use crate::cloud::CloudAccess;
use crate::detect::{CTrackDetector, RidgeDetector, StructureKind};
use crate::geom::Pt2i;
use crate::profile::{BumpModel, ControlLevel, PlateauModel};

/// Errors of configuration loading and saving.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure.
    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed INI content.
    #[error("configuration parse error: {0}")]
    Parse(String),
}

/// What the detector is looking for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetectionMode {
    /// No detection configured.
    #[default]
    None,
    /// Carriage tracks.
    CTrack,
    /// Ridges.
    Ridge,
    /// Hollows.
    Hollow,
}

impl DetectionMode {
    /// Parses the integer encoding of the configuration file.
    pub fn from_code(code: i64) -> DetectionMode {
        match code {
            1 => DetectionMode::CTrack,
            2 => DetectionMode::Ridge,
            4 => DetectionMode::Hollow,
            _ => DetectionMode::None,
        }
    }

    /// Returns the integer encoding of the configuration file.
    pub fn code(self) -> i64 {
        match self {
            DetectionMode::None => 0,
            DetectionMode::CTrack => 1,
            DetectionMode::Ridge => 2,
            DetectionMode::Hollow => 4,
        }
    }
}

/// Recorded stroke, in DTM pixel coordinates plus the tile georeference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrokeConfig {
    /// Tile X reference (100 m units).
    pub tile_x: i64,
    /// Tile Y reference (100 m units).
    pub tile_y: i64,
    /// X remainder of the reference (mm).
    pub balance_x: i64,
    /// Y remainder of the reference (mm).
    pub balance_y: i64,
    /// Stroke start point.
    pub p1: Pt2i,
    /// Stroke end point.
    pub p2: Pt2i,
}

/// Ridge / hollow detector settings.
#[derive(Clone, Debug)]
pub struct RidgeSettings {
    /// Single-scan bump fit parameters.
    pub model: BumpModel,
    /// Miss-run length terminating a side.
    pub lack_tolerance: u32,
}

impl RidgeSettings {
    fn new() -> Self {
        RidgeSettings { model: BumpModel::default(), lack_tolerance: 5 }
    }
}

/// Carriage track detector settings.
#[derive(Clone, Debug)]
pub struct CTrackSettings {
    /// Single-scan plateau fit parameters.
    pub model: PlateauModel,
    /// Miss-run length terminating a side.
    pub lack_tolerance: u32,
    /// Automatic central template search.
    pub initialization: bool,
    /// Empty scans count as misses.
    pub density_check: bool,
    /// Center stability pruning.
    pub shift_length_pruning: bool,
    /// Maximal center shift between accepted scans (mm).
    pub max_shift_length: i32,
    /// Density pruning.
    pub density_pruning: bool,
    /// Minimal accepted/scanned ratio (percent).
    pub min_density: i32,
    /// Tail pruning.
    pub tail_pruning: bool,
}

/// The full detection configuration.
#[derive(Clone, Debug)]
pub struct DetectionConfig {
    /// Tile access mode.
    pub cloud_access: CloudAccess,
    /// Detection mode.
    pub mode: DetectionMode,
    /// Ridge / hollow settings.
    pub ridge: RidgeSettings,
    /// Carriage track settings.
    pub ctrack: CTrackSettings,
    /// Last recorded stroke, if any.
    pub stroke: Option<StrokeConfig>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            cloud_access: CloudAccess::Top,
            mode: DetectionMode::None,
            ridge: RidgeSettings::new(),
            ctrack: CTrackSettings {
                model: PlateauModel::default(),
                lack_tolerance: 5,
                initialization: true,
                density_check: true,
                shift_length_pruning: true,
                max_shift_length: 800,
                density_pruning: true,
                min_density: 30,
                tail_pruning: true,
            },
            stroke: None,
        }
    }
}

fn get_i64(ini: &Ini, section: &str, key: &str, default: i64) -> i64 {
    ini.get_from(Some(section), key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn get_bool(ini: &Ini, section: &str, key: &str, default: bool) -> bool {
    match ini.get_from(Some(section), key).map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "1" || v == "true" || v == "yes" => true,
        Some(v) if v == "0" || v == "false" || v == "no" => false,
        _ => default,
    }
}

/// Reads a length in meters and converts it to millimeters.
fn get_mm(ini: &Ini, section: &str, key: &str, default_mm: i32) -> i32 {
    ini.get_from(Some(section), key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|m| (m * 1000.0).round() as i32)
        .unwrap_or(default_mm)
}

fn put_m(ini: &mut Ini, section: &str, key: &str, mm: i32) {
    ini.with_section(Some(section)).set(key, format!("{}", mm as f64 / 1000.0));
}

impl DetectionConfig {
    /// Loads a configuration file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<DetectionConfig, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut cfg = DetectionConfig::default();

        cfg.cloud_access = CloudAccess::from_subdivision(get_i64(&ini, "ASD", "CloudAccess", 1) as i32)
            .unwrap_or(CloudAccess::Top);
        cfg.mode = DetectionMode::from_code(get_i64(&ini, "ASD", "DetectionMode", 0));

        // [Ridge]
        {
            let m = &mut cfg.ridge.model;
            cfg.ridge.lack_tolerance =
                get_i64(&ini, "Ridge", "BumpLackTolerance", cfg.ridge.lack_tolerance as i64) as u32;
            m.min_width = get_mm(&ini, "Ridge", "BumpMinWidth", m.min_width);
            m.min_height = get_mm(&ini, "Ridge", "BumpMinHeight", m.min_height);
            m.mass_center_ref = get_bool(&ini, "Ridge", "MassCenterRef", m.mass_center_ref);
            m.position_control = ControlLevel::from_code(get_i64(
                &ini,
                "Ridge",
                "PositionControl",
                m.position_control.code(),
            ));
            m.position_shift_tolerance =
                get_mm(&ini, "Ridge", "MaxPositionShift", m.position_shift_tolerance);
            m.position_rel_shift_tolerance = get_percent(
                &ini,
                "Ridge",
                "MaxPositionRelShift",
                m.position_rel_shift_tolerance,
            );
            m.altitude_control = ControlLevel::from_code(get_i64(
                &ini,
                "Ridge",
                "AltitudeControl",
                m.altitude_control.code(),
            ));
            m.altitude_shift_tolerance =
                get_mm(&ini, "Ridge", "MaxAltitudeShift", m.altitude_shift_tolerance);
            m.altitude_rel_shift_tolerance = get_percent(
                &ini,
                "Ridge",
                "MaxAltitudeRelShift",
                m.altitude_rel_shift_tolerance,
            );
            m.width_control = ControlLevel::from_code(get_i64(
                &ini,
                "Ridge",
                "WidthControl",
                m.width_control.code(),
            ));
            m.width_shift_tolerance = get_mm(&ini, "Ridge", "MaxWidthShift", m.width_shift_tolerance);
            m.width_rel_shift_tolerance =
                get_percent(&ini, "Ridge", "MaxWidthRelShift", m.width_rel_shift_tolerance);
            m.height_control = ControlLevel::from_code(get_i64(
                &ini,
                "Ridge",
                "HeightControl",
                m.height_control.code(),
            ));
            m.height_shift_tolerance =
                get_mm(&ini, "Ridge", "MaxHeightShift", m.height_shift_tolerance);
            m.height_rel_shift_tolerance =
                get_percent(&ini, "Ridge", "MaxHeightRelShift", m.height_rel_shift_tolerance);
            m.detect_trend = get_bool(&ini, "Ridge", "WithTrend", m.detect_trend);
            m.trend_min_pinch =
                get_i64(&ini, "Ridge", "TrendMinPinch", m.trend_min_pinch as i64) as i32;
        }

        // [CTrack]
        {
            let s = &mut cfg.ctrack;
            s.initialization = get_bool(&ini, "CTrack", "InitialDetection", s.initialization);
            s.density_check = get_bool(&ini, "CTrack", "DensityCheck", s.density_check);
            s.model.deviation_prediction =
                get_bool(&ini, "CTrack", "DirectionAware", s.model.deviation_prediction);
            s.model.slope_prediction =
                get_bool(&ini, "CTrack", "SlopeAware", s.model.slope_prediction);
            s.lack_tolerance =
                get_i64(&ini, "CTrack", "PlateauLackTolerance", s.lack_tolerance as i64) as u32;
            s.model.bs_max_tilt =
                get_i64(&ini, "CTrack", "PlateauMaxTilt", s.model.bs_max_tilt as i64) as i32;
            s.model.min_length = get_mm(&ini, "CTrack", "PlateauMinLength", s.model.min_length);
            s.model.max_length = get_mm(&ini, "CTrack", "PlateauMaxLength", s.model.max_length);
            s.model.thickness_tolerance =
                get_mm(&ini, "CTrack", "MaxThicknessShift", s.model.thickness_tolerance);
            s.model.slope_tolerance =
                get_mm(&ini, "CTrack", "MaxSlopeShift", s.model.slope_tolerance);
            s.model.side_shift_tolerance =
                get_mm(&ini, "CTrack", "MaxPositionShift", s.model.side_shift_tolerance);
            s.shift_length_pruning =
                get_bool(&ini, "CTrack", "CenterStabilityTest", s.shift_length_pruning);
            s.max_shift_length = get_mm(&ini, "CTrack", "MaxCenterShift", s.max_shift_length);
            s.density_pruning = get_bool(&ini, "CTrack", "DetectionRatioTest", s.density_pruning);
            s.min_density =
                get_i64(&ini, "CTrack", "MaxUndetectedRatio", s.min_density as i64) as i32;
            s.tail_pruning = get_bool(&ini, "CTrack", "TailCompactnessTest", s.tail_pruning);
            s.model.tail_min_size =
                get_i64(&ini, "CTrack", "MinTailLength", s.model.tail_min_size as i64) as usize;
        }

        // [Stroke]
        if ini.get_from(Some("Stroke"), "StartPointX").is_some() {
            cfg.stroke = Some(StrokeConfig {
                tile_x: get_i64(&ini, "Stroke", "TileX", 0),
                tile_y: get_i64(&ini, "Stroke", "TileY", 0),
                balance_x: get_i64(&ini, "Stroke", "BalanceX", 0),
                balance_y: get_i64(&ini, "Stroke", "BalanceY", 0),
                p1: Pt2i::new(
                    get_i64(&ini, "Stroke", "StartPointX", 0) as i32,
                    get_i64(&ini, "Stroke", "StartPointY", 0) as i32,
                ),
                p2: Pt2i::new(
                    get_i64(&ini, "Stroke", "EndPointX", 0) as i32,
                    get_i64(&ini, "Stroke", "EndPointY", 0) as i32,
                ),
            });
        }

        Ok(cfg)
    }

    /// Saves the configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut ini = Ini::new();
        ini.with_section(Some("ASD"))
            .set("CloudAccess", self.cloud_access.subdivision().to_string())
            .set("DetectionMode", self.mode.code().to_string());

        let m = &self.ridge.model;
        ini.with_section(Some("Ridge"))
            .set("BumpLackTolerance", self.ridge.lack_tolerance.to_string())
            .set("MassCenterRef", bool_str(m.mass_center_ref))
            .set("PositionControl", m.position_control.code().to_string())
            .set("MaxPositionRelShift", ratio_str(m.position_rel_shift_tolerance))
            .set("AltitudeControl", m.altitude_control.code().to_string())
            .set("MaxAltitudeRelShift", ratio_str(m.altitude_rel_shift_tolerance))
            .set("WidthControl", m.width_control.code().to_string())
            .set("MaxWidthRelShift", ratio_str(m.width_rel_shift_tolerance))
            .set("HeightControl", m.height_control.code().to_string())
            .set("MaxHeightRelShift", ratio_str(m.height_rel_shift_tolerance))
            .set("WithTrend", bool_str(m.detect_trend))
            .set("TrendMinPinch", m.trend_min_pinch.to_string());
        put_m(&mut ini, "Ridge", "BumpMinWidth", m.min_width);
        put_m(&mut ini, "Ridge", "BumpMinHeight", m.min_height);
        put_m(&mut ini, "Ridge", "MaxPositionShift", m.position_shift_tolerance);
        put_m(&mut ini, "Ridge", "MaxAltitudeShift", m.altitude_shift_tolerance);
        put_m(&mut ini, "Ridge", "MaxWidthShift", m.width_shift_tolerance);
        put_m(&mut ini, "Ridge", "MaxHeightShift", m.height_shift_tolerance);

        let s = &self.ctrack;
        ini.with_section(Some("CTrack"))
            .set("InitialDetection", bool_str(s.initialization))
            .set("DensityCheck", bool_str(s.density_check))
            .set("DirectionAware", bool_str(s.model.deviation_prediction))
            .set("SlopeAware", bool_str(s.model.slope_prediction))
            .set("PlateauLackTolerance", s.lack_tolerance.to_string())
            .set("PlateauMaxTilt", s.model.bs_max_tilt.to_string())
            .set("CenterStabilityTest", bool_str(s.shift_length_pruning))
            .set("DetectionRatioTest", bool_str(s.density_pruning))
            .set("MaxUndetectedRatio", s.min_density.to_string())
            .set("TailCompactnessTest", bool_str(s.tail_pruning))
            .set("MinTailLength", s.model.tail_min_size.to_string());
        put_m(&mut ini, "CTrack", "PlateauMinLength", s.model.min_length);
        put_m(&mut ini, "CTrack", "PlateauMaxLength", s.model.max_length);
        put_m(&mut ini, "CTrack", "MaxThicknessShift", s.model.thickness_tolerance);
        put_m(&mut ini, "CTrack", "MaxSlopeShift", s.model.slope_tolerance);
        put_m(&mut ini, "CTrack", "MaxPositionShift", s.model.side_shift_tolerance);
        put_m(&mut ini, "CTrack", "MaxCenterShift", s.max_shift_length);

        if let Some(stroke) = &self.stroke {
            ini.with_section(Some("Stroke"))
                .set("TileX", stroke.tile_x.to_string())
                .set("TileY", stroke.tile_y.to_string())
                .set("BalanceX", stroke.balance_x.to_string())
                .set("BalanceY", stroke.balance_y.to_string())
                .set("StartPointX", stroke.p1.x().to_string())
                .set("StartPointY", stroke.p1.y().to_string())
                .set("EndPointX", stroke.p2.x().to_string())
                .set("EndPointY", stroke.p2.y().to_string());
        }

        ini.write_to_file(path)?;
        Ok(())
    }

    /// Applies the carriage track settings to a detector.
    pub fn configure_ctrack(&self, det: &mut CTrackDetector<'_>) {
        *det.model_mut() = self.ctrack.model.clone();
        det.set_lack_tolerance(self.ctrack.lack_tolerance);
        det.set_initialization(self.ctrack.initialization);
        det.set_density_sensitive(self.ctrack.density_check);
        det.set_shift_length_pruning(self.ctrack.shift_length_pruning);
        det.set_max_shift_length(self.ctrack.max_shift_length);
        det.set_density_pruning(self.ctrack.density_pruning);
        det.set_min_density(self.ctrack.min_density);
        det.set_tail_pruning(self.ctrack.tail_pruning);
    }

    /// Applies the ridge settings to a detector.
    pub fn configure_ridge(&self, det: &mut RidgeDetector<'_>) {
        *det.model_mut() = self.ridge.model.clone();
        det.set_lack_tolerance(self.ridge.lack_tolerance);
        det.set_kind(if self.mode == DetectionMode::Hollow {
            StructureKind::Hollow
        } else {
            StructureKind::Ridge
        });
    }
}

/// Reads a ratio value and converts it to percent.
fn get_percent(ini: &Ini, section: &str, key: &str, default_percent: i32) -> i32 {
    ini.get_from(Some(section), key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|r| (r * 100.0).round() as i32)
        .unwrap_or(default_percent)
}

fn ratio_str(percent: i32) -> String {
    format!("{}", percent as f64 / 100.0)
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("detect.ini");
        let mut cfg = DetectionConfig::default();
        cfg.mode = DetectionMode::Hollow;
        cfg.cloud_access = CloudAccess::Mid;
        cfg.ridge.model.min_height = 350;
        cfg.ctrack.model.min_length = 1200;
        cfg.stroke = Some(StrokeConfig {
            tile_x: 9,
            tile_y: 12,
            balance_x: 0,
            balance_y: 0,
            p1: Pt2i::new(100, 200),
            p2: Pt2i::new(130, 180),
        });
        cfg.save(&path).unwrap();

        let back = DetectionConfig::load(&path).unwrap();
        assert_eq!(back.mode, DetectionMode::Hollow);
        assert_eq!(back.cloud_access, CloudAccess::Mid);
        assert_eq!(back.ridge.model.min_height, 350);
        assert_eq!(back.ctrack.model.min_length, 1200);
        assert_eq!(back.stroke, cfg.stroke);
    }

    #[test]
    fn test_comments_and_unknown_keys_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("detect.ini");
        std::fs::write(
            &path,
            "; leading comment\n[ASD]\nCloudAccess = 10\n# other comment\nUnknownKey = 3\nDetectionMode = 1\n",
        )
        .unwrap();
        let cfg = DetectionConfig::load(&path).unwrap();
        assert_eq!(cfg.cloud_access, CloudAccess::Eco);
        assert_eq!(cfg.mode, DetectionMode::CTrack);
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("detect.ini");
        std::fs::write(&path, "[CTrack]\nPlateauLackTolerance = 9\n").unwrap();
        let cfg = DetectionConfig::load(&path).unwrap();
        assert_eq!(cfg.ctrack.lack_tolerance, 9);
        let defaults = DetectionConfig::default();
        assert_eq!(cfg.ctrack.model.min_length, defaults.ctrack.model.min_length);
    }
}
