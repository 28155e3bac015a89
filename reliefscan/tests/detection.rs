//! End-to-end detection on synthetic tile sets.

use std::path::Path;

use reliefscan::cloud::{CloudAccess, Pt3i, PtTile, PIXEL_MM};
use reliefscan::detect::{CTrackDetector, RidgeDetector, StructureKind};
use reliefscan::{DetectionStatus, Pt2i, TileSet};
use tempfile::TempDir;

/// Ground height of the synthetic terrains, in millimeters.
const GROUND: i32 = 50_000;

/// Builds a 20 m x 20 m TOP tile whose height field is given by `height`,
/// sampled every 250 mm.
fn build_tile(dir: &Path, height: impl Fn(i32, i32) -> i32) -> TileSet {
    std::fs::create_dir_all(dir.join("top")).unwrap();
    let mut tile = PtTile::new(40, 40);
    tile.set_area(0, 0, 0, PIXEL_MM);
    let mut pts = Vec::new();
    let mut c = 125;
    while c < 20_000 {
        let mut r = 125;
        while r < 20_000 {
            pts.push(Pt3i::new(c, r, height(c, r)));
            r += 250;
        }
        c += 250;
    }
    tile.fill(pts);
    tile.save(&CloudAccess::Top.tile_path(dir, "t")).unwrap();
    let mut set = TileSet::new(dir, CloudAccess::Top);
    set.add_tile("t").unwrap();
    set
}

/// A ridge of height 1500 mm and half-width 1500 mm along x = 10 m.
fn ridge_height(x: i32, _y: i32) -> i32 {
    GROUND + (1500 - (x - 10_000).abs()).max(0)
}

/// A ditch mirroring the ridge.
fn hollow_height(x: i32, _y: i32) -> i32 {
    GROUND - (1500 - (x - 10_000).abs()).max(0)
}

/// A sunken flat track bed 3 m wide around x = 10 m, with gentle banks.
fn track_height(x: i32, _y: i32) -> i32 {
    let d = (x - 10_000).abs();
    if d <= 1500 {
        GROUND
    } else {
        GROUND + ((d - 1500) / 2).min(1200)
    }
}

#[test]
fn test_ridge_detection_runs_both_sides() {
    let dir = TempDir::new().unwrap();
    let tiles = build_tile(dir.path(), ridge_height);
    let mut detector = RidgeDetector::new(&tiles);
    let status = detector.detect(Pt2i::new(6, 20), Pt2i::new(34, 20));
    assert_eq!(status, DetectionStatus::Ok);

    let ridge = detector.ridge().expect("structure available");
    assert!(ridge.accepted_count() > 20, "ridge spans most of the tile");
    let nums = ridge.accepted_scans();
    assert!(nums.iter().any(|n| *n > 0), "left side propagated");
    assert!(nums.iter().any(|n| *n < 0), "right side propagated");

    // per-scan estimates sit on the synthetic ridge
    let central = ridge.bump(0).expect("central bump");
    assert!(central.is_accepted());
    assert!((central.estimated_height() - 1500).abs() < 400);
    assert!((central.estimated_width() - 3000).abs() < 800);

    // measurements
    assert!(ridge.length() > 8_000.0, "length {}", ridge.length());
    assert!(ridge.volume() > 0.0);
    assert!(!ridge.centerline().is_empty());
}

#[test]
fn test_hollow_detection_on_negated_relief() {
    let dir = TempDir::new().unwrap();
    let tiles = build_tile(dir.path(), hollow_height);
    let mut detector = RidgeDetector::new(&tiles);
    detector.set_kind(StructureKind::Hollow);
    let status = detector.detect(Pt2i::new(6, 20), Pt2i::new(34, 20));
    assert_eq!(status, DetectionStatus::Ok);
    let ridge = detector.ridge().expect("structure available");
    assert!(ridge.is_hollow());
    let central = ridge.bump(0).expect("central bump");
    assert!((central.estimated_height() - 1500).abs() < 400);
}

#[test]
fn test_ctrack_detection_finds_the_bed() {
    let dir = TempDir::new().unwrap();
    let tiles = build_tile(dir.path(), track_height);
    let mut detector = CTrackDetector::new(&tiles);
    let status = detector.detect(Pt2i::new(6, 20), Pt2i::new(34, 20));
    assert_eq!(status, DetectionStatus::Ok);
    let track = detector.track().expect("structure available");
    assert!(track.accepted_count() > 20);
    let central = track.plateau(0).expect("central plateau");
    assert!(central.is_accepted());
    // the detected bed is the 3 m flat band
    assert!((central.estimated_width() - 3000).abs() < 1000);
}

#[test]
fn test_detection_is_pure() {
    let dir = TempDir::new().unwrap();
    let tiles = build_tile(dir.path(), ridge_height);
    let mut detector = RidgeDetector::new(&tiles);
    let s1 = detector.detect(Pt2i::new(6, 20), Pt2i::new(34, 20));
    let scans1 = detector.ridge().unwrap().accepted_scans();
    let line1 = detector.ridge().unwrap().centerline();
    let s2 = detector.detect(Pt2i::new(6, 20), Pt2i::new(34, 20));
    let scans2 = detector.ridge().unwrap().accepted_scans();
    let line2 = detector.ridge().unwrap().centerline();
    assert_eq!(s1, s2);
    assert_eq!(scans1, scans2);
    assert_eq!(line1, line2);
}

#[test]
fn test_stroke_inversion_negates_scan_indices() {
    let dir = TempDir::new().unwrap();
    let tiles = build_tile(dir.path(), ridge_height);

    let mut detector = RidgeDetector::new(&tiles);
    assert_eq!(
        detector.detect(Pt2i::new(6, 20), Pt2i::new(34, 20)),
        DetectionStatus::Ok
    );
    let forward: Vec<i32> = detector.ridge().unwrap().accepted_scans();
    let forward_line = detector.ridge().unwrap().centerline();

    assert_eq!(
        detector.detect(Pt2i::new(34, 20), Pt2i::new(6, 20)),
        DetectionStatus::Ok
    );
    let backward: Vec<i32> = detector.ridge().unwrap().accepted_scans();
    let backward_line = detector.ridge().unwrap().centerline();

    let mut negated: Vec<i32> = backward.iter().map(|n| -n).collect();
    negated.sort_unstable();
    assert_eq!(forward, negated, "scan indices must negate under inversion");

    // same structure cells on the map
    let mut fl = forward_line.clone();
    let mut bl = backward_line.clone();
    fl.sort_by_key(|p| (p.y(), p.x()));
    bl.sort_by_key(|p| (p.y(), p.x()));
    assert_eq!(fl, bl);
}

#[test]
fn test_missing_tile_aborts_detection() {
    let dir = TempDir::new().unwrap();
    let tiles = build_tile(dir.path(), ridge_height);
    // remove the tile data from disk after registration
    std::fs::remove_file(CloudAccess::Top.tile_path(dir.path(), "t")).unwrap();
    let mut fresh = TileSet::new(dir.path(), CloudAccess::Top);
    // header was never read, so registration itself fails
    assert!(fresh.add_tile("t").is_err());

    let mut detector = RidgeDetector::new(&tiles);
    // the already-registered set now hits the missing file lazily
    let status = detector.detect(Pt2i::new(6, 20), Pt2i::new(34, 20));
    assert_eq!(status, DetectionStatus::FailNoAvailableScan);
}

#[test]
fn test_short_stroke_rejected() {
    let dir = TempDir::new().unwrap();
    let tiles = build_tile(dir.path(), ridge_height);
    let mut detector = RidgeDetector::new(&tiles);
    assert_eq!(
        detector.detect(Pt2i::new(10, 10), Pt2i::new(10, 10)),
        DetectionStatus::None
    );
    assert_eq!(
        detector.detect(Pt2i::new(10, 10), Pt2i::new(12, 10)),
        DetectionStatus::FailTooNarrowInput
    );
}
