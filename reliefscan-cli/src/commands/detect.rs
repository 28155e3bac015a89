//! Detect command - run one detection from a stroke.

use std::path::PathBuf;

use clap::Args;
use reliefscan::config::{DetectionConfig, DetectionMode};
use reliefscan::detect::{CTrackDetector, RidgeDetector, StructureKind};
use reliefscan::export::{write_shapefile, DetectionSummary, ShapeKind};
use reliefscan::{Pt2i, TileSet};

use crate::commands::tiles::discover_tile_names;
use crate::error::CliError;

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Configuration file (INI)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Tile base directory (holding top/, mid/, eco/)
    #[arg(long)]
    pub tiles: PathBuf,

    /// Detection mode, overriding the configuration
    #[arg(long, value_parser = ["ctrack", "ridge", "hollow"])]
    pub mode: Option<String>,

    /// Stroke pixels: x1 y1 x2 y2, overriding the configuration
    #[arg(long, num_args = 4, value_names = ["X1", "Y1", "X2", "Y2"])]
    pub stroke: Option<Vec<i32>>,

    /// Export the detected centerline to this shapefile
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Export the structure bounds as a closed polygon instead
    #[arg(long)]
    pub bounds: bool,

    /// Print the detection summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the detect command.
pub fn run(args: DetectArgs) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => DetectionConfig::load(path)?,
        None => DetectionConfig::default(),
    };
    if let Some(mode) = &args.mode {
        config.mode = match mode.as_str() {
            "ctrack" => DetectionMode::CTrack,
            "ridge" => DetectionMode::Ridge,
            _ => DetectionMode::Hollow,
        };
    }
    if config.mode == DetectionMode::None {
        return Err(CliError::Usage(
            "no detection mode: set [ASD] DetectionMode or pass --mode".to_string(),
        ));
    }

    let (p1, p2) = match (&args.stroke, &config.stroke) {
        (Some(s), _) => (Pt2i::new(s[0], s[1]), Pt2i::new(s[2], s[3])),
        (None, Some(s)) => (s.p1, s.p2),
        (None, None) => {
            return Err(CliError::Usage(
                "no stroke: set [Stroke] in the configuration or pass --stroke".to_string(),
            ))
        }
    };

    let mut tiles = TileSet::new(&args.tiles, config.cloud_access);
    let names = discover_tile_names(&args.tiles, config.cloud_access)?;
    if names.is_empty() {
        return Err(CliError::Usage(format!(
            "no {} tiles under {}",
            config.cloud_access.dir(),
            args.tiles.display()
        )));
    }
    for name in &names {
        tiles.add_tile(name)?;
    }

    let summary = match config.mode {
        DetectionMode::CTrack => detect_ctrack(&config, &tiles, p1, p2, &args)?,
        _ => detect_ridge(&config, &tiles, p1, p2, &args)?,
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("status:        {:?}", summary.status);
        println!("kind:          {}", summary.kind);
        println!("scans:         {}/{}", summary.accepted_scans, summary.total_scans);
        println!("length:        {:.2} m", summary.length_m);
        println!("mean width:    {:.2} m", summary.width_m);
        if let Some(h) = summary.height_m {
            println!("mean height:   {:.2} m", h);
        }
        if let Some(v) = summary.volume_m3 {
            println!("volume:        {:.2} m3", v);
        }
    }
    Ok(())
}

fn detect_ctrack(
    config: &DetectionConfig,
    tiles: &TileSet,
    p1: Pt2i,
    p2: Pt2i,
    args: &DetectArgs,
) -> Result<DetectionSummary, CliError> {
    let mut detector = CTrackDetector::new(tiles);
    config.configure_ctrack(&mut detector);
    let status = detector.detect(p1, p2);

    let track = detector.track();
    let summary = DetectionSummary {
        status,
        kind: "ctrack".to_string(),
        accepted_scans: track.map(|t| t.accepted_count()).unwrap_or(0),
        total_scans: track.map(|t| t.scan_count()).unwrap_or(0),
        length_m: track.map(|t| t.length() / 1000.0).unwrap_or(0.0),
        width_m: track.map(|t| t.mean_width() / 1000.0).unwrap_or(0.0),
        height_m: None,
        volume_m3: None,
    };

    if let (Some(out), Some(track)) = (&args.out, track) {
        if status.is_ok() {
            let origin = (tiles.xref(), tiles.yref());
            if args.bounds {
                let (mut starts, ends) = track.bounds();
                starts.extend(ends.into_iter().rev());
                write_shapefile(out, ShapeKind::Polygon, &starts, origin)?;
            } else {
                write_shapefile(out, ShapeKind::Polyline, &track.centerline(), origin)?;
            }
        }
    }
    Ok(summary)
}

fn detect_ridge(
    config: &DetectionConfig,
    tiles: &TileSet,
    p1: Pt2i,
    p2: Pt2i,
    args: &DetectArgs,
) -> Result<DetectionSummary, CliError> {
    let mut detector = RidgeDetector::new(tiles);
    config.configure_ridge(&mut detector);
    let status = detector.detect(p1, p2);

    let ridge = detector.ridge();
    let kind = match detector.kind() {
        StructureKind::Ridge => "ridge",
        StructureKind::Hollow => "hollow",
    };
    let summary = DetectionSummary {
        status,
        kind: kind.to_string(),
        accepted_scans: ridge.map(|r| r.accepted_count()).unwrap_or(0),
        total_scans: ridge.map(|r| r.scan_count()).unwrap_or(0),
        length_m: ridge.map(|r| r.length() / 1000.0).unwrap_or(0.0),
        width_m: ridge.map(|r| r.mean_width() / 1000.0).unwrap_or(0.0),
        height_m: ridge.map(|r| r.mean_height() / 1000.0),
        volume_m3: ridge.map(|r| r.volume() / 1e9),
    };

    if let (Some(out), Some(ridge)) = (&args.out, ridge) {
        if status.is_ok() {
            let origin = (tiles.xref(), tiles.yref());
            if args.bounds {
                let (mut starts, ends) = ridge.bounds();
                starts.extend(ends.into_iter().rev());
                write_shapefile(out, ShapeKind::Polygon, &starts, origin)?;
            } else {
                write_shapefile(out, ShapeKind::Polyline, &ridge.centerline(), origin)?;
            }
        }
    }
    Ok(summary)
}
