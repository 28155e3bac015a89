//! Tile management commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use reliefscan::cloud::{derive_resolutions, CloudAccess, PtTile, PIXEL_MM};

use crate::error::CliError;

/// Tile action subcommands.
#[derive(Subcommand)]
pub enum TilesAction {
    /// Import XYZ lidar exports as TOP tiles and derive MID/ECO resolutions
    Import(ImportArgs),
    /// Print the header of a tile file
    Info {
        /// Tile file path
        file: PathBuf,
    },
}

/// Arguments for the import command.
#[derive(Args)]
pub struct ImportArgs {
    /// Tile base directory (top/, mid/ and eco/ are created below it)
    #[arg(long)]
    pub dir: PathBuf,

    /// Tile name (defaults to the file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Left map border of the tile, in meters
    #[arg(long)]
    pub xmin: i64,

    /// Bottom map border of the tile, in meters
    #[arg(long)]
    pub ymin: i64,

    /// Tile side length, in meters
    #[arg(long, default_value_t = 1000)]
    pub size: i64,

    /// XYZ files to import
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Run a tiles subcommand.
pub fn run(action: TilesAction) -> Result<(), CliError> {
    match action {
        TilesAction::Import(args) => import(args),
        TilesAction::Info { file } => info(&file),
    }
}

fn import(args: ImportArgs) -> Result<(), CliError> {
    std::fs::create_dir_all(args.dir.join(CloudAccess::Top.dir()))?;
    let cells = (args.size * 1000 / PIXEL_MM as i64) as i32;
    let mut names = Vec::new();
    for file in &args.files {
        let name = match (&args.name, args.files.len()) {
            (Some(n), 1) => n.clone(),
            _ => file
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .ok_or_else(|| CliError::Usage(format!("bad file name {}", file.display())))?,
        };
        let mut tile = PtTile::new(cells, cells);
        tile.set_area(args.xmin * 1000, args.ymin * 1000, 0, PIXEL_MM);
        let kept = tile.load_xyz(file)?;
        tile.save(&CloudAccess::Top.tile_path(&args.dir, &name))?;
        println!("{}: {} points", name, kept);
        names.push(name);
    }
    derive_resolutions(&args.dir, &names)?;
    println!("derived mid and eco resolutions for {} tile(s)", names.len());
    Ok(())
}

fn info(file: &Path) -> Result<(), CliError> {
    let tile = PtTile::load(file)?;
    println!("tile:        {}", file.display());
    println!("grid:        {} x {} cells", tile.cols(), tile.rows());
    println!("cell size:   {} mm", tile.cell_size());
    println!("corner:      ({} m, {} m)", tile.xref() / 1000, tile.yref() / 1000);
    println!("top height:  {} m", tile.top() as f64 / 1000.0);
    println!("points:      {}", tile.size());
    Ok(())
}

/// Lists the tile names available under one access mode directory.
pub fn discover_tile_names(base: &Path, access: CloudAccess) -> Result<Vec<String>, CliError> {
    let dir = base.join(access.dir());
    let mut names = Vec::new();
    if !dir.exists() {
        return Ok(names);
    }
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let file = entry.file_name().to_string_lossy().to_string();
        if let Some(stem) = file.strip_suffix(".til") {
            if let Some(name) = stem.strip_prefix(access.prefix()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
