//! Point tile: storage, binary format and cell queries.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;
use tracing::debug;

use crate::cloud::Pt3i;

/// Ratio of lidar file unit (1 m) to the local unit (1 mm).
pub const XYZ_UNIT: i64 = 1000;

/// Minimal cell size in millimeters; cell sizes are multiples of it.
pub const MIN_CELL_SIZE: i32 = 100;

/// Size of a DTM pixel in millimeters.
pub const PIXEL_MM: i32 = 500;

/// Numerical rounding safety margin applied on XYZ import (mm).
const DECAL: i32 = 5;

/// Tile access mode: cell subdivision factor and file naming convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloudAccess {
    /// One DTM pixel per cell, most memory.
    Top,
    /// 5x5 pixels per cell.
    Mid,
    /// 10x10 pixels per cell, least memory.
    Eco,
}

impl CloudAccess {
    /// Cell subdivision factor in DTM pixels.
    pub fn subdivision(self) -> i32 {
        match self {
            CloudAccess::Top => 1,
            CloudAccess::Mid => 5,
            CloudAccess::Eco => 10,
        }
    }

    /// Cell size in millimeters.
    pub fn cell_size(self) -> i32 {
        self.subdivision() * PIXEL_MM
    }

    /// Directory holding the tiles of this mode.
    pub fn dir(self) -> &'static str {
        match self {
            CloudAccess::Top => "top",
            CloudAccess::Mid => "mid",
            CloudAccess::Eco => "eco",
        }
    }

    /// Tile file prefix of this mode.
    pub fn prefix(self) -> &'static str {
        match self {
            CloudAccess::Top => "top_",
            CloudAccess::Mid => "mid_",
            CloudAccess::Eco => "eco_",
        }
    }

    /// Path of the tile file `<base>/<dir>/<prefix><name>.til`.
    pub fn tile_path(self, base: &Path, name: &str) -> PathBuf {
        base.join(self.dir()).join(format!("{}{}.til", self.prefix(), name))
    }

    /// Parses the access mode from its subdivision factor.
    pub fn from_subdivision(sub: i32) -> Option<CloudAccess> {
        match sub {
            1 => Some(CloudAccess::Top),
            5 => Some(CloudAccess::Mid),
            10 => Some(CloudAccess::Eco),
            _ => None,
        }
    }
}

/// Errors of tile loading, saving and import.
#[derive(Debug, Error)]
pub enum TileError {
    /// Underlying I/O failure.
    #[error("tile I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structurally invalid tile file.
    #[error("invalid tile file {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    /// Tile not present on disk.
    #[error("missing tile file {0}")]
    Missing(PathBuf),
}

/// A cell-indexed 3-D point tile.
///
/// Cells are laid out row-major; `cells[j * cols + i]` is the start index of
/// cell (i, j) in the flat point array and `cells[rows * cols]` equals the
/// total point count. Inside a cell, points are sorted by (y, x).
#[derive(Clone, Debug)]
pub struct PtTile {
    rows: i32,
    cols: i32,
    xmin: i64,
    ymin: i64,
    zmax: i64,
    csize: i32,
    cells: Vec<i32>,
    points: Vec<Pt3i>,
}

impl PtTile {
    /// Creates an empty tile with the given cell grid.
    pub fn new(rows: i32, cols: i32) -> Self {
        PtTile {
            rows,
            cols,
            xmin: 0,
            ymin: 0,
            zmax: 0,
            csize: 1,
            cells: vec![0; (rows * cols + 1) as usize],
            points: Vec::new(),
        }
    }

    /// Declares the playground area.
    pub fn set_area(&mut self, xmin: i64, ymin: i64, zmax: i64, cell_size: i32) {
        self.xmin = xmin;
        self.ymin = ymin;
        self.zmax = zmax;
        self.csize = cell_size;
    }

    /// Returns the cell size in millimeters.
    #[inline]
    pub fn cell_size(&self) -> i32 {
        self.csize
    }

    /// Returns the X-spread of the tile in millimeters.
    #[inline]
    pub fn x_spread(&self) -> i64 {
        self.cols as i64 * self.csize as i64
    }

    /// Returns the Y-spread of the tile in millimeters.
    #[inline]
    pub fn y_spread(&self) -> i64 {
        self.rows as i64 * self.csize as i64
    }

    /// Returns the left mm coordinate of the tile.
    #[inline]
    pub fn xref(&self) -> i64 {
        self.xmin
    }

    /// Returns the bottom mm coordinate of the tile.
    #[inline]
    pub fn yref(&self) -> i64 {
        self.ymin
    }

    /// Returns the highest point height.
    #[inline]
    pub fn top(&self) -> i64 {
        self.zmax
    }

    /// Returns the count of points.
    #[inline]
    pub fn size(&self) -> usize {
        self.points.len()
    }

    /// Returns the count of cell rows.
    #[inline]
    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Returns the count of cell columns.
    #[inline]
    pub fn cols(&self) -> i32 {
        self.cols
    }

    /// Returns the count of points of cell (i, j).
    #[inline]
    pub fn cell_count(&self, i: i32, j: i32) -> i32 {
        let k = (j * self.cols + i) as usize;
        self.cells[k + 1] - self.cells[k]
    }

    /// Returns the points of cell (i, j).
    pub fn cell_points(&self, i: i32, j: i32) -> &[Pt3i] {
        let k = (j * self.cols + i) as usize;
        &self.points[self.cells[k] as usize..self.cells[k + 1] as usize]
    }

    /// Appends the points of cell (i, j) and returns the count collected.
    ///
    /// The cell covers the half-open mm square
    /// `[i * csize, (i+1) * csize) x [j * csize, (j+1) * csize)`.
    pub fn collect_cell_points(&self, out: &mut Vec<Pt3i>, i: i32, j: i32) -> usize {
        let pts = self.cell_points(i, j);
        out.extend_from_slice(pts);
        pts.len()
    }

    /// Appends the points of the subcell (i, j) at `MIN_CELL_SIZE`
    /// granularity and returns the count collected.
    pub fn collect_subcell_points(&self, out: &mut Vec<Pt3i>, i: i32, j: i32) -> usize {
        self.collect_square(out, i as i64 * MIN_CELL_SIZE as i64, j as i64 * MIN_CELL_SIZE as i64, MIN_CELL_SIZE)
    }

    /// Appends the points of the DTM pixel (px, py), in tile-local pixel
    /// coordinates, and returns the count collected.
    pub fn collect_pixel_points(&self, out: &mut Vec<Pt3i>, px: i32, py: i32) -> usize {
        if self.csize == PIXEL_MM {
            if px < 0 || py < 0 || px >= self.cols || py >= self.rows {
                return 0;
            }
            return self.collect_cell_points(out, px, py);
        }
        self.collect_square(out, px as i64 * PIXEL_MM as i64, py as i64 * PIXEL_MM as i64, PIXEL_MM)
    }

    /// Appends the points of the half-open mm square
    /// `[x0, x0 + size) x [y0, y0 + size)`.
    fn collect_square(&self, out: &mut Vec<Pt3i>, x0: i64, y0: i64, size: i32) -> usize {
        let ci = (x0 / self.csize as i64) as i32;
        let cj = (y0 / self.csize as i64) as i32;
        if ci < 0 || cj < 0 || ci >= self.cols || cj >= self.rows {
            return 0;
        }
        let x0 = x0 as i32;
        let y0 = y0 as i32;
        let before = out.len();
        for p in self.cell_points(ci, cj) {
            if p.x() >= x0 && p.x() < x0 + size && p.y() >= y0 && p.y() < y0 + size {
                out.push(*p);
            }
        }
        out.len() - before
    }

    /// Loads a tile from its binary file.
    pub fn load(path: &Path) -> Result<PtTile, TileError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TileError::Missing(path.to_path_buf()))
            }
            Err(e) => return Err(TileError::Io(e)),
        };
        let mut r = BufReader::new(file);
        let cols = r.read_i32::<LittleEndian>()?;
        let rows = r.read_i32::<LittleEndian>()?;
        let xmin = r.read_i64::<LittleEndian>()?;
        let ymin = r.read_i64::<LittleEndian>()?;
        let zmax = r.read_i64::<LittleEndian>()?;
        let csize = r.read_i32::<LittleEndian>()?;
        let nb = r.read_i32::<LittleEndian>()?;
        if rows <= 0 || cols <= 0 || nb < 0 || csize <= 0 || csize % MIN_CELL_SIZE != 0 {
            return Err(TileError::Format {
                path: path.to_path_buf(),
                reason: format!(
                    "inconsistent header (rows {}, cols {}, nb {}, cell size {})",
                    rows, cols, nb, csize
                ),
            });
        }
        let ncells = (rows * cols + 1) as usize;
        let mut cells = Vec::with_capacity(ncells);
        for _ in 0..ncells {
            cells.push(r.read_i32::<LittleEndian>()?);
        }
        if cells[ncells - 1] != nb || cells.windows(2).any(|w| w[0] > w[1]) {
            return Err(TileError::Format {
                path: path.to_path_buf(),
                reason: "cell index array is not a non-decreasing run ending at nb".to_string(),
            });
        }
        let mut points = Vec::with_capacity(nb as usize);
        for _ in 0..nb {
            let x = r.read_i32::<LittleEndian>()?;
            let y = r.read_i32::<LittleEndian>()?;
            let z = r.read_i32::<LittleEndian>()?;
            points.push(Pt3i::new(x, y, z));
        }
        // reject trailing garbage
        let mut probe = [0u8; 1];
        if r.read(&mut probe)? != 0 {
            return Err(TileError::Format {
                path: path.to_path_buf(),
                reason: "trailing bytes after point array".to_string(),
            });
        }
        debug!(
            tile = %path.display(),
            points = nb,
            cell_size = csize,
            "tile loaded"
        );
        Ok(PtTile { rows, cols, xmin, ymin, zmax, csize, cells, points })
    }

    /// Reads only the header of a tile file.
    pub fn load_header(path: &Path) -> Result<PtTile, TileError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TileError::Missing(path.to_path_buf()))
            }
            Err(e) => return Err(TileError::Io(e)),
        };
        let mut r = BufReader::new(file);
        let cols = r.read_i32::<LittleEndian>()?;
        let rows = r.read_i32::<LittleEndian>()?;
        let xmin = r.read_i64::<LittleEndian>()?;
        let ymin = r.read_i64::<LittleEndian>()?;
        let zmax = r.read_i64::<LittleEndian>()?;
        let csize = r.read_i32::<LittleEndian>()?;
        let nb = r.read_i32::<LittleEndian>()?;
        if rows <= 0 || cols <= 0 || nb < 0 || csize <= 0 {
            return Err(TileError::Format {
                path: path.to_path_buf(),
                reason: "inconsistent header".to_string(),
            });
        }
        Ok(PtTile {
            rows,
            cols,
            xmin,
            ymin,
            zmax,
            csize,
            cells: Vec::new(),
            points: Vec::new(),
        })
    }

    /// Saves the tile to its binary file.
    pub fn save(&self, path: &Path) -> Result<(), TileError> {
        let mut w = BufWriter::new(File::create(path)?);
        w.write_i32::<LittleEndian>(self.cols)?;
        w.write_i32::<LittleEndian>(self.rows)?;
        w.write_i64::<LittleEndian>(self.xmin)?;
        w.write_i64::<LittleEndian>(self.ymin)?;
        w.write_i64::<LittleEndian>(self.zmax)?;
        w.write_i32::<LittleEndian>(self.csize)?;
        w.write_i32::<LittleEndian>(self.points.len() as i32)?;
        for c in &self.cells {
            w.write_i32::<LittleEndian>(*c)?;
        }
        for p in &self.points {
            w.write_i32::<LittleEndian>(p.x())?;
            w.write_i32::<LittleEndian>(p.y())?;
            w.write_i32::<LittleEndian>(p.z())?;
        }
        w.flush()?;
        Ok(())
    }

    /// Builds the tile content from unordered points.
    ///
    /// Points are bucketed into the cell grid and sorted by (y, x) inside
    /// each cell; `zmax` is updated.
    pub fn fill(&mut self, mut pts: Vec<Pt3i>) {
        let cols = self.cols;
        let csize = self.csize;
        pts.retain(|p| {
            p.x() >= 0
                && p.y() >= 0
                && (p.x() / csize) < self.cols
                && (p.y() / csize) < self.rows
        });
        pts.sort_by_key(|p| {
            let ci = p.x() / csize;
            let cj = p.y() / csize;
            (cj * cols + ci, p.y(), p.x())
        });
        self.cells = vec![0; (self.rows * self.cols + 1) as usize];
        for p in &pts {
            let k = (p.y() / csize) * cols + (p.x() / csize);
            self.cells[k as usize + 1] += 1;
            if p.z() as i64 > self.zmax {
                self.zmax = p.z() as i64;
            }
        }
        for k in 1..self.cells.len() {
            self.cells[k] += self.cells[k - 1];
        }
        self.points = pts;
    }

    /// Imports a tile from an XYZ text file (one `x y z` triple per line, in
    /// meters). Points outside the declared area are dropped.
    pub fn load_xyz(&mut self, path: &Path) -> Result<usize, TileError> {
        let mut text = String::new();
        File::open(path)?.read_to_string(&mut text)?;
        let mut pts = Vec::new();
        let mut outliers = 0usize;
        for token in text.split_whitespace().collect::<Vec<_>>().chunks(3) {
            if token.len() < 3 {
                break;
            }
            let x: f64 = token[0].parse().map_err(|_| TileError::Format {
                path: path.to_path_buf(),
                reason: format!("bad coordinate {:?}", token[0]),
            })?;
            let y: f64 = token[1].parse().map_err(|_| TileError::Format {
                path: path.to_path_buf(),
                reason: format!("bad coordinate {:?}", token[1]),
            })?;
            let z: f64 = token[2].parse().map_err(|_| TileError::Format {
                path: path.to_path_buf(),
                reason: format!("bad coordinate {:?}", token[2]),
            })?;
            let ix = ((x * XYZ_UNIT as f64 + 0.5) as i64 - self.xmin) as i32;
            let iy = ((y * XYZ_UNIT as f64 + 0.5) as i64 - self.ymin) as i32;
            let iz = (z * XYZ_UNIT as f64 + 0.5) as i32;
            if ix < 0 || iy < 0 || ix / self.csize >= self.cols || iy / self.csize >= self.rows {
                outliers += 1;
            } else {
                pts.push(Pt3i::new(ix + DECAL, iy + DECAL, iz));
            }
        }
        if outliers > 0 {
            debug!(outliers, file = %path.display(), "points outside the tile area");
        }
        let kept = pts.len();
        self.fill(pts);
        Ok(kept)
    }

    /// Builds a coarser tile holding the same points, regrouped into the
    /// cells of the target access mode.
    pub fn regroup(&self, access: CloudAccess) -> PtTile {
        let csize = access.cell_size();
        let cols = ((self.x_spread() + csize as i64 - 1) / csize as i64) as i32;
        let rows = ((self.y_spread() + csize as i64 - 1) / csize as i64) as i32;
        let mut out = PtTile::new(rows, cols);
        out.set_area(self.xmin, self.ymin, self.zmax, csize);
        out.fill(self.points.clone());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_tile() -> PtTile {
        let mut tile = PtTile::new(4, 4);
        tile.set_area(1_000_000, 2_000_000, 0, 500);
        let mut pts = Vec::new();
        for j in 0..4 {
            for i in 0..4 {
                for k in 0..3 {
                    pts.push(Pt3i::new(i * 500 + 100 + k * 120, j * 500 + 70 + k * 90, 50_000 + k));
                }
            }
        }
        tile.fill(pts);
        tile
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.til");
        let tile = sample_tile();
        tile.save(&path).unwrap();
        let back = PtTile::load(&path).unwrap();
        assert_eq!(back.rows(), tile.rows());
        assert_eq!(back.cols(), tile.cols());
        assert_eq!(back.xref(), tile.xref());
        assert_eq!(back.yref(), tile.yref());
        assert_eq!(back.top(), tile.top());
        assert_eq!(back.cell_size(), tile.cell_size());
        assert_eq!(back.size(), tile.size());
        for j in 0..4 {
            for i in 0..4 {
                assert_eq!(back.cell_points(i, j), tile.cell_points(i, j));
            }
        }
    }

    #[test]
    fn test_missing_tile() {
        assert!(matches!(
            PtTile::load(Path::new("/nonexistent/none.til")),
            Err(TileError::Missing(_))
        ));
    }

    #[test]
    fn test_cell_query_half_open_bounds() {
        let mut tile = PtTile::new(4, 4);
        tile.set_area(0, 0, 0, 500);
        tile.fill(vec![
            Pt3i::new(1500, 1000, 10), // on both lower bounds: inside (3,2)
            Pt3i::new(1999, 1499, 11), // just under the upper bounds
            Pt3i::new(2000, 1000, 12), // x upper bound: outside
            Pt3i::new(1500, 1500, 13), // y upper bound: outside
        ]);
        let mut out = Vec::new();
        let n = tile.collect_cell_points(&mut out, 3, 2);
        assert_eq!(n, 2);
        assert!(out.contains(&Pt3i::new(1500, 1000, 10)));
        assert!(out.contains(&Pt3i::new(1999, 1499, 11)));
    }

    #[test]
    fn test_cells_sorted_by_y_then_x() {
        let tile = sample_tile();
        for j in 0..4 {
            for i in 0..4 {
                let pts = tile.cell_points(i, j);
                for w in pts.windows(2) {
                    assert!(w[0].cell_order() <= w[1].cell_order());
                }
            }
        }
    }

    #[test]
    fn test_pixel_query_equals_cell_on_top_tiles() {
        let tile = sample_tile();
        let mut a = Vec::new();
        let mut b = Vec::new();
        tile.collect_pixel_points(&mut a, 2, 1);
        tile.collect_cell_points(&mut b, 2, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_regroup_preserves_points() {
        let tile = sample_tile();
        let mid = tile.regroup(CloudAccess::Mid);
        assert_eq!(mid.cell_size(), 2500);
        assert_eq!(mid.size(), tile.size());
        // pixel queries see the same content at both resolutions
        for py in 0..4 {
            for px in 0..4 {
                let mut a = Vec::new();
                let mut b = Vec::new();
                tile.collect_pixel_points(&mut a, px, py);
                mid.collect_pixel_points(&mut b, px, py);
                a.sort_by_key(|p| p.cell_order());
                b.sort_by_key(|p| p.cell_order());
                assert_eq!(a, b, "pixel ({}, {})", px, py);
            }
        }
    }
}
