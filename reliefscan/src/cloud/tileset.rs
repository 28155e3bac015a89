//! Tile set: lazily loaded arrangement of adjacent point tiles.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::cloud::{CloudAccess, Pt3i, PtTile, TileError, PIXEL_MM};

struct TileSlot {
    name: String,
    path: PathBuf,
    xmin: i64,
    ymin: i64,
    xspread: i64,
    yspread: i64,
    data: OnceCell<PtTile>,
}

/// A rectangular arrangement of point tiles sharing one cell size.
///
/// Tiles are registered up front from their headers; the full point data of
/// a tile is only read from disk on its first query. The set exposes DTM
/// pixel queries in set-global coordinates: collected points are translated
/// to millimeter offsets from the set origin (`xref`, `yref`).
///
/// Not shareable across threads; the detection core is single-threaded and
/// queries are read-only apart from the hidden lazy loads.
pub struct TileSet {
    base: PathBuf,
    access: CloudAccess,
    slots: Vec<TileSlot>,
    xref: i64,
    yref: i64,
    xmax: i64,
    ymax: i64,
    zmax: i64,
}

impl TileSet {
    /// Creates an empty tile set reading tiles under the given base
    /// directory with the given access mode.
    pub fn new(base: impl Into<PathBuf>, access: CloudAccess) -> Self {
        TileSet {
            base: base.into(),
            access,
            slots: Vec::new(),
            xref: i64::MAX,
            yref: i64::MAX,
            xmax: i64::MIN,
            ymax: i64::MIN,
            zmax: 0,
        }
    }

    /// Returns the access mode of the set.
    #[inline]
    pub fn access(&self) -> CloudAccess {
        self.access
    }

    /// Registers a tile by name, reading only its header.
    pub fn add_tile(&mut self, name: &str) -> Result<(), TileError> {
        let path = self.access.tile_path(&self.base, name);
        let header = PtTile::load_header(&path)?;
        let slot = TileSlot {
            name: name.to_string(),
            path,
            xmin: header.xref(),
            ymin: header.yref(),
            xspread: header.x_spread(),
            yspread: header.y_spread(),
            data: OnceCell::new(),
        };
        self.xref = self.xref.min(slot.xmin);
        self.yref = self.yref.min(slot.ymin);
        self.xmax = self.xmax.max(slot.xmin + slot.xspread);
        self.ymax = self.ymax.max(slot.ymin + slot.yspread);
        self.zmax = self.zmax.max(header.top());
        debug!(tile = name, "tile registered");
        self.slots.push(slot);
        Ok(())
    }

    /// Returns the count of registered tiles.
    #[inline]
    pub fn tile_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the left mm coordinate of the set.
    #[inline]
    pub fn xref(&self) -> i64 {
        self.xref
    }

    /// Returns the bottom mm coordinate of the set.
    #[inline]
    pub fn yref(&self) -> i64 {
        self.yref
    }

    /// Returns the highest point height over all tiles (mm).
    #[inline]
    pub fn zmax(&self) -> i64 {
        self.zmax
    }

    /// Returns the DTM width in pixels.
    pub fn pixel_width(&self) -> i32 {
        if self.slots.is_empty() {
            0
        } else {
            ((self.xmax - self.xref) / PIXEL_MM as i64) as i32
        }
    }

    /// Returns the DTM height in pixels.
    pub fn pixel_height(&self) -> i32 {
        if self.slots.is_empty() {
            0
        } else {
            ((self.ymax - self.yref) / PIXEL_MM as i64) as i32
        }
    }

    fn slot_at(&self, xmm: i64, ymm: i64) -> Option<usize> {
        self.slots.iter().position(|s| {
            xmm >= s.xmin && xmm < s.xmin + s.xspread && ymm >= s.ymin && ymm < s.ymin + s.yspread
        })
    }

    fn tile(&self, idx: usize) -> Result<&PtTile, TileError> {
        let slot = &self.slots[idx];
        if let Some(t) = slot.data.get() {
            return Ok(t);
        }
        info!(tile = %slot.name, "lazy tile load");
        let loaded = PtTile::load(&slot.path)?;
        Ok(slot.data.get_or_init(|| loaded))
    }

    /// Appends the points of the DTM pixel (px, py), in set-global pixel
    /// coordinates; collected points are translated to set-relative
    /// millimeters. Returns the count collected.
    pub fn collect_pixel_points(
        &self,
        out: &mut Vec<Pt3i>,
        px: i32,
        py: i32,
    ) -> Result<usize, TileError> {
        let xmm = self.xref + px as i64 * PIXEL_MM as i64;
        let ymm = self.yref + py as i64 * PIXEL_MM as i64;
        let idx = match self.slot_at(xmm, ymm) {
            Some(i) => i,
            None => return Ok(0),
        };
        let tile = self.tile(idx)?;
        let lpx = ((xmm - tile.xref()) / PIXEL_MM as i64) as i32;
        let lpy = ((ymm - tile.yref()) / PIXEL_MM as i64) as i32;
        let mut local = Vec::new();
        tile.collect_pixel_points(&mut local, lpx, lpy);
        let dx = (tile.xref() - self.xref) as i32;
        let dy = (tile.yref() - self.yref) as i32;
        let n = local.len();
        out.extend(local.into_iter().map(|p| Pt3i::new(p.x() + dx, p.y() + dy, p.z())));
        Ok(n)
    }

    /// Drops the loaded point data of one tile; the tile will be reloaded
    /// on its next query.
    pub fn release(&mut self, name: &str) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.name == name) {
            slot.data.take();
        }
    }
}

/// Derives the MID and ECO resolutions of the named TOP tiles, writing the
/// converted files next to them under the mode directories.
pub fn derive_resolutions(base: &Path, names: &[String]) -> Result<(), TileError> {
    std::fs::create_dir_all(base.join(CloudAccess::Mid.dir()))?;
    std::fs::create_dir_all(base.join(CloudAccess::Eco.dir()))?;
    names
        .par_iter()
        .try_for_each(|name| -> Result<(), TileError> {
            let top = PtTile::load(&CloudAccess::Top.tile_path(base, name))?;
            for access in [CloudAccess::Mid, CloudAccess::Eco] {
                let coarse = top.regroup(access);
                coarse.save(&access.tile_path(base, name))?;
            }
            info!(tile = %name, "derived mid and eco resolutions");
            Ok(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_tile(base: &Path, name: &str, xmin: i64, ymin: i64) {
        std::fs::create_dir_all(base.join("top")).unwrap();
        let mut tile = PtTile::new(4, 4);
        tile.set_area(xmin, ymin, 0, 500);
        let mut pts = Vec::new();
        for j in 0..4 {
            for i in 0..4 {
                pts.push(Pt3i::new(i * 500 + 250, j * 500 + 250, 40_000 + i + j));
            }
        }
        tile.fill(pts);
        tile.save(&CloudAccess::Top.tile_path(base, name)).unwrap();
    }

    #[test]
    fn test_lazy_load_and_pixel_query() {
        let dir = tempdir().unwrap();
        write_tile(dir.path(), "a", 0, 0);
        write_tile(dir.path(), "b", 2000, 0);
        let mut set = TileSet::new(dir.path(), CloudAccess::Top);
        set.add_tile("a").unwrap();
        set.add_tile("b").unwrap();
        assert_eq!(set.pixel_width(), 8);
        assert_eq!(set.pixel_height(), 4);

        let mut out = Vec::new();
        // pixel (5, 2) falls in tile b, local pixel (1, 2)
        let n = set.collect_pixel_points(&mut out, 5, 2).unwrap();
        assert_eq!(n, 1);
        assert_eq!(out[0], Pt3i::new(2000 + 750, 1250, 40_000 + 1 + 2));
    }

    #[test]
    fn test_release_then_requery() {
        let dir = tempdir().unwrap();
        write_tile(dir.path(), "a", 0, 0);
        let mut set = TileSet::new(dir.path(), CloudAccess::Top);
        set.add_tile("a").unwrap();
        let mut out = Vec::new();
        set.collect_pixel_points(&mut out, 1, 1).unwrap();
        set.release("a");
        out.clear();
        let n = set.collect_pixel_points(&mut out, 1, 1).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_missing_tile_is_reported() {
        let dir = tempdir().unwrap();
        let mut set = TileSet::new(dir.path(), CloudAccess::Top);
        assert!(matches!(set.add_tile("nope"), Err(TileError::Missing(_))));
    }

    #[test]
    fn test_query_outside_any_tile_is_empty() {
        let dir = tempdir().unwrap();
        write_tile(dir.path(), "a", 0, 0);
        let mut set = TileSet::new(dir.path(), CloudAccess::Top);
        set.add_tile("a").unwrap();
        let mut out = Vec::new();
        assert_eq!(set.collect_pixel_points(&mut out, 40, 40).unwrap(), 0);
    }
}
