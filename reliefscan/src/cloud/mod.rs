//! Cell-indexed 3-D point cloud tiles.
//!
//! A tile holds the raw lidar points of a square patch of the map in
//! millimeter units, bucketed into a grid of cells for spatial queries. A
//! tile set arranges adjacent tiles, loads them lazily on first query and
//! answers the per-pixel point collections the detection core feeds on.
//!
//! Three access modes trade memory for speed: TOP keeps one DTM pixel per
//! cell, MID groups 5x5 pixels and ECO 10x10.

mod point3;
mod tile;
mod tileset;

pub use point3::Pt3i;
pub use tile::{CloudAccess, PtTile, TileError, MIN_CELL_SIZE, PIXEL_MM, XYZ_UNIT};
pub use tileset::{derive_resolutions, TileSet};
