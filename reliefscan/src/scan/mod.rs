//! Directional scanner family.
//!
//! A directional scanner incrementally produces parallel scan lines across a
//! lattice area. The central scan is defined by a stroke (two control points)
//! or by a center, a direction and a length; successive calls then yield the
//! adjacent parallel scans on either side. Every scan is a run of lattice
//! points stepping along an eight-octant Bresenham pattern, bounded by the
//! two support lines of the strip and clipped to the scan area.
//!
//! Twelve behaviours (four octants, three modes) are collapsed into a single
//! struct branching on two enum tags: the classic incremental scanner, the
//! adaptive scanner which can re-bind its strip onto a new central digital
//! line, and the orthographic scanner whose scans are pure rows or columns.

mod provider;
mod scanner;

pub use provider::ScannerProvider;
pub use scanner::{DirectionalScanner, ScanMode, ScanOctant};
