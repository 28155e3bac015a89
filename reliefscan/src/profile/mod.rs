//! Scan profiles and single-scan structure fits.
//!
//! A scan profile is the 1-D sequence of (position, height) samples obtained
//! by projecting the raw lidar points of one scan onto the stroke direction.
//! Two single-scan detectors fit structures against a template predicted
//! from the previous scan: the plateau fit models the flat cross-section of
//! a carriage track, the bump fit models the convex cross-section of a ridge
//! (or, on negated heights, the concave cross-section of a hollow).

mod bump;
mod plateau;
mod scan_profile;

pub use bump::{Bump, BumpModel, BumpRef, BumpStatus, ControlLevel, DefaultFlags, TrendFit};
pub use plateau::{Plateau, PlateauModel, PlateauRef, PlateauStatus};
pub use scan_profile::ScanProfile;
