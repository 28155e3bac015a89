//! Structure detectors.
//!
//! The carriage-track and ridge/hollow detectors drive a directional scanner
//! along the normal of a user stroke: each scan yields a height profile, a
//! single-scan fit is run against the template predicted from the previous
//! scan, and acceptance propagates the template while a run of misses
//! terminates the side. Detected structures keep every per-scan fit,
//! accepted or not, for introspection.

mod ctrack;
mod ridge;
mod status;

pub use ctrack::{CTrackDetector, CarriageTrack};
pub use ridge::{Ridge, RidgeDetector, StructureKind};
pub use status::DetectionStatus;
