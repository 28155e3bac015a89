//! Digital straight lines and segments.
//!
//! A digital straight line is the set of lattice points satisfying
//! `c <= ax + by < c + nu` with `a >= 0`, `b > 0` when `a = 0`, and
//! `nu > 0`. A digital straight segment additionally bounds the band along
//! its dominant axis. These are the exact-arithmetic carriers of every
//! thickness and tilt computation in the detection core.

mod line;
mod segment;

pub use line::{DigitalStraightLine, DslError, DslType};
pub use segment::DigitalStraightSegment;
