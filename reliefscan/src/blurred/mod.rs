//! Blurred segments: polylines enclosed in a bounded-thickness digital band.
//!
//! A blurred segment is a sequence of points, extendable at both ends,
//! together with the optimal digital straight segment enclosing it. The
//! enclosing band is obtained by inserting the points into a polyline convex
//! hull and reading the thinner of its two antipodal pairs.

mod biptlist;
mod segment;

pub use biptlist::BiPtList;
pub use segment::{BlurredSegment, BlurredSegmentBuilder};
