//! Convex hull of a polyline with antipodal pair maintenance.
//!
//! The hull is grown by inserting points at either end of a polyline and
//! keeps two antipodal (vertex, edge) pairs, one per axis direction, up to
//! date on every insertion, so the width of the minimum enclosing parallel
//! strip is available in amortized constant time. A single-slot
//! preserve/restore snapshot lets callers speculatively insert a point and
//! roll the hull back to the exact previous state.
//!
//! Vertices live in an arena with index-based neighbour links; no reference
//! cycles, no per-vertex allocation.

mod antipodal;
mod convex;

pub use antipodal::Antipodal;
pub use convex::{ConvexHull, VertexId};
