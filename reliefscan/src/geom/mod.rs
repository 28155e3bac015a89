//! Integer lattice primitives.
//!
//! Provides the exact-arithmetic building blocks of the detection core:
//! points and vectors of the digital plane, Bresenham-style rasterization
//! (full and viewport-clipped), the eight-octant step pattern consumed by
//! the directional scanners, and the rational distance type used for exact
//! thickness comparisons.

mod edist;
mod point;
mod vector;

pub use edist::EDist;
pub use point::Pt2i;
pub use vector::Vr2i;
