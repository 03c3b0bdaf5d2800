//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree based spatial index used to find the node
//! under a pointer before a drag begins.

mod rtree;

pub use rtree::SpatialIndex;
