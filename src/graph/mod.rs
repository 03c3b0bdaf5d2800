//! Graph data structures and operations.
//!
//! This module provides the layout graph using petgraph's StableGraph for
//! stable node/edge indices, with Structure of Arrays (SoA) layout for
//! positions, velocities and pins.

mod edge;
mod node;
mod store;

pub use edge::{EdgeId, EdgeSpec, LinkParams};
pub use node::{NodeId, NodeView, Pin, Point};
pub use store::{Graph, GraphView, LinkRef};

pub(crate) use store::GOLDEN_ANGLE;
