//! Node identity and per-node views.
//!
//! Nodes are the vertices in the graph. Each node has:
//! - A caller-chosen unique identifier (stable across ticks and removals)
//! - Position (x, y) in layout space
//! - Velocity (vx, vy) for force simulation
//! - An optional pin (fx, fy) that overrides the simulated position

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier.
///
/// Lookups accept `&str` directly since `NodeId` borrows as `str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new NodeId.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    #[inline]
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    #[inline]
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A 2-D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pin target for a node. Each axis is pinned independently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pin {
    /// Fixed X, if pinned on that axis.
    pub fx: Option<f32>,
    /// Fixed Y, if pinned on that axis.
    pub fy: Option<f32>,
}

impl Pin {
    /// Pin both axes.
    #[inline]
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            fx: Some(x),
            fy: Some(y),
        }
    }

    /// True when at least one axis is pinned.
    #[inline]
    pub fn is_pinned(self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}

/// Read-only snapshot of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeView<'a> {
    /// The node's id.
    pub id: &'a NodeId,
    /// Current position.
    pub position: Point,
    /// Current velocity.
    pub velocity: Point,
    /// Pin state.
    pub pin: Pin,
}
