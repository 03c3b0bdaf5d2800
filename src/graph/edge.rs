//! Edge identity and link parameters.
//!
//! Edges connect two nodes. Each edge has:
//! - A stable unique identifier
//! - Source and target node IDs
//! - Optional rest length and stiffness for the link force

use std::fmt;

use crate::config::non_negative;
use crate::error::LayoutResult;

/// Stable edge identifier.
///
/// This ID remains valid even after other edges are removed from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Create a new EdgeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({})", self.0)
    }
}

/// Per-edge link parameters.
///
/// Unset values fall back to the simulation's `linkDistance` and
/// `linkStiffness` when the link force runs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkParams {
    /// Rest length of the spring.
    pub distance: Option<f32>,
    /// Spring stiffness.
    pub stiffness: Option<f32>,
}

impl LinkParams {
    /// Set the rest length.
    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Set the stiffness.
    pub fn stiffness(mut self, stiffness: f32) -> Self {
        self.stiffness = Some(stiffness);
        self
    }

    pub(crate) fn validate(&self) -> LayoutResult<()> {
        if let Some(distance) = self.distance {
            non_negative("distance", distance)?;
        }
        if let Some(stiffness) = self.stiffness {
            non_negative("stiffness", stiffness)?;
        }
        Ok(())
    }
}

/// Edge description used when building a graph in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Link parameters.
    pub params: LinkParams,
}

impl EdgeSpec {
    /// Edge with default link parameters.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            params: LinkParams::default(),
        }
    }

    /// Replace the link parameters.
    pub fn with_params(mut self, params: LinkParams) -> Self {
        self.params = params;
        self
    }
}
