//! Graph - node arena and edge topology.
//!
//! The Graph stores the topology using petgraph's StableGraph and keeps
//! positions, velocities and pins in SoA (Structure of Arrays) buffers indexed
//! by the petgraph slot. StableGraph keeps slots stable across removals, so
//! iteration order is deterministic and forces can address nodes by slot.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences, NodeIndexable};
use petgraph::{Directed, Direction};
use std::collections::HashMap;

use super::edge::{EdgeId, EdgeSpec, LinkParams};
use super::node::{NodeId, NodeView, Pin, Point};
use crate::error::{LayoutError, LayoutResult};

fn check_finite(field: &'static str, x: f32, y: f32) -> LayoutResult<()> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(LayoutError::invalid(field, "must be finite"))
    }
}

/// Radius step of the initial phyllotaxis placement.
const INITIAL_RADIUS: f32 = 10.0;

/// Golden angle, used to spread automatically placed nodes.
pub(crate) const GOLDEN_ANGLE: f32 = std::f32::consts::PI * 0.763_932; // PI * (3 - sqrt(5))

/// The layout graph.
///
/// This struct manages:
/// - Graph topology via petgraph
/// - Position/velocity/pin buffers in SoA layout
/// - ID mapping between caller ids and internal slots
pub struct Graph {
    /// Nodes store their id, edges store their link parameters.
    graph: StableGraph<NodeId, LinkParams, Directed>,

    /// Map from NodeId to petgraph NodeIndex
    node_id_to_index: HashMap<NodeId, NodeIndex>,

    /// Map from stable EdgeId to petgraph EdgeIndex
    edge_id_to_index: HashMap<EdgeId, EdgeIndex>,

    /// Reverse map from petgraph EdgeIndex to stable EdgeId
    edge_index_to_id: HashMap<EdgeIndex, EdgeId>,

    /// Next edge ID to assign
    next_edge_id: u32,

    /// Nodes placed on the phyllotaxis spiral so far
    placed: u32,

    /// Bumped on every structural or positional change made outside a tick
    revision: u64,

    pos_x: Vec<f32>,
    pos_y: Vec<f32>,
    vel_x: Vec<f32>,
    vel_y: Vec<f32>,
    pin_x: Vec<Option<f32>>,
    pin_y: Vec<Option<f32>>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, edge_capacity),
            node_id_to_index: HashMap::with_capacity(node_capacity),
            edge_id_to_index: HashMap::with_capacity(edge_capacity),
            edge_index_to_id: HashMap::with_capacity(edge_capacity),
            next_edge_id: 0,
            placed: 0,
            revision: 0,
            pos_x: Vec::with_capacity(node_capacity),
            pos_y: Vec::with_capacity(node_capacity),
            vel_x: Vec::with_capacity(node_capacity),
            vel_y: Vec::with_capacity(node_capacity),
            pin_x: Vec::with_capacity(node_capacity),
            pin_y: Vec::with_capacity(node_capacity),
        }
    }

    /// Build a whole graph from node ids and edge descriptions.
    ///
    /// Fails on the first duplicate id, unknown endpoint or invalid edge
    /// parameter; no partially built graph is returned.
    pub fn from_parts<I, N, E>(nodes: I, edges: E) -> LayoutResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
        E: IntoIterator<Item = EdgeSpec>,
    {
        let mut graph = Self::new();
        for id in nodes {
            graph.add_node(id)?;
        }
        for edge in edges {
            graph.add_edge(&edge.source, &edge.target, edge.params)?;
        }
        Ok(graph)
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node, placing it on a phyllotaxis spiral around the origin.
    pub fn add_node(&mut self, id: impl Into<NodeId>) -> LayoutResult<()> {
        let i = self.placed as f32;
        let radius = INITIAL_RADIUS * (0.5 + i).sqrt();
        let angle = i * GOLDEN_ANGLE;
        self.insert_node(id.into(), radius * angle.cos(), radius * angle.sin())?;
        self.placed += 1;
        Ok(())
    }

    /// Add a node at the specified position.
    pub fn add_node_at(&mut self, id: impl Into<NodeId>, x: f32, y: f32) -> LayoutResult<()> {
        check_finite("position", x, y)?;
        self.insert_node(id.into(), x, y)
    }

    fn insert_node(&mut self, id: NodeId, x: f32, y: f32) -> LayoutResult<()> {
        if self.node_id_to_index.contains_key(&id) {
            return Err(LayoutError::DuplicateId(id));
        }

        let index = self.graph.add_node(id.clone());
        self.node_id_to_index.insert(id, index);

        // StableGraph hands out either a fresh slot or a vacated one.
        let i = index.index();
        if i == self.pos_x.len() {
            self.pos_x.push(x);
            self.pos_y.push(y);
            self.vel_x.push(0.0);
            self.vel_y.push(0.0);
            self.pin_x.push(None);
            self.pin_y.push(None);
        } else {
            self.pos_x[i] = x;
            self.pos_y[i] = y;
            self.vel_x[i] = 0.0;
            self.vel_y[i] = 0.0;
            self.pin_x[i] = None;
            self.pin_y[i] = None;
        }

        self.revision += 1;
        Ok(())
    }

    /// Remove a node and all its connected edges.
    ///
    /// Returns false if the node did not exist.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(index) = self.node_id_to_index.remove(id) else {
            return false;
        };

        let edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        for edge_index in edges {
            if let Some(edge_id) = self.edge_index_to_id.remove(&edge_index) {
                self.edge_id_to_index.remove(&edge_id);
            }
        }

        // Zero out the removed node's slot
        let i = index.index();
        self.pos_x[i] = 0.0;
        self.pos_y[i] = 0.0;
        self.vel_x[i] = 0.0;
        self.vel_y[i] = 0.0;
        self.pin_x[i] = None;
        self.pin_y[i] = None;

        self.graph.remove_node(index);
        self.revision += 1;
        true
    }

    /// Check whether a node exists.
    pub fn contains(&self, id: &str) -> bool {
        self.node_id_to_index.contains_key(id)
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get a read-only view of a node.
    pub fn node(&self, id: &str) -> Option<NodeView<'_>> {
        let index = *self.node_id_to_index.get(id)?;
        let i = index.index();
        Some(NodeView {
            id: &self.graph[index],
            position: Point::new(self.pos_x[i], self.pos_y[i]),
            velocity: Point::new(self.vel_x[i], self.vel_y[i]),
            pin: Pin {
                fx: self.pin_x[i],
                fy: self.pin_y[i],
            },
        })
    }

    /// Node ids in slot order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.graph.node_indices().map(move |index| &self.graph[index])
    }

    /// Get a node's position.
    pub fn position(&self, id: &str) -> Option<Point> {
        self.node(id).map(|node| node.position)
    }

    /// All node positions in slot order.
    pub fn positions(&self) -> impl Iterator<Item = (&NodeId, Point)> + '_ {
        self.graph.node_indices().map(move |index| {
            let i = index.index();
            (&self.graph[index], Point::new(self.pos_x[i], self.pos_y[i]))
        })
    }

    /// Set a node's position, keeping its velocity.
    pub fn set_position(&mut self, id: &str, x: f32, y: f32) -> LayoutResult<()> {
        let i = self.slot_of(id)?;
        check_finite("position", x, y)?;
        self.pos_x[i] = x;
        self.pos_y[i] = y;
        self.revision += 1;
        Ok(())
    }

    /// Move a node and bring it to rest.
    ///
    /// Besides the pin accessors, this is the only graph mutation the drag
    /// controller performs: releasing a drag settles the node at its pin.
    pub fn settle(&mut self, id: &str, x: f32, y: f32) -> LayoutResult<()> {
        let i = self.slot_of(id)?;
        check_finite("position", x, y)?;
        self.pos_x[i] = x;
        self.pos_y[i] = y;
        self.vel_x[i] = 0.0;
        self.vel_y[i] = 0.0;
        self.revision += 1;
        Ok(())
    }

    /// Pin a node on both axes.
    pub fn pin(&mut self, id: &str, fx: f32, fy: f32) -> LayoutResult<()> {
        self.set_pin(id, Pin::at(fx, fy))
    }

    /// Replace a node's pin, allowing single-axis pins.
    pub fn set_pin(&mut self, id: &str, pin: Pin) -> LayoutResult<()> {
        let i = self.slot_of(id)?;
        if pin.fx.is_some_and(|v| !v.is_finite()) || pin.fy.is_some_and(|v| !v.is_finite()) {
            return Err(LayoutError::invalid("pin", "must be finite"));
        }
        self.pin_x[i] = pin.fx;
        self.pin_y[i] = pin.fy;
        self.revision += 1;
        Ok(())
    }

    /// Release a node's pin on both axes.
    pub fn unpin(&mut self, id: &str) -> LayoutResult<()> {
        self.set_pin(id, Pin::default())
    }

    /// Get a node's pin state.
    pub fn pin_of(&self, id: &str) -> Option<Pin> {
        self.node(id).map(|node| node.pin)
    }

    fn slot_of(&self, id: &str) -> LayoutResult<usize> {
        self.node_id_to_index
            .get(id)
            .map(|index| index.index())
            .ok_or_else(|| LayoutError::UnknownNode(NodeId::from(id)))
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add an edge between two existing nodes.
    pub fn add_edge(&mut self, source: &str, target: &str, params: LinkParams) -> LayoutResult<EdgeId> {
        let source_index = *self
            .node_id_to_index
            .get(source)
            .ok_or_else(|| LayoutError::UnknownNode(NodeId::from(source)))?;
        let target_index = *self
            .node_id_to_index
            .get(target)
            .ok_or_else(|| LayoutError::UnknownNode(NodeId::from(target)))?;
        params.validate()?;

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;

        let index = self.graph.add_edge(source_index, target_index, params);
        self.edge_id_to_index.insert(id, index);
        self.edge_index_to_id.insert(index, id);
        self.revision += 1;

        Ok(id)
    }

    /// Remove an edge.
    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        if let Some(index) = self.edge_id_to_index.remove(&id) {
            self.edge_index_to_id.remove(&index);
            self.graph.remove_edge(index);
            self.revision += 1;
            true
        } else {
            false
        }
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get an edge's endpoints and parameters.
    pub fn edge(&self, id: EdgeId) -> Option<(&NodeId, &NodeId, LinkParams)> {
        let index = *self.edge_id_to_index.get(&id)?;
        let (source, target) = self.graph.edge_endpoints(index)?;
        Some((&self.graph[source], &self.graph[target], self.graph[index]))
    }

    /// Get neighbors of a node in either direction.
    pub fn neighbors(&self, id: &str) -> Vec<&NodeId> {
        self.node_id_to_index
            .get(id)
            .map(|&index| {
                self.graph
                    .neighbors_undirected(index)
                    .map(|n| &self.graph[n])
                    .collect()
            })
            .unwrap_or_default()
    }

    // =========================================================================
    // Simulation Access
    // =========================================================================

    /// Read-only view handed to forces.
    pub fn view(&self) -> GraphView<'_> {
        GraphView { graph: self }
    }

    /// Change counter for caches keyed on graph contents.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Upper bound on slot indices (max slot + 1).
    pub(crate) fn slot_bound(&self) -> usize {
        self.graph.node_bound()
    }

    /// Apply accumulated deltas to every axis that is not pinned.
    pub(crate) fn integrate(&mut self, velocity: (&[f32], &[f32]), displacement: (&[f32], &[f32]), retention: f32) {
        for index in self.graph.node_indices() {
            let i = index.index();
            if self.pin_x[i].is_none() {
                self.vel_x[i] = (self.vel_x[i] + velocity.0[i]) * retention;
                self.pos_x[i] += self.vel_x[i] + displacement.0[i];
            }
            if self.pin_y[i].is_none() {
                self.vel_y[i] = (self.vel_y[i] + velocity.1[i]) * retention;
                self.pos_y[i] += self.vel_y[i] + displacement.1[i];
            }
        }
    }

    /// Snap pinned axes to their targets and zero their velocity.
    pub(crate) fn apply_pins(&mut self) {
        for index in self.graph.node_indices() {
            let i = index.index();
            if let Some(fx) = self.pin_x[i] {
                self.pos_x[i] = fx;
                self.vel_x[i] = 0.0;
            }
            if let Some(fy) = self.pin_y[i] {
                self.pos_y[i] = fy;
                self.vel_y[i] = 0.0;
            }
        }
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Get the bounding box of all nodes as (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        if self.graph.node_count() == 0 {
            return None;
        }

        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for (_, p) in self.positions() {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        Some((min_x, min_y, max_x, max_y))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// An edge as seen by forces: endpoint slots plus its parameters.
#[derive(Debug, Clone, Copy)]
pub struct LinkRef {
    /// Slot of the source node.
    pub source: usize,
    /// Slot of the target node.
    pub target: usize,
    /// Per-edge parameters.
    pub params: LinkParams,
}

/// Read-only, slot-addressed view of the graph used by forces.
#[derive(Clone, Copy)]
pub struct GraphView<'a> {
    graph: &'a Graph,
}

impl<'a> GraphView<'a> {
    /// Live slots in deterministic order.
    pub fn slots(&self) -> impl Iterator<Item = usize> + 'a {
        let graph: &'a Graph = self.graph;
        graph.graph.node_indices().map(|index| index.index())
    }

    /// Upper bound on slot indices; size delta buffers with this.
    pub fn slot_bound(&self) -> usize {
        self.graph.slot_bound()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Id of the node in a slot.
    pub fn id(&self, slot: usize) -> &'a NodeId {
        let graph: &'a Graph = self.graph;
        &graph.graph[NodeIndex::new(slot)]
    }

    /// Position of the node in a slot.
    #[inline]
    pub fn position(&self, slot: usize) -> Point {
        Point::new(self.graph.pos_x[slot], self.graph.pos_y[slot])
    }

    /// Velocity of the node in a slot.
    #[inline]
    pub fn velocity(&self, slot: usize) -> Point {
        Point::new(self.graph.vel_x[slot], self.graph.vel_y[slot])
    }

    /// Pin state of the node in a slot.
    #[inline]
    pub fn pin(&self, slot: usize) -> Pin {
        Pin {
            fx: self.graph.pin_x[slot],
            fy: self.graph.pin_y[slot],
        }
    }

    /// All edges in deterministic order.
    pub fn links(&self) -> impl Iterator<Item = LinkRef> + 'a {
        let graph: &'a Graph = self.graph;
        graph.graph.edge_references().map(|edge| LinkRef {
            source: edge.source().index(),
            target: edge.target().index(),
            params: *edge.weight(),
        })
    }
}
