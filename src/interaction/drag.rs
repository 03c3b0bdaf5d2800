//! Drag controller.
//!
//! Each node is either free or dragging. A drag pins the node at its current
//! position, moves the pin with the pointer, and on release leaves the node
//! at the last pointer position, free again. The first active drag reheats
//! the simulation; releasing the last one lets it cool.

use std::collections::HashMap;

use log::debug;

use crate::error::{LayoutError, LayoutResult};
use crate::graph::{NodeId, Point};
use crate::simulation::Simulation;
use crate::spatial::SpatialIndex;

/// Drag state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    /// Subject to forces.
    Free,
    /// Pinned under the pointer.
    Dragging,
}

/// One active drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Node position when the drag began.
    pub origin: Point,
    /// Last pointer position reported for this drag.
    pub pointer: Point,
}

/// Tracks drag sessions and applies them to a [`Simulation`].
#[derive(Default)]
pub struct DragController {
    sessions: HashMap<NodeId, DragSession>,
    spatial: SpatialIndex,
    /// (tick count, graph revision) the spatial index was built from.
    indexed_at: Option<(u64, u64)>,
}

impl DragController {
    /// Controller with no active drags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drag state of a node.
    pub fn state(&self, id: &str) -> DragState {
        if self.sessions.contains_key(id) {
            DragState::Dragging
        } else {
            DragState::Free
        }
    }

    /// True while the node is being dragged.
    pub fn is_dragging(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// The node's drag session, if any.
    pub fn session(&self, id: &str) -> Option<&DragSession> {
        self.sessions.get(id)
    }

    /// Number of active drags.
    pub fn active_drags(&self) -> usize {
        self.sessions.len()
    }

    /// Start dragging a node.
    ///
    /// The node is pinned where it currently is; `(x, y)` is recorded as the
    /// pointer position. Starting a drag on a node that is already being
    /// dragged reuses the existing session.
    pub fn begin_drag(&mut self, sim: &mut Simulation, id: &str, x: f32, y: f32) -> LayoutResult<()> {
        self.prune(sim);
        let origin = sim
            .graph()
            .position(id)
            .ok_or_else(|| LayoutError::UnknownNode(NodeId::from(id)))?;
        check_pointer(x, y)?;
        if self.sessions.contains_key(id) {
            return Ok(());
        }

        sim.graph_mut().pin(id, origin.x, origin.y)?;
        self.sessions.insert(
            NodeId::from(id),
            DragSession {
                origin,
                pointer: Point::new(x, y),
            },
        );
        debug!("drag started on {} at ({}, {})", id, origin.x, origin.y);

        if self.sessions.len() == 1 {
            let target = sim.config().drag_alpha_target;
            sim.reheat(target)?;
        }
        Ok(())
    }

    /// Move the pin of a dragged node to the pointer.
    ///
    /// Does nothing for nodes that are not being dragged.
    pub fn update_drag(&mut self, sim: &mut Simulation, id: &str, x: f32, y: f32) -> LayoutResult<()> {
        self.prune(sim);
        if !sim.graph().contains(id) {
            return Err(LayoutError::UnknownNode(NodeId::from(id)));
        }
        check_pointer(x, y)?;
        let Some(session) = self.sessions.get_mut(id) else {
            return Ok(());
        };

        session.pointer = Point::new(x, y);
        sim.graph_mut().pin(id, x, y)
    }

    /// Release a dragged node at its last pin target.
    ///
    /// Does nothing for nodes that are not being dragged.
    pub fn end_drag(&mut self, sim: &mut Simulation, id: &str) -> LayoutResult<()> {
        self.prune(sim);
        let pin = sim
            .graph()
            .pin_of(id)
            .ok_or_else(|| LayoutError::UnknownNode(NodeId::from(id)))?;
        if self.sessions.remove(id).is_none() {
            return Ok(());
        }

        if let (Some(fx), Some(fy)) = (pin.fx, pin.fy) {
            sim.graph_mut().settle(id, fx, fy)?;
        }
        sim.graph_mut().unpin(id)?;
        debug!("drag ended on {}", id);

        if self.sessions.is_empty() {
            sim.cool();
        }
        Ok(())
    }

    /// Find the node nearest to `(x, y)` within `radius`.
    pub fn pick(&mut self, sim: &Simulation, x: f32, y: f32, radius: f32) -> Option<NodeId> {
        self.refresh_index(sim);
        self.spatial.nearest_within(x, y, radius).cloned()
    }

    /// All nodes within `radius` of `(x, y)`.
    pub fn nodes_near(&mut self, sim: &Simulation, x: f32, y: f32, radius: f32) -> Vec<NodeId> {
        self.refresh_index(sim);
        self.spatial.in_radius(x, y, radius).into_iter().cloned().collect()
    }

    fn refresh_index(&mut self, sim: &Simulation) {
        let key = (sim.ticks(), sim.graph().revision());
        if self.indexed_at != Some(key) {
            self.spatial
                .rebuild(sim.graph().positions().map(|(id, p)| (id, p.x, p.y)));
            self.indexed_at = Some(key);
        }
    }

    /// Remove a node from the graph, ending its drag if it has one.
    ///
    /// Returns false if the node did not exist.
    pub fn remove_node(&mut self, sim: &mut Simulation, id: &str) -> bool {
        let removed = sim.graph_mut().remove_node(id);
        self.prune(sim);
        removed
    }

    /// Drop sessions whose node has been removed from the graph.
    ///
    /// Cools the simulation when that leaves no drag active. Call this after
    /// removing nodes through [`Simulation::graph_mut`] directly.
    pub fn prune(&mut self, sim: &mut Simulation) {
        if self.sessions.is_empty() {
            return;
        }
        let graph = sim.graph();
        self.sessions.retain(|id, _| graph.contains(id.as_str()));
        if self.sessions.is_empty() {
            debug!("last dragged node removed");
            sim.cool();
        }
    }
}

fn check_pointer(x: f32, y: f32) -> LayoutResult<()> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(LayoutError::invalid("pointer", "coordinates must be finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::force::ForceRegistry;
    use crate::graph::{Graph, Pin};
    use crate::simulation::SimulationState;

    fn sim_with(nodes: &[(&str, f32, f32)]) -> Simulation {
        let mut graph = Graph::new();
        for &(id, x, y) in nodes {
            graph.add_node_at(id, x, y).unwrap();
        }
        Simulation::with_forces(graph, SimulationConfig::default(), ForceRegistry::new()).unwrap()
    }

    #[test]
    fn test_begin_drag_pins_current_position_and_reheats() {
        let mut sim = sim_with(&[("a", 3.0, 4.0)]);
        let mut drag = DragController::new();

        drag.begin_drag(&mut sim, "a", 10.0, 10.0).unwrap();

        assert_eq!(drag.state("a"), DragState::Dragging);
        assert_eq!(sim.graph().pin_of("a"), Some(Pin::at(3.0, 4.0)));
        assert_eq!(sim.alpha_target(), 0.3);
        assert_eq!(sim.state(), SimulationState::Running);
        assert_eq!(drag.session("a").unwrap().pointer, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_begin_drag_twice_reuses_session() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut drag = DragController::new();

        drag.begin_drag(&mut sim, "a", 0.0, 0.0).unwrap();
        drag.update_drag(&mut sim, "a", 5.0, 5.0).unwrap();
        drag.begin_drag(&mut sim, "a", 9.0, 9.0).unwrap();

        assert_eq!(drag.active_drags(), 1);
        assert_eq!(sim.graph().pin_of("a"), Some(Pin::at(5.0, 5.0)));
    }

    #[test]
    fn test_update_moves_pin_not_velocity() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut drag = DragController::new();

        drag.begin_drag(&mut sim, "a", 0.0, 0.0).unwrap();
        drag.update_drag(&mut sim, "a", 42.0, -7.0).unwrap();

        let node = sim.graph().node("a").unwrap();
        assert_eq!(node.pin, Pin::at(42.0, -7.0));
        assert_eq!(node.velocity, Point::default());

        sim.tick().unwrap();
        assert_eq!(sim.graph().position("a"), Some(Point::new(42.0, -7.0)));
    }

    #[test]
    fn test_end_drag_frees_node_at_last_pointer() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut drag = DragController::new();

        drag.begin_drag(&mut sim, "a", 0.0, 0.0).unwrap();
        drag.update_drag(&mut sim, "a", 50.0, 60.0).unwrap();
        drag.end_drag(&mut sim, "a").unwrap();

        assert_eq!(drag.state("a"), DragState::Free);
        assert!(!sim.graph().pin_of("a").unwrap().is_pinned());
        assert_eq!(sim.graph().position("a"), Some(Point::new(50.0, 60.0)));
        assert_eq!(sim.alpha_target(), 0.0);
    }

    #[test]
    fn test_cool_waits_for_last_drag() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 1.0, 1.0)]);
        let mut drag = DragController::new();

        drag.begin_drag(&mut sim, "a", 0.0, 0.0).unwrap();
        drag.begin_drag(&mut sim, "b", 1.0, 1.0).unwrap();
        drag.end_drag(&mut sim, "a").unwrap();
        assert_eq!(sim.alpha_target(), 0.3);

        drag.end_drag(&mut sim, "b").unwrap();
        assert_eq!(sim.alpha_target(), 0.0);
    }

    #[test]
    fn test_unknown_node_errors() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut drag = DragController::new();

        assert!(matches!(
            drag.begin_drag(&mut sim, "zz", 0.0, 0.0),
            Err(LayoutError::UnknownNode(_))
        ));
        assert!(matches!(
            drag.update_drag(&mut sim, "zz", 0.0, 0.0),
            Err(LayoutError::UnknownNode(_))
        ));
        assert!(matches!(drag.end_drag(&mut sim, "zz"), Err(LayoutError::UnknownNode(_))));
        assert_eq!(drag.active_drags(), 0);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_update_and_end_without_session_are_noops() {
        let mut sim = sim_with(&[("a", 1.0, 1.0)]);
        let mut drag = DragController::new();

        drag.update_drag(&mut sim, "a", 9.0, 9.0).unwrap();
        drag.end_drag(&mut sim, "a").unwrap();
        assert!(!sim.graph().pin_of("a").unwrap().is_pinned());
        assert_eq!(sim.graph().position("a"), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_removed_node_session_is_dropped() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 5.0, 5.0)]);
        let mut drag = DragController::new();

        drag.begin_drag(&mut sim, "a", 0.0, 0.0).unwrap();
        sim.graph_mut().remove_node("a");

        drag.begin_drag(&mut sim, "b", 5.0, 5.0).unwrap();
        assert_eq!(drag.active_drags(), 1);
        assert!(!drag.is_dragging("a"));
    }

    #[test]
    fn test_removing_dragged_node_lets_layout_converge() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 5.0, 5.0)]);
        let mut drag = DragController::new();

        drag.begin_drag(&mut sim, "a", 0.0, 0.0).unwrap();
        assert!(drag.remove_node(&mut sim, "a"));

        assert_eq!(drag.active_drags(), 0);
        assert_eq!(sim.alpha_target(), 0.0);
        assert!(sim.run(5000).unwrap() < 5000);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_prune_after_direct_removal_cools() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 5.0, 5.0)]);
        let mut drag = DragController::new();

        drag.begin_drag(&mut sim, "a", 0.0, 0.0).unwrap();
        drag.begin_drag(&mut sim, "b", 5.0, 5.0).unwrap();
        sim.graph_mut().remove_node("a");
        drag.prune(&mut sim);
        assert_eq!(drag.active_drags(), 1);
        assert_eq!(sim.alpha_target(), 0.3);

        sim.graph_mut().remove_node("b");
        drag.prune(&mut sim);
        assert_eq!(drag.active_drags(), 0);
        assert_eq!(sim.alpha_target(), 0.0);
    }

    #[test]
    fn test_pick_tracks_positions() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 100.0, 0.0)]);
        let mut drag = DragController::new();

        assert_eq!(drag.pick(&sim, 98.0, 1.0, 5.0).as_ref().map(NodeId::as_str), Some("b"));
        assert_eq!(drag.pick(&sim, 50.0, 0.0, 5.0), None);

        sim.graph_mut().set_position("a", 50.0, 0.0).unwrap();
        assert_eq!(drag.pick(&sim, 50.0, 0.0, 5.0).as_ref().map(NodeId::as_str), Some("a"));
        assert_eq!(drag.nodes_near(&sim, 75.0, 0.0, 30.0).len(), 2);
    }
}
