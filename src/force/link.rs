//! Spring force along edges.
//!
//! Each edge pulls or pushes its endpoints toward the edge's rest length.
//! The correction is `stiffness * alpha * (d - rest) / d` along the separation
//! vector, split between the endpoints by their (unit) masses.

use super::{Deltas, Force, JIGGLE, jiggle};
use crate::config::SimulationConfig;
use crate::error::ForceError;
use crate::graph::GraphView;

/// Share of the correction taken by the target node. With unit masses the
/// correction is split evenly.
const TARGET_SHARE: f32 = 0.5;

/// Link (spring) force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkForce {
    /// Rest length for edges without their own.
    pub distance: f32,
    /// Stiffness for edges without their own.
    pub stiffness: f32,
}

impl LinkForce {
    /// Create a link force with default edge parameters.
    pub fn new(distance: f32, stiffness: f32) -> Self {
        Self { distance, stiffness }
    }

    /// Link force using `linkDistance` and `linkStiffness`.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.link_distance, config.link_stiffness)
    }
}

impl Default for LinkForce {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

impl Force for LinkForce {
    fn apply(&self, view: &GraphView<'_>, alpha: f32, deltas: &mut Deltas) -> Result<(), ForceError> {
        for (ordinal, link) in view.links().enumerate() {
            let source = view.position(link.source);
            let target = view.position(link.target);

            let mut dx = target.x - source.x;
            let mut dy = target.y - source.y;
            let mut distance_sq = dx * dx + dy * dy;
            if distance_sq < JIGGLE * JIGGLE {
                (dx, dy) = jiggle(ordinal);
                distance_sq = dx * dx + dy * dy;
            }
            let distance = distance_sq.sqrt();

            let rest = link.params.distance.unwrap_or(self.distance);
            let stiffness = link.params.stiffness.unwrap_or(self.stiffness);
            let k = stiffness * alpha * (distance - rest) / distance;

            let fx = dx * k;
            let fy = dy * k;
            deltas.add_velocity(link.source, fx * (1.0 - TARGET_SHARE), fy * (1.0 - TARGET_SHARE));
            deltas.add_velocity(link.target, -fx * TARGET_SHARE, -fy * TARGET_SHARE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, LinkParams, Point};

    fn pair(ax: f32, ay: f32, bx: f32, by: f32, params: LinkParams) -> Graph {
        let mut graph = Graph::new();
        graph.add_node_at("a", ax, ay).unwrap();
        graph.add_node_at("b", bx, by).unwrap();
        graph.add_edge("a", "b", params).unwrap();
        graph
    }

    fn run(graph: &Graph, force: &LinkForce, alpha: f32) -> Deltas {
        let view = graph.view();
        let mut deltas = Deltas::new(view.slot_bound());
        force.apply(&view, alpha, &mut deltas).unwrap();
        deltas
    }

    #[test]
    fn test_at_rest_length_contributes_nothing() {
        let graph = pair(0.0, 0.0, 30.0, 40.0, LinkParams::default().distance(50.0));
        let deltas = run(&graph, &LinkForce::default(), 1.0);
        assert_eq!(deltas.velocity(0), Point::default());
        assert_eq!(deltas.velocity(1), Point::default());
    }

    #[test]
    fn test_stretched_edge_pulls_endpoints_together() {
        let graph = pair(0.0, 0.0, 200.0, 0.0, LinkParams::default().distance(100.0));
        let deltas = run(&graph, &LinkForce::new(30.0, 1.0), 1.0);

        // (200 - 100) / 200 * 200 = 100, split evenly
        assert!((deltas.velocity(0).x - 50.0).abs() < 1e-4);
        assert!((deltas.velocity(1).x + 50.0).abs() < 1e-4);
        assert_eq!(deltas.velocity(0).y, 0.0);
    }

    #[test]
    fn test_alpha_and_stiffness_scale_correction() {
        let graph = pair(0.0, 0.0, 200.0, 0.0, LinkParams::default().distance(100.0).stiffness(0.5));
        let deltas = run(&graph, &LinkForce::default(), 0.5);
        assert!((deltas.velocity(0).x - 12.5).abs() < 1e-4);
    }

    #[test]
    fn test_default_distance_used_when_edge_has_none() {
        let graph = pair(0.0, 0.0, 10.0, 0.0, LinkParams::default());
        let deltas = run(&graph, &LinkForce::new(10.0, 1.0), 1.0);
        assert_eq!(deltas.velocity(0), Point::default());
    }

    #[test]
    fn test_coincident_endpoints_separate() {
        let graph = pair(0.0, 0.0, 0.0, 0.0, LinkParams::default().distance(100.0));
        let deltas = run(&graph, &LinkForce::default(), 1.0);

        let a = deltas.velocity(0);
        let b = deltas.velocity(1);
        assert!(a.x.is_finite() && a.y.is_finite());
        assert!((a.x + b.x).abs() < 1e-3 && (a.y + b.y).abs() < 1e-3);
        let push = (a.x * a.x + a.y * a.y).sqrt();
        assert!((push - 50.0).abs() < 1e-2, "push was {push}");
    }
}
