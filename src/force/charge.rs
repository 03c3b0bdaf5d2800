//! Many-body charge force.
//!
//! Every pair of nodes exchanges a velocity delta along their separation,
//! scaled by `strength * alpha / distance²`. Negative strength repels.
//!
//! Small graphs are evaluated exactly in O(n²). Larger graphs use a
//! Barnes-Hut quadtree: a cell of width `w` whose centroid is at squared
//! distance `l` is treated as a single body when `w² / theta² < l`, giving
//! roughly O(n log n) per tick.

use super::quadtree::{CellKind, QuadTree};
use super::{Deltas, Force, JIGGLE, pair_jiggle};
use crate::config::SimulationConfig;
use crate::error::ForceError;
use crate::graph::{GraphView, Point};

/// Graphs with more nodes than this use the Barnes-Hut approximation.
pub const BARNES_HUT_MIN_NODES: usize = 64;

/// Charge (repulsion / attraction) force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeForce {
    /// Per-node strength; negative repels.
    pub strength: f32,
    /// Barnes-Hut accuracy. Zero forces exact evaluation.
    pub theta: f32,
    /// Separations below this are clamped.
    pub distance_min: f32,
    /// Pairs farther apart than this ignore each other.
    pub distance_max: f32,
    /// Node count above which the quadtree is used.
    pub approximate_above: usize,
}

impl ChargeForce {
    /// Charge force with the given strength and default limits.
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            ..Self::default()
        }
    }

    /// Charge force from `chargeStrength`, `chargeTheta` and the distance limits.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            strength: config.charge_strength,
            theta: config.charge_theta,
            distance_min: config.charge_distance_min,
            distance_max: config.charge_distance_max,
            approximate_above: BARNES_HUT_MIN_NODES,
        }
    }

    /// Override the node count above which the quadtree is used.
    pub fn approximate_above(mut self, nodes: usize) -> Self {
        self.approximate_above = nodes;
        self
    }

    fn exact(&self, view: &GraphView<'_>, slots: &[usize], limits: Limits, deltas: &mut Deltas) {
        for (a, &i) in slots.iter().enumerate() {
            let pi = view.position(i);
            for &j in &slots[a + 1..] {
                let pj = view.position(j);
                let Some((dx, dy, l)) = separation(i, pi, j, pj, limits) else {
                    continue;
                };
                let w = limits.scale / l;
                deltas.add_velocity(i, dx * w, dy * w);
                deltas.add_velocity(j, -dx * w, -dy * w);
            }
        }
    }

    fn approximate(&self, view: &GraphView<'_>, slots: &[usize], limits: Limits, deltas: &mut Deltas) {
        let points = slots.iter().map(|&i| (i, view.position(i))).collect();
        let tree = QuadTree::build(points);
        let Some(root) = tree.root() else {
            return;
        };

        let theta_sq = self.theta * self.theta;
        let mut stack = Vec::new();
        for &i in slots {
            let p = view.position(i);
            stack.clear();
            stack.push(root);

            while let Some(index) = stack.pop() {
                let cell = tree.cell(index);
                match &cell.kind {
                    CellKind::Branch(children) => {
                        let dx = cell.centroid.x - p.x;
                        let dy = cell.centroid.y - p.y;
                        let l = dx * dx + dy * dy;
                        if !cell.contains(p) && cell.size * cell.size / theta_sq < l {
                            if l < limits.max_sq {
                                let l = limits.clamp(l);
                                let w = limits.scale * cell.count as f32 / l;
                                deltas.add_velocity(i, dx * w, dy * w);
                            }
                            continue;
                        }
                        stack.extend(children.iter().flatten());
                    }
                    CellKind::Leaf(members) => {
                        for &j in members {
                            if j == i {
                                continue;
                            }
                            let Some((dx, dy, l)) = separation(i, p, j, view.position(j), limits) else {
                                continue;
                            };
                            let w = limits.scale / l;
                            deltas.add_velocity(i, dx * w, dy * w);
                        }
                    }
                }
            }
        }
    }
}

impl Default for ChargeForce {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

impl Force for ChargeForce {
    fn apply(&self, view: &GraphView<'_>, alpha: f32, deltas: &mut Deltas) -> Result<(), ForceError> {
        if self.strength == 0.0 {
            return Ok(());
        }

        let limits = Limits {
            scale: self.strength * alpha,
            min_sq: self.distance_min * self.distance_min,
            max_sq: self.distance_max * self.distance_max,
        };
        let slots: Vec<usize> = view.slots().collect();
        if self.theta > 0.0 && slots.len() > self.approximate_above {
            self.approximate(view, &slots, limits, deltas);
        } else {
            self.exact(view, &slots, limits, deltas);
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
struct Limits {
    scale: f32,
    min_sq: f32,
    max_sq: f32,
}

impl Limits {
    #[inline]
    fn clamp(self, l: f32) -> f32 {
        if l < self.min_sq { (self.min_sq * l).sqrt() } else { l }
    }
}

/// Separation vector from node `i` to node `j` and its clamped squared
/// length, or None when the pair is out of range.
#[inline]
fn separation(i: usize, pi: Point, j: usize, pj: Point, limits: Limits) -> Option<(f32, f32, f32)> {
    let mut dx = pj.x - pi.x;
    let mut dy = pj.y - pi.y;
    let mut l = dx * dx + dy * dy;
    if l < JIGGLE * JIGGLE {
        (dx, dy) = pair_jiggle(i, j);
        l = dx * dx + dy * dy;
    }
    if l >= limits.max_sq {
        return None;
    }
    Some((dx, dy, limits.clamp(l)))
}
