//! Centering force.
//!
//! Translates every free node by the same offset so the centroid of the free
//! nodes moves toward the target point. Relative positions are untouched, so
//! the force does not fight local motion. Alpha does not scale it.

use super::{Deltas, Force};
use crate::config::SimulationConfig;
use crate::error::ForceError;
use crate::graph::GraphView;

/// Centering force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterForce {
    /// Target X.
    pub x: f32,
    /// Target Y.
    pub y: f32,
    /// Fraction of the centroid offset corrected per tick.
    pub strength: f32,
}

impl CenterForce {
    /// Center on `(x, y)` at full strength.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, strength: 1.0 }
    }

    /// Centering force from `centerX`, `centerY` and `centerStrength`.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            x: config.center_x,
            y: config.center_y,
            strength: config.center_strength,
        }
    }
}

impl Default for CenterForce {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Force for CenterForce {
    fn apply(&self, view: &GraphView<'_>, _alpha: f32, deltas: &mut Deltas) -> Result<(), ForceError> {
        let mut sum_x = 0.0_f32;
        let mut sum_y = 0.0_f32;
        let mut count = 0_usize;
        for slot in view.slots().filter(|&slot| !view.pin(slot).is_pinned()) {
            let p = view.position(slot);
            sum_x += p.x;
            sum_y += p.y;
            count += 1;
        }
        if count == 0 {
            return Ok(());
        }

        let n = count as f32;
        let shift_x = (self.x - sum_x / n) * self.strength;
        let shift_y = (self.y - sum_y / n) * self.strength;
        for slot in view.slots().filter(|&slot| !view.pin(slot).is_pinned()) {
            deltas.add_displacement(slot, shift_x, shift_y);
        }
        Ok(())
    }
}
