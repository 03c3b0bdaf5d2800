//! Simulation configuration.
//!
//! A JavaScript host passes this as a plain object; every field is optional
//! and falls back to the defaults below. Names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};

/// Alpha decay that takes alpha from 1.0 to 0.001 in 300 ticks.
pub fn default_alpha_decay() -> f32 {
    1.0 - 0.001_f32.powf(1.0 / 300.0)
}

/// Tunable parameters of the force simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Rest length for edges that do not set their own (default: 30).
    pub link_distance: f32,
    /// Spring stiffness for edges that do not set their own (default: 1).
    pub link_stiffness: f32,
    /// Charge strength; negative repels, positive attracts (default: -30).
    pub charge_strength: f32,
    /// Barnes-Hut accuracy; 0 disables approximation (default: 0.9).
    pub charge_theta: f32,
    /// Distances below this are clamped when computing charge (default: 1).
    pub charge_distance_min: f32,
    /// Pairs farther apart than this ignore each other (default: infinity).
    pub charge_distance_max: f32,
    /// Centering target X (default: 0).
    pub center_x: f32,
    /// Centering target Y (default: 0).
    pub center_y: f32,
    /// Fraction of the centroid offset corrected per tick (default: 1).
    pub center_strength: f32,
    /// Rate at which alpha approaches alpha target (default: ~0.0228).
    pub alpha_decay: f32,
    /// The simulation stops once alpha falls below this (default: 0.001).
    pub alpha_min: f32,
    /// Fraction of velocity lost per tick (default: 0.4).
    pub velocity_decay: f32,
    /// Alpha target held while a node is being dragged (default: 0.3).
    pub drag_alpha_target: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            link_distance: 30.0,
            link_stiffness: 1.0,
            charge_strength: -30.0,
            charge_theta: 0.9,
            charge_distance_min: 1.0,
            charge_distance_max: f32::INFINITY,
            center_x: 0.0,
            center_y: 0.0,
            center_strength: 1.0,
            alpha_decay: default_alpha_decay(),
            alpha_min: 0.001,
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
        }
    }
}

impl SimulationConfig {
    /// Check every option, returning the first violation.
    pub fn validate(&self) -> LayoutResult<()> {
        non_negative("linkDistance", self.link_distance)?;
        non_negative("linkStiffness", self.link_stiffness)?;
        finite("chargeStrength", self.charge_strength)?;
        non_negative("chargeTheta", self.charge_theta)?;
        non_negative("chargeDistanceMin", self.charge_distance_min)?;
        if self.charge_distance_max.is_nan() || self.charge_distance_max < self.charge_distance_min {
            return Err(LayoutError::invalid(
                "chargeDistanceMax",
                "must be >= chargeDistanceMin",
            ));
        }
        finite("centerX", self.center_x)?;
        finite("centerY", self.center_y)?;
        unit_interval("centerStrength", self.center_strength)?;
        unit_interval("alphaDecay", self.alpha_decay)?;
        unit_interval("alphaMin", self.alpha_min)?;
        unit_interval("velocityDecay", self.velocity_decay)?;
        unit_interval("dragAlphaTarget", self.drag_alpha_target)?;
        Ok(())
    }

    /// Multiplier applied to velocity after each tick.
    #[inline]
    pub fn velocity_retention(&self) -> f32 {
        1.0 - self.velocity_decay
    }
}

fn finite(field: &'static str, value: f32) -> LayoutResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LayoutError::invalid(field, format!("must be finite, got {value}")))
    }
}

pub(crate) fn non_negative(field: &'static str, value: f32) -> LayoutResult<()> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(LayoutError::invalid(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

fn unit_interval(field: &'static str, value: f32) -> LayoutResult<()> {
    finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(LayoutError::invalid(
            field,
            format!("must be within [0, 1], got {value}"),
        ));
    }
    Ok(())
}
