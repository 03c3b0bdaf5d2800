//! Simulation - owns the graph, the forces and the alpha schedule.
//!
//! # Tick
//!
//! 1. Stop if alpha fell below alpha min and nothing holds it up.
//! 2. Zero the accumulator.
//! 3. Evaluate every registered force into the accumulator.
//! 4. Integrate velocities and positions of free nodes.
//! 5. Snap pinned nodes to their pins.
//! 6. Move alpha toward alpha target.
//! 7. Emit the tick event.
//!
//! Steps 2-3 finish before anything in the graph changes, so a failing force
//! leaves every node where it was.

use std::collections::BTreeMap;

use log::{debug, trace, warn};

use super::event::{Listener, SimulationEvent, SubscriptionId, TickEvent};
use crate::config::SimulationConfig;
use crate::error::{ForceError, LayoutError, LayoutResult};
use crate::force::{CENTER, CHARGE, CenterForce, ChargeForce, Deltas, ForceRegistry, LINK, LinkForce};
use crate::graph::{EdgeSpec, Graph, NodeId, Point};

/// Whether the engine is currently ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// Constructed, stopped or converged.
    Idle,
    /// The scheduler should keep calling [`Simulation::advance`].
    Running,
}

/// Force-directed layout engine.
pub struct Simulation {
    graph: Graph,
    forces: ForceRegistry,
    config: SimulationConfig,
    alpha: f32,
    alpha_target: f32,
    state: SimulationState,
    ticks: u64,
    deltas: Deltas,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Simulation {
    /// Create an engine with the standard link, charge and center forces.
    pub fn new(graph: Graph, config: SimulationConfig) -> LayoutResult<Self> {
        let forces = ForceRegistry::standard(&config);
        Self::with_forces(graph, config, forces)
    }

    /// Create an engine with an explicit set of forces.
    pub fn with_forces(graph: Graph, config: SimulationConfig, forces: ForceRegistry) -> LayoutResult<Self> {
        config.validate()?;
        Ok(Self {
            graph,
            forces,
            config,
            alpha: 1.0,
            alpha_target: 0.0,
            state: SimulationState::Idle,
            ticks: 0,
            deltas: Deltas::default(),
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    /// Build the graph and the engine in one step.
    pub fn from_parts<I, N, E>(nodes: I, edges: E, config: SimulationConfig) -> LayoutResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
        E: IntoIterator<Item = EdgeSpec>,
    {
        config.validate()?;
        Self::new(Graph::from_parts(nodes, edges)?, config)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The graph being laid out.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the graph between ticks.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// The registered forces.
    pub fn forces(&self) -> &ForceRegistry {
        &self.forces
    }

    /// Mutable access to the registered forces.
    pub fn forces_mut(&mut self) -> &mut ForceRegistry {
        &mut self.forces
    }

    /// Current configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replace the configuration.
    ///
    /// Built-in forces still present in the registry are rebuilt from the
    /// new values; custom forces are left alone.
    pub fn set_config(&mut self, config: SimulationConfig) -> LayoutResult<()> {
        config.validate()?;
        if self.forces.contains(LINK) {
            self.forces.insert(LINK, LinkForce::from_config(&config));
        }
        if self.forces.contains(CHARGE) {
            self.forces.insert(CHARGE, ChargeForce::from_config(&config));
        }
        if self.forces.contains(CENTER) {
            self.forces.insert(CENTER, CenterForce::from_config(&config));
        }
        self.config = config;
        Ok(())
    }

    /// Current alpha.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Set alpha directly. Must lie within [0, 1].
    pub fn set_alpha(&mut self, alpha: f32) -> LayoutResult<()> {
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(LayoutError::invalid("alpha", format!("must be within [0, 1], got {alpha}")));
        }
        self.alpha = alpha;
        Ok(())
    }

    /// Current alpha target.
    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    /// Current engine state.
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// True while the engine is running.
    pub fn is_running(&self) -> bool {
        self.state == SimulationState::Running
    }

    /// Number of ticks completed.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resume ticking without touching alpha.
    pub fn start(&mut self) {
        if self.state == SimulationState::Idle {
            debug!("simulation started at alpha {:.4}", self.alpha);
            self.state = SimulationState::Running;
        }
    }

    /// Halt future scheduled ticks. Idempotent.
    pub fn stop(&mut self) {
        if self.state == SimulationState::Running {
            debug!("simulation stopped after {} ticks", self.ticks);
            self.state = SimulationState::Idle;
        }
    }

    /// Reset alpha to 1 and start running.
    pub fn restart(&mut self) {
        debug!("simulation restarted");
        self.alpha = 1.0;
        self.state = SimulationState::Running;
    }

    /// Hold alpha up at `target` (e.g. while dragging), resuming if idle.
    pub fn reheat(&mut self, target: f32) -> LayoutResult<()> {
        if !target.is_finite() || !(0.0..=1.0).contains(&target) {
            return Err(LayoutError::invalid(
                "alphaTarget",
                format!("must be within [0, 1], got {target}"),
            ));
        }
        self.alpha_target = target;
        self.start();
        Ok(())
    }

    /// Let alpha decay naturally again.
    pub fn cool(&mut self) {
        self.alpha_target = 0.0;
    }

    // =========================================================================
    // Ticking
    // =========================================================================

    /// Run a single tick regardless of the running state.
    ///
    /// Returns `Ok(None)` once alpha has dropped below alpha min with no
    /// alpha target; the engine is then idle.
    pub fn tick(&mut self) -> LayoutResult<Option<TickEvent>> {
        if self.alpha < self.config.alpha_min && self.alpha_target == 0.0 {
            if self.state == SimulationState::Running {
                debug!("simulation converged after {} ticks", self.ticks);
                self.state = SimulationState::Idle;
                let end = SimulationEvent::End {
                    tick: self.ticks,
                    alpha: self.alpha,
                };
                self.emit(&end);
            }
            return Ok(None);
        }

        self.accumulate()?;

        self.graph.integrate(
            self.deltas.velocity_buffers(),
            self.deltas.displacement_buffers(),
            self.config.velocity_retention(),
        );
        self.graph.apply_pins();

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.ticks += 1;
        trace!("tick {} alpha {:.5}", self.ticks, self.alpha);

        let event = self.snapshot();
        if !self.listeners.is_empty() {
            self.emit(&SimulationEvent::Tick(event.clone()));
        }
        Ok(Some(event))
    }

    /// Scheduler entry point: tick only while running.
    pub fn advance(&mut self) -> LayoutResult<Option<TickEvent>> {
        if self.state == SimulationState::Running {
            self.tick()
        } else {
            Ok(None)
        }
    }

    /// Run up to `max_ticks` ticks, stopping early on convergence.
    ///
    /// Returns the number of ticks completed.
    pub fn run(&mut self, max_ticks: usize) -> LayoutResult<usize> {
        let mut completed = 0;
        while completed < max_ticks {
            if self.tick()?.is_none() {
                break;
            }
            completed += 1;
        }
        Ok(completed)
    }

    /// Evaluate every force into the accumulator without touching the graph.
    fn accumulate(&mut self) -> LayoutResult<()> {
        let view = self.graph.view();
        self.deltas.reset(view.slot_bound());

        for (name, force) in self.forces.iter() {
            let result = force.apply(&view, self.alpha, &mut self.deltas).and_then(|()| {
                match self.deltas.first_non_finite(&view) {
                    Some(slot) => Err(ForceError::NonFinite {
                        node: view.id(slot).clone(),
                    }),
                    None => Ok(()),
                }
            });

            if let Err(source) = result {
                warn!("force '{}' failed on tick {}: {}", name, self.ticks + 1, source);
                self.state = SimulationState::Idle;
                return Err(LayoutError::ForceEvaluation {
                    force: name.to_string(),
                    source,
                });
            }
        }
        Ok(())
    }

    /// Current positions, tick count and alpha.
    pub fn snapshot(&self) -> TickEvent {
        let positions: BTreeMap<NodeId, Point> = self
            .graph
            .positions()
            .map(|(id, p)| (id.clone(), p))
            .collect();
        TickEvent {
            tick: self.ticks,
            alpha: self.alpha,
            positions,
        }
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register a listener for tick and end events.
    pub fn subscribe(&mut self, listener: impl FnMut(&SimulationEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: &SimulationEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}
