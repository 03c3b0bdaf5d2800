//! Events emitted by the simulation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::{NodeId, Point};

/// Position snapshot emitted after every completed tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickEvent {
    /// Number of ticks completed so far.
    pub tick: u64,
    /// Alpha after this tick's decay.
    pub alpha: f32,
    /// Node id to position.
    pub positions: BTreeMap<NodeId, Point>,
}

impl TickEvent {
    /// Position of one node in this snapshot.
    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SimulationEvent {
    /// A tick completed.
    Tick(TickEvent),
    /// The simulation cooled below alpha min and went idle.
    End {
        /// Ticks completed when the simulation stopped.
        tick: u64,
        /// Alpha at the time it stopped.
        alpha: f32,
    },
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub(crate) type Listener = Box<dyn FnMut(&SimulationEvent)>;
