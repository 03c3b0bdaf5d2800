//! The simulation engine: tick loop, integration and alpha control.
//!
//! The engine is driven from outside, one tick at a time (typically from a
//! per-frame callback). It never spawns threads and never re-enters itself.

mod engine;
mod event;

pub use engine::{Simulation, SimulationState};
pub use event::{SimulationEvent, SubscriptionId, TickEvent};
