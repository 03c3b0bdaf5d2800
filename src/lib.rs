//! Force Layout - WASM Module
//!
//! An interactive force-directed graph layout engine. Nodes are pushed apart
//! by a charge force, held together along edges by springs and pulled toward
//! a center, while an energy parameter (alpha) decays until the layout
//! settles. Dragged nodes are pinned under the pointer and the simulation is
//! reheated so neighbours follow.
//!
//! # Architecture
//!
//! - `graph`: Node/edge model using petgraph's StableGraph with SoA positions
//! - `force`: Force trait, registry and the link, charge and center forces
//! - `simulation`: Tick loop, integration, alpha control and tick events
//! - `interaction`: Drag lifecycle on top of pins and reheat/cool
//! - `spatial`: R-tree spatial indexing for O(log n) hit testing
//! - `config`: Serde configuration shared with the JavaScript host

use js_sys::{Array, Float32Array, Function};
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod force;
pub mod graph;
pub mod interaction;
pub mod simulation;
pub mod spatial;

pub use config::SimulationConfig;
pub use error::{ForceError, LayoutError, LayoutResult};
pub use force::{Deltas, Force, ForceRegistry};
pub use graph::{EdgeId, EdgeSpec, Graph, GraphView, LinkParams, NodeId, NodeView, Pin, Point};
pub use interaction::{DragController, DragSession, DragState};
pub use simulation::{Simulation, SimulationEvent, SimulationState, SubscriptionId, TickEvent};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second instantiation finds the logger already installed.
    let _ = console_log::init_with_level(log::Level::Info);
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    Ok(value.serialize(&Serializer::new().serialize_maps_as_objects(true))?)
}

/// Main entry point for the layout engine.
///
/// Wraps a [`Simulation`] and a [`DragController`] and exposes them to
/// JavaScript. A host typically calls `tick()` from `requestAnimationFrame`
/// and renders the returned positions.
#[wasm_bindgen]
pub struct ForceLayoutWasm {
    sim: Simulation,
    drag: DragController,
    tick_listener: Option<SubscriptionId>,
}

#[wasm_bindgen]
impl ForceLayoutWasm {
    /// Create an empty layout.
    ///
    /// `config` is a plain object with any subset of the `SimulationConfig`
    /// fields (camelCase); `undefined` uses the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ForceLayoutWasm, JsError> {
        let config: SimulationConfig = if config.is_undefined() || config.is_null() {
            SimulationConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        Ok(Self {
            sim: Simulation::new(Graph::new(), config)?,
            drag: DragController::new(),
            tick_listener: None,
        })
    }

    // =========================================================================
    // Graph Operations
    // =========================================================================

    /// Add a node placed automatically on the initial spiral.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(&mut self, id: String) -> Result<(), JsError> {
        Ok(self.sim.graph_mut().add_node(id)?)
    }

    /// Add a node at the specified position.
    #[wasm_bindgen(js_name = addNodeAt)]
    pub fn add_node_at(&mut self, id: String, x: f32, y: f32) -> Result<(), JsError> {
        Ok(self.sim.graph_mut().add_node_at(id, x, y)?)
    }

    /// Add an edge between two existing nodes.
    ///
    /// `distance` and `stiffness` fall back to the configured defaults when
    /// omitted. Returns the edge id.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        distance: Option<f32>,
        stiffness: Option<f32>,
    ) -> Result<u32, JsError> {
        let params = LinkParams { distance, stiffness };
        Ok(self.sim.graph_mut().add_edge(source, target, params)?.raw())
    }

    /// Remove an edge by id.
    #[wasm_bindgen(js_name = removeEdge)]
    pub fn remove_edge(&mut self, edge_id: u32) -> bool {
        self.sim.graph_mut().remove_edge(EdgeId::new(edge_id))
    }

    /// Remove a node and all of its edges, ending any drag on it.
    #[wasm_bindgen(js_name = removeNode)]
    pub fn remove_node(&mut self, id: &str) -> bool {
        self.drag.remove_node(&mut self.sim, id)
    }

    /// Get the number of nodes.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.sim.graph().node_count() as u32
    }

    /// Get the number of edges.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.sim.graph().edge_count() as u32
    }

    /// Node ids in the same order as `positions()`.
    #[wasm_bindgen(js_name = nodeIds)]
    pub fn node_ids(&self) -> Array {
        self.sim
            .graph()
            .node_ids()
            .map(|id| JsValue::from_str(id.as_str()))
            .collect()
    }

    /// Positions as [x0, y0, x1, y1, ...] in `nodeIds()` order.
    pub fn positions(&self) -> Float32Array {
        let mut flat = Vec::with_capacity(self.sim.graph().node_count() * 2);
        for (_, p) in self.sim.graph().positions() {
            flat.push(p.x);
            flat.push(p.y);
        }
        Float32Array::from(&flat[..])
    }

    // =========================================================================
    // Simulation Control
    // =========================================================================

    /// Resume ticking without changing alpha.
    pub fn start(&mut self) {
        self.sim.start();
    }

    /// Stop ticking. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.sim.stop();
    }

    /// Reset alpha to 1 and start.
    pub fn restart(&mut self) {
        self.sim.restart();
    }

    /// Hold alpha near `target` and start.
    pub fn reheat(&mut self, target: f32) -> Result<(), JsError> {
        Ok(self.sim.reheat(target)?)
    }

    /// Let alpha decay toward zero again.
    pub fn cool(&mut self) {
        self.sim.cool();
    }

    /// Advance one tick while running.
    ///
    /// Returns `{ tick, alpha, positions }`, or `undefined` once the
    /// simulation is idle.
    pub fn tick(&mut self) -> Result<JsValue, JsError> {
        match self.sim.advance()? {
            Some(event) => to_js(&event),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// True while `tick()` advances the layout.
    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.sim.is_running()
    }

    /// Current alpha (simulation energy).
    pub fn alpha(&self) -> f32 {
        self.sim.alpha()
    }

    /// Register a callback invoked with every simulation event.
    ///
    /// Events are `{ type: "tick", tick, alpha, positions }` and
    /// `{ type: "end", tick, alpha }`. Replaces any previous callback.
    #[wasm_bindgen(js_name = onTick)]
    pub fn on_tick(&mut self, callback: Function) {
        self.off_tick();
        let id = self.sim.subscribe(move |event| {
            let delivered = to_js(event)
                .map_err(JsValue::from)
                .and_then(|value| callback.call1(&JsValue::NULL, &value));
            if let Err(err) = delivered {
                log::warn!("tick callback failed: {:?}", err);
            }
        });
        self.tick_listener = Some(id);
    }

    /// Remove the callback registered with `onTick`.
    #[wasm_bindgen(js_name = offTick)]
    pub fn off_tick(&mut self) {
        if let Some(id) = self.tick_listener.take() {
            self.sim.unsubscribe(id);
        }
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Find the node under the pointer.
    pub fn pick(&mut self, x: f32, y: f32, radius: f32) -> Option<String> {
        self.drag
            .pick(&self.sim, x, y, radius)
            .map(|id| id.as_str().to_owned())
    }

    /// Pin a node where it is and reheat.
    #[wasm_bindgen(js_name = beginDrag)]
    pub fn begin_drag(&mut self, id: &str, x: f32, y: f32) -> Result<(), JsError> {
        Ok(self.drag.begin_drag(&mut self.sim, id, x, y)?)
    }

    /// Move a dragged node's pin to the pointer.
    #[wasm_bindgen(js_name = updateDrag)]
    pub fn update_drag(&mut self, id: &str, x: f32, y: f32) -> Result<(), JsError> {
        Ok(self.drag.update_drag(&mut self.sim, id, x, y)?)
    }

    /// Release a dragged node.
    #[wasm_bindgen(js_name = endDrag)]
    pub fn end_drag(&mut self, id: &str) -> Result<(), JsError> {
        Ok(self.drag.end_drag(&mut self.sim, id)?)
    }
}
