//! User interaction with a running layout.
//!
//! Drag events mutate pin state through the graph's pin accessors, settle a
//! released node at its last pin with `Graph::settle`, and call the
//! simulation's reheat/cool API. They never touch force math.

mod drag;

pub use drag::{DragController, DragSession, DragState};
