//! Force contributors and the force registry.
//!
//! A force reads the graph through a [`GraphView`] and adds per-node
//! velocity or displacement deltas into a shared [`Deltas`] accumulator. Forces
//! never move nodes themselves; the simulation integrates the accumulated
//! deltas only after every force has succeeded.

mod center;
mod charge;
mod link;
mod quadtree;

pub use center::CenterForce;
pub use charge::{BARNES_HUT_MIN_NODES, ChargeForce};
pub use link::LinkForce;

use crate::config::SimulationConfig;
use crate::error::ForceError;
use crate::graph::{GOLDEN_ANGLE, GraphView, Point};

/// Registry name of the link force.
pub const LINK: &str = "link";
/// Registry name of the charge force.
pub const CHARGE: &str = "charge";
/// Registry name of the centering force.
pub const CENTER: &str = "center";

/// Separation substituted when two nodes coincide.
pub(crate) const JIGGLE: f32 = 1e-6;

/// A force contributor.
pub trait Force {
    /// Add this force's contribution for the current tick.
    ///
    /// `alpha` is the simulation temperature; forces scale their strength by it
    /// unless they only translate the whole graph.
    fn apply(&self, view: &GraphView<'_>, alpha: f32, deltas: &mut Deltas) -> Result<(), ForceError>;
}

/// Wrap a function as a [`Force`].
pub fn from_fn<F>(f: F) -> FnForce<F>
where
    F: Fn(&GraphView<'_>, f32, &mut Deltas) -> Result<(), ForceError>,
{
    FnForce(f)
}

/// A force backed by a function; see [`from_fn`].
pub struct FnForce<F>(F);

impl<F> Force for FnForce<F>
where
    F: Fn(&GraphView<'_>, f32, &mut Deltas) -> Result<(), ForceError>,
{
    fn apply(&self, view: &GraphView<'_>, alpha: f32, deltas: &mut Deltas) -> Result<(), ForceError> {
        (self.0)(view, alpha, deltas)
    }
}

/// Per-slot accumulator for one tick.
///
/// Velocity deltas are added to a node's velocity before damping; displacement
/// deltas are added straight to its position.
#[derive(Debug, Clone, Default)]
pub struct Deltas {
    vx: Vec<f32>,
    vy: Vec<f32>,
    dx: Vec<f32>,
    dy: Vec<f32>,
}

impl Deltas {
    /// Zeroed accumulator for `len` slots.
    pub fn new(len: usize) -> Self {
        let mut deltas = Self::default();
        deltas.reset(len);
        deltas
    }

    pub(crate) fn reset(&mut self, len: usize) {
        for buffer in [&mut self.vx, &mut self.vy, &mut self.dx, &mut self.dy] {
            buffer.clear();
            buffer.resize(len, 0.0);
        }
    }

    /// Add to a node's velocity.
    #[inline]
    pub fn add_velocity(&mut self, slot: usize, x: f32, y: f32) {
        self.vx[slot] += x;
        self.vy[slot] += y;
    }

    /// Add to a node's position.
    #[inline]
    pub fn add_displacement(&mut self, slot: usize, x: f32, y: f32) {
        self.dx[slot] += x;
        self.dy[slot] += y;
    }

    /// Accumulated velocity delta of a slot.
    pub fn velocity(&self, slot: usize) -> Point {
        Point::new(self.vx[slot], self.vy[slot])
    }

    /// Accumulated displacement of a slot.
    pub fn displacement(&self, slot: usize) -> Point {
        Point::new(self.dx[slot], self.dy[slot])
    }

    pub(crate) fn velocity_buffers(&self) -> (&[f32], &[f32]) {
        (&self.vx, &self.vy)
    }

    pub(crate) fn displacement_buffers(&self) -> (&[f32], &[f32]) {
        (&self.dx, &self.dy)
    }

    /// First live slot holding a NaN or infinite delta.
    pub(crate) fn first_non_finite(&self, view: &GraphView<'_>) -> Option<usize> {
        view.slots().find(|&i| {
            !(self.vx[i].is_finite()
                && self.vy[i].is_finite()
                && self.dx[i].is_finite()
                && self.dy[i].is_finite())
        })
    }
}

/// Deterministic tiny offset used in place of a zero-length separation.
pub(crate) fn jiggle(seed: usize) -> (f32, f32) {
    let angle = (seed % 4096) as f32 * GOLDEN_ANGLE;
    (angle.cos() * JIGGLE, angle.sin() * JIGGLE)
}

/// Jiggle for the pair (from, to); reversing the pair reverses the direction.
pub(crate) fn pair_jiggle(from: usize, to: usize) -> (f32, f32) {
    let (lo, hi) = if from < to { (from, to) } else { (to, from) };
    let (x, y) = jiggle(lo.wrapping_mul(31).wrapping_add(hi));
    if from < to { (x, y) } else { (-x, -y) }
}

struct Entry {
    name: String,
    force: Box<dyn Force>,
}

/// Ordered, named collection of forces evaluated once per tick.
#[derive(Default)]
pub struct ForceRegistry {
    entries: Vec<Entry>,
}

impl ForceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Link, charge and center forces configured from `config`.
    pub fn standard(config: &SimulationConfig) -> Self {
        let mut registry = Self::new();
        registry.insert(LINK, LinkForce::from_config(config));
        registry.insert(CHARGE, ChargeForce::from_config(config));
        registry.insert(CENTER, CenterForce::from_config(config));
        registry
    }

    /// Register a force. A force with the same name is replaced in place and
    /// returned.
    pub fn insert(&mut self, name: impl Into<String>, force: impl Force + 'static) -> Option<Box<dyn Force>> {
        let name = name.into();
        let force: Box<dyn Force> = Box::new(force);
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => Some(std::mem::replace(&mut entry.force, force)),
            None => {
                self.entries.push(Entry { name, force });
                None
            }
        }
    }

    /// Remove a force by name.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Force>> {
        let position = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(position).force)
    }

    /// Look up a force by name.
    pub fn get(&self, name: &str) -> Option<&dyn Force> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.force.as_ref())
    }

    /// Check whether a force is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Registered names in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Number of registered forces.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no force is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &dyn Force)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.force.as_ref()))
    }
}
