//! Computational core of a gravitational N-body integrator: force
//! evaluation (direct summation and Barnes-Hut), the spatial indices that
//! back Barnes-Hut, and an ODE solver layer expressed entirely through a
//! small set of engine-provided vector primitives.
//!
//! Out of scope, same as the system this crate's core was distilled from:
//! any playback/viewer UI, on-disk recording formats, CLI argument
//! parsing, and GPU/OpenCL back-ends -- see [`driver::SnapshotSink`] and
//! [`engine::factory`] for the seams those would plug into.

pub mod config;
pub mod data;
pub mod driver;
pub mod engine;
pub mod error;
pub mod solver;
pub mod tasks;
pub mod types;

#[cfg(test)]
mod tests;
