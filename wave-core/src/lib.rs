//! Core 2-D wave-particle simulation library.
//!
//! A circular wavefront is sampled by point particles that travel
//! outward on straight rays and split into three whenever their angular
//! wedge grows wider than the target resolution.
//!
//! Main components:
//! - [`particle`]: the wave particle, its trajectory and split rule.
//! - [`ring`]: the initial ring laid out by a generation event.
//! - [`store`]: unbounded, append-only particle storage.
//! - [`pool`]: fixed-capacity slot storage with a [`free_list`].
//! - [`model`]: the interface both storages implement.
//! - [`events`]: recorded generation events and their file format.
//! - [`stepper`]: fixed-timestep orchestration, run state and replay.
//! - [`config`]: tunable parameters.
//! - [`error`]: the crate error type.
//! - [`types`]: shared index aliases.

pub mod config;
pub mod error;
pub mod events;
pub mod free_list;
pub mod model;
pub mod particle;
pub mod pool;
pub mod ring;
pub mod stepper;
pub mod store;
pub mod types;
