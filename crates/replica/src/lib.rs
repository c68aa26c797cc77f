//! # Replica
//!
//! Sample world built on the replication layer.
//!
//! ## Modules
//!
//! - `schemas`: actor classes and their registration
//! - `loopback`: in-process server/client link used by the demo binary

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod loopback;
pub mod schemas;

pub use replica_core as core;
pub use replica_networking as networking;

pub use loopback::{engine_from_config, LoopbackError, LoopbackLink, StepStats};
pub use schemas::register_classes;
