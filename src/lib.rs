//! stalepatch - Kubernetes optimistic concurrency, update vs. patch
//!
//! Drives a scripted scenario against a real API server: create a placeholder
//! Pod, then mutate its `status` subresource with replaces and merge patches
//! from deliberately stale snapshots, checking which writes the server (or a
//! client-side precondition) refuses.
//!
//! # Modules
//!
//! - [`client`] - The `PodApi` seam and its kube-backed implementation
//! - [`config`] - Cluster connection and scenario configuration
//! - [`snapshot`] - Versioned Pod snapshots and staleness checks
//! - [`patch`] - Two-way merge patch generation and preconditions
//! - [`pod`] - The individual Pod operations (get, create, update, patch, bind)
//! - [`scenario`] - The scripted driver
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod patch;
pub mod pod;
pub mod scenario;
pub mod snapshot;

pub use client::{KubePodApi, PodApi};
pub use config::{ClusterConfig, ScenarioConfig};
pub use error::Error;
pub use scenario::{run_scenario, ScenarioReport};
pub use snapshot::PodSnapshot;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
