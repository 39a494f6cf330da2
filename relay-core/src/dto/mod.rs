//! Data Transfer Objects sent from the executor to a workflow engine
//!
//! DTOs are flat, serializable snapshots of domain state built for the
//! engine's HTTP reporting API.

pub mod job;
