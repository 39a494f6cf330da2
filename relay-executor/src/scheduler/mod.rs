//! Scheduler layer for the executor
//!
//! Walks the tracked jobs once per host cycle and turns backend states
//! into reported outcomes.

pub mod poller;

pub use poller::{PollSummary, StatusPoller};
