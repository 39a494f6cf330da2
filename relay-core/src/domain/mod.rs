//! Core domain types
//!
//! These types describe a job from the moment the workflow engine hands it
//! over until a terminal outcome has been reported back. They are shared
//! between the executor (which tracks jobs) and the CLI host (which creates
//! them).

pub mod job;
pub mod submission;
