//! Relay Core
//!
//! Core types shared by every flux-relay crate.
//!
//! This crate contains:
//! - Domain types: job requests, submitted-job records and poll outcomes
//! - DTOs: event bodies sent to a workflow engine's reporting API

pub mod domain;
pub mod dto;
