//! HTTP service for leader scheduling.
//!
//! # Components
//!
//! - `api`: REST endpoints over the job orchestrator
//! - `demo`: demo problem built from a roster file or the built-in roster
//! - `telemetry`: tracing subscriber setup

pub mod api;
pub mod demo;
pub mod telemetry;
