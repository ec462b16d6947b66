//! Shared types for the leader scheduling service.
//!
//! The problem and its solutions share one shape: a [`LeaderSchedule`] whose
//! leaders carry an optional group assignment. The solver fills in the
//! assignments and the score; the job layer passes schedules around unchanged.

pub mod domain;
pub mod job_id;
pub mod score;
pub mod status;
pub mod validation;

pub use domain::{Affinity, Group, Leader, LeaderSchedule};
pub use job_id::JobId;
pub use score::{HardSoftScore, ScoreParseError};
pub use status::SolverStatus;
pub use validation::{validate_schedule, ValidationError};
