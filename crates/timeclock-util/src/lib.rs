//! Shared utilities for timeclockd
//!
//! This crate provides:
//! - ID types (EmployeeId, PeriodId, ClientId)
//! - Time utilities (mockable wall clock, HH:MM parsing, workday math)
//! - Error types
//! - Default paths for config, socket, and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
