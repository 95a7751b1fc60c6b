//! Shared types for timeclockd
//!
//! This crate defines:
//! - Records returned by the HR service (periods, calendar days, shifts)
//! - Attendance domain types (context, eligibility, day state, signals)
//! - The status projection consumed by presentation layers
//! - IPC commands, responses, and events

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
