//! Attendance core for timeclockd
//!
//! This crate contains:
//! - Session client for the HR service's form sign-in
//! - Context resolution (employee and pay period for the current month)
//! - Working-day eligibility from the calendar feed
//! - The reconciler mapping Login/Sleep/Wake signals to clock-in/out writes
//! - Status projection for presentation layers

mod calendar;
mod client;
mod context;
mod engine;
mod events;
pub mod markup;
mod mock;
mod reconciler;
mod session;
mod status;

pub use calendar::*;
pub use client::*;
pub use context::*;
pub use engine::*;
pub use events::*;
pub use mock::*;
pub use reconciler::*;
pub use session::*;
pub use status::*;
