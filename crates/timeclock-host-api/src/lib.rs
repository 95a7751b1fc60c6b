//! Host collaborator interfaces for timeclockd
//!
//! This crate defines the seams between the attendance core and the
//! platform: where credentials come from and how OS lifecycle signals
//! arrive. It contains no platform code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
