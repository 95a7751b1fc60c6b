//! Linux host adapter for timeclockd
//!
//! Provides:
//! - Credential storage in the OS keyring, or a private TOML file without one
//! - Sleep/wake signals from logind, and from hook scripts via SIGUSR1/SIGUSR2
//! - Resume detection from CLOCK_BOOTTIME drift
//! - A one-shot login signal at session start

mod credentials;
mod keyring_store;
mod login;
mod resume;
mod signals;
mod sleep;

pub use credentials::*;
pub use keyring_store::*;
pub use login::*;
pub use resume::*;
pub use signals::*;
pub use sleep::*;
