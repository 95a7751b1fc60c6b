//! timeclockd service internals
//!
//! The binary wires OS event sources and the IPC socket to [`Daemon`],
//! which owns the attendance engine and answers every request in turn.

mod daemon;

pub use daemon::*;
