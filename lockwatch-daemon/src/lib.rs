//! Lockwatch daemon library.
//!
//! Exposes the daemon's modules for integration testing.
//! In production, `lockwatch-daemon` is used as a binary (main.rs).

pub mod cli;
pub mod daemon;
pub mod logging;
pub mod metrics_server;
