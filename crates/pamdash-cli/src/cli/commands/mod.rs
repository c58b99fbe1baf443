//! CLI command handlers.

pub mod config;
pub mod health;
pub mod snapshot;
pub mod watch;
