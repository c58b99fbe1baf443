//! Core pamdash library (service client, risk model, config, logging).

pub mod actions;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod health;
pub mod logging;
pub mod risk;
pub mod snapshot;
