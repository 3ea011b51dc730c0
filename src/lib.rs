//! flowsmith operator CLI.
//!
//! Loads configuration, wires the flow engine over its store, oracle and task
//! runner, and exposes planning and execution as subcommands.

pub mod app_context;
pub mod cli;
pub mod config;
