pub mod actions;
pub mod app;
pub mod blocks;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod executions;
pub mod flows;
pub mod inputs;
pub mod output;
pub mod plan;
pub mod run;
pub mod runtime;

pub use env::CliArgs;
