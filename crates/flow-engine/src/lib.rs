//! Flow planning and execution engine.
//!
//! [`FlowPlanner`] turns a goal into a stored [`Flow`](flowsmith_core_types::Flow)
//! with the help of a reasoning oracle; [`FlowExecutor`] runs a flow as a
//! sequence of remote tasks, threading each action's output into the next and
//! checkpointing the execution record after every step.

pub mod blocks;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod planner;
pub mod prompts;
pub mod repository;
pub mod schema;

pub use blocks::{BlockManager, BlockWithActions};
pub use engine::{Engine, EngineConfig};
pub use errors::EngineError;
pub use executor::{FlowExecutor, ResumeMode};
pub use planner::{FlowPlanner, PlannedFlow, PlannerConfig};
pub use repository::{ActionRepository, BlockRepository, FlowRepository, DEFAULT_MIN_SCORE};
