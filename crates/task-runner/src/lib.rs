//! Task Runner Client.
//!
//! Dispatches one remote automation task per action, polls it on a fixed
//! interval, and normalizes the terminal payload.

pub mod errors;
pub mod model;
pub mod poll;
pub mod skyvern;

use async_trait::async_trait;

pub use errors::TaskRunnerError;
pub use model::{normalize_url, TaskHandle, TaskRequest, TaskSnapshot, TerminalResult};
pub use poll::{await_completion, await_completion_with_cancel, PollPolicy};
pub use skyvern::{SkyvernClient, SkyvernConfig};

/// Remote service that performs browser automation for a single action.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Creates a remote task. The request URL is already normalized.
    async fn dispatch(&self, request: &TaskRequest) -> Result<TaskHandle, TaskRunnerError>;

    /// Reads the current status of a remote task.
    async fn poll(&self, handle: &TaskHandle) -> Result<TaskSnapshot, TaskRunnerError>;
}
