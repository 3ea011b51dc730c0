//! Shared primitives for the flowsmith engine crates.
//!
//! Identifiers are newtypes over UUID strings so that an action id can never be
//! passed where a flow id is expected. Records mirror what the document store
//! persists and what the CLI prints.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod model;
mod status;

pub use model::{
    Action, ActionExecution, ActionRef, Block, Flow, FlowExecution, Inputs, NewAction, NewBlock,
    Outputs, BLOCK_TYPE_WEBSITE,
};
pub use status::{ExecutionStatus, TaskStatus};

/// Raised when a textual status cannot be mapped onto a known variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} status: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a stored [`Block`].
    BlockId
);
string_id!(
    /// Identifier of a stored [`Action`].
    ActionId
);
string_id!(
    /// Identifier of a stored [`Flow`].
    FlowId
);
string_id!(
    /// Identifier of a [`FlowExecution`] record.
    ExecutionId
);
string_id!(
    /// Identifier of a single [`ActionExecution`] inside a flow run.
    ActionExecutionId
);
string_id!(
    /// Identifier handed out by the remote task runner.
    RemoteTaskId
);
