use thiserror::Error;

/// Errors surfaced by document store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure talking to a remote backend.
    #[error("store request failed: {0}")]
    Transport(String),

    /// Backend answered with a non-success status.
    #[error("store returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// A stored document could not be decoded.
    #[error("corrupt document {id} in {collection}: {reason}")]
    Corrupt {
        collection: String,
        id: String,
        reason: String,
    },

    /// Local snapshot persistence failed.
    #[error("store persistence failed: {0}")]
    Persistence(String),
}

impl StoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn corrupt(
        collection: impl Into<String>,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Corrupt {
            collection: collection.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }
}
