use thiserror::Error;

/// Errors emitted while talking to or interpreting the reasoning oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle could not be reached or refused the request.
    #[error("oracle request failed: {0}")]
    Request(String),

    /// The oracle replied, but not with what the caller asked for.
    #[error("malformed oracle response during {stage}: {reason}")]
    Malformed { stage: String, reason: String },

    /// A scripted oracle ran out of replies.
    #[error("scripted oracle has no reply left for prompt #{0}")]
    Exhausted(usize),
}

impl OracleError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    pub fn malformed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}
