use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::OracleError;
use crate::ReasoningOracle;

/// Oracle that answers from a queue of canned replies and records every prompt.
///
/// Useful for offline runs and tests; an empty queue yields
/// [`OracleError::Exhausted`].
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl ScriptedOracle {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(reply.into());
    }

    /// Prompts received so far, with their token budgets.
    pub fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, OracleError> {
        let index = {
            let mut prompts = self.prompts.lock();
            prompts.push((prompt.to_string(), max_tokens));
            prompts.len()
        };
        self.replies
            .lock()
            .pop_front()
            .ok_or(OracleError::Exhausted(index))
    }
}
