//! Shapes of the JSON replies the oracle is asked to produce.

use std::collections::{BTreeMap, BTreeSet};

use flowsmith_core_types::{Action, ActionId, BlockId, NewAction};
use serde::{Deserialize, Serialize};

/// Phase 1 reply: a proposed flow.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowPlanReply {
    pub flow_name: String,
    #[serde(default)]
    pub flow_description: String,
    pub actions: Vec<CandidateAction>,
}

/// An action the oracle believes the goal needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAction {
    pub url: String,
    pub name: String,
    pub navigation_goal: String,
    #[serde(default)]
    pub data_extraction_goal: String,
    #[serde(default)]
    pub required_inputs: BTreeSet<String>,
}

impl CandidateAction {
    /// Text used to look for an equivalent stored action.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name, self.navigation_goal, self.data_extraction_goal
        )
    }

    pub fn into_new_action(self, block_id: BlockId) -> NewAction {
        NewAction {
            block_id,
            name: self.name,
            navigation_goal: self.navigation_goal,
            data_extraction_goal: self.data_extraction_goal,
            required_inputs: self.required_inputs,
            output_schema: BTreeMap::new(),
            url: self.url,
        }
    }
}

/// Phase 3 reply.
#[derive(Debug, Clone, Deserialize)]
pub struct SufficiencyReply {
    pub is_sufficient: bool,
    #[serde(default)]
    pub missing_capabilities: Vec<CandidateAction>,
}

/// Reply to a website analysis request.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionReply {
    pub actions: Vec<SuggestedAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestedAction {
    pub name: String,
    pub navigation_goal: String,
    #[serde(default)]
    pub data_extraction_goal: String,
    #[serde(default)]
    pub required_inputs: BTreeSet<String>,
    #[serde(default)]
    pub output_schema: BTreeMap<String, String>,
}

impl SuggestedAction {
    pub fn into_new_action(self, block_id: BlockId, url: &str) -> NewAction {
        NewAction {
            block_id,
            name: self.name,
            navigation_goal: self.navigation_goal,
            data_extraction_goal: self.data_extraction_goal,
            required_inputs: self.required_inputs,
            output_schema: self.output_schema,
            url: url.to_string(),
        }
    }
}

/// What the oracle is shown about a resolved action.
#[derive(Debug, Serialize)]
pub struct ActionSummary<'a> {
    pub id: &'a ActionId,
    pub name: &'a str,
    pub url: &'a str,
    pub navigation_goal: &'a str,
    pub data_extraction_goal: &'a str,
    pub required_inputs: &'a BTreeSet<String>,
    pub output_schema: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a Action> for ActionSummary<'a> {
    fn from(action: &'a Action) -> Self {
        Self {
            id: &action.id,
            name: &action.name,
            url: &action.url,
            navigation_goal: &action.navigation_goal,
            data_extraction_goal: &action.data_extraction_goal,
            required_inputs: &action.required_inputs,
            output_schema: &action.output_schema,
        }
    }
}
