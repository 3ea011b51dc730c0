//! Prompt templates sent to the reasoning oracle.

use std::collections::BTreeSet;

use flowsmith_core_types::Action;

use crate::schema::ActionSummary;

pub fn plan_synthesis(goal: &str) -> String {
    format!(
        r#"User request: {goal}

Work out the sequence of browser actions needed to accomplish this request.
For every action give the website URL, a short action name, a navigation goal,
a data extraction goal and the inputs the user must supply.
Navigation goals should use the information the user already provided (for
example a given address) instead of clicking helpers such as "Find me" that lead
nowhere. Dismiss popups that get in the way and stay close to the main goal.

Reply with JSON only, no other text, using this structure:
{{
  "flow_name": "name",
  "flow_description": "description",
  "actions": [
    {{
      "url": "website_url",
      "name": "action_name",
      "navigation_goal": "goal",
      "data_extraction_goal": "goal",
      "required_inputs": ["input1", "input2"]
    }}
  ]
}}"#
    )
}

pub fn sufficiency(goal: &str, actions: &[Action]) -> String {
    format!(
        r#"User request: {goal}

Actions found so far:
{}

Decide whether these actions are relevant and sufficient for the request.
Describe any capability that is still missing as a new action.
Reply with JSON only, no other text, using this structure:
{{
  "is_sufficient": true,
  "missing_capabilities": [
    {{
      "url": "website_url",
      "name": "action_name",
      "navigation_goal": "goal",
      "data_extraction_goal": "goal",
      "required_inputs": ["input1", "input2"]
    }}
  ]
}}"#,
        render_actions(actions)
    )
}

pub fn ordering(goal: &str, actions: &[Action]) -> String {
    format!(
        r#"User request: {goal}

Available actions:
{}

Choose the actions that are really required and put them in execution order,
taking into account dependencies between actions and the data passed from one
action to the next.
Reply with a JSON array of action ids only, no other text:
["action_id1", "action_id2"]"#,
        render_actions(actions)
    )
}

pub fn input_extraction(goal: &str, names: &BTreeSet<String>) -> String {
    let names = names.iter().cloned().collect::<Vec<_>>().join(", ");
    format!(
        r#"User request: {goal}

Find values in the request for these inputs: {names}

Reply with JSON only, no other text, mapping each input you found to its value:
{{"input_name": "extracted_value"}}
Reply with {{}} when no values can be found."#
    )
}

pub fn website_suggestions(url: &str, hints: &str) -> String {
    let hints = if hints.trim().is_empty() { "none" } else { hints };
    format!(
        r#"Website URL: {url}

Suggest automation actions that can be performed on this website, covering
common user flows and data extraction needs. For each action provide a short
name, a navigation goal with precise instructions for the browser agent, the
data to extract, the inputs the user must supply and the schema of the
extracted data.

Actions suggested by the user:
{hints}

Reply with JSON only, no other text, using this structure:
{{
  "actions": [
    {{
      "name": "action_name",
      "navigation_goal": "detailed goal",
      "data_extraction_goal": "what to extract",
      "required_inputs": ["input1", "input2"],
      "output_schema": {{"field1": "description1"}}
    }}
  ]
}}"#
    )
}

fn render_actions(actions: &[Action]) -> String {
    let summaries: Vec<ActionSummary<'_>> = actions.iter().map(ActionSummary::from).collect();
    serde_json::to_string_pretty(&summaries).unwrap_or_else(|_| "[]".to_string())
}
