use anyhow::Result;
use clap::ValueEnum;
use flowsmith_core_types::{Action, Block, Flow, FlowExecution};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

/// Prints `value` as JSON or YAML, or hands it to `human` for the default format.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, human: impl FnOnce(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Human => human(value),
    }
    Ok(())
}

pub fn print_flow(flow: &Flow) {
    println!("Flow {} ({})", flow.id, flow.name);
    if !flow.description.is_empty() {
        println!("  {}", flow.description);
    }
    for (index, action) in flow.actions.iter().enumerate() {
        println!("  {:>2}. {}", index + 1, action.id);
    }
}

pub fn print_execution(execution: &FlowExecution) {
    println!(
        "Execution {} of flow {}: {}",
        execution.id, execution.flow_id, execution.status
    );
    if let Some(previous) = &execution.resumed_from {
        println!("  resumed from {previous}");
    }
    for step in &execution.action_executions {
        let task = step
            .remote_task_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<10} action {} (task {task})", step.status, step.action_id);
        if let Some(error) = &step.error {
            println!("             error: {error}");
        }
    }
}

pub fn print_action(action: &Action) {
    println!("{:<38} {:<30} {}", action.id, action.name, action.url);
}

pub fn print_action_detail(action: &Action) {
    println!("Action {} ({})", action.id, action.name);
    println!("  block:      {}", action.block_id);
    println!("  url:        {}", action.url);
    println!("  navigation: {}", action.navigation_goal);
    if !action.data_extraction_goal.is_empty() {
        println!("  extraction: {}", action.data_extraction_goal);
    }
    if !action.required_inputs.is_empty() {
        let names: Vec<&str> = action.required_inputs.iter().map(String::as_str).collect();
        println!("  inputs:     {}", names.join(", "));
    }
}

pub fn print_block(block: &Block) {
    println!("{:<38} {:<30} {}", block.id, block.name, block.url);
}
