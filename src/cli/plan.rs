use anyhow::{Context, Result};
use clap::Args;
use flowsmith_core_types::FlowExecution;
use flow_engine::PlannedFlow;
use serde::Serialize;
use serde_json::Value;

use super::context::CliContext;
use super::inputs::{collect_inputs, parse_input};
use super::output::{emit, print_execution, print_flow};

#[derive(Args, Clone, Debug)]
pub struct PlanArgs {
    /// Goal to plan a flow for
    #[arg(short, long)]
    pub prompt: String,

    /// Known input as KEY=VALUE; repeat for more
    #[arg(short, long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, Value)>,

    /// Run the flow as soon as it is planned
    #[arg(long)]
    pub execute: bool,
}

#[derive(Serialize)]
struct PlanReport {
    #[serde(flatten)]
    planned: PlannedFlow,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution: Option<FlowExecution>,
}

pub async fn cmd_plan(args: PlanArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let planner = &app.engine().planner;
    let inputs = collect_inputs(args.inputs);

    let report = if args.execute {
        let (planned, execution) = planner
            .create_and_execute(&args.prompt, inputs)
            .await
            .context("planning and executing flow")?;
        PlanReport {
            planned,
            execution: Some(execution),
        }
    } else {
        let planned = planner
            .create_flow_from_prompt(&args.prompt, inputs)
            .await
            .context("planning flow")?;
        PlanReport {
            planned,
            execution: None,
        }
    };

    emit(ctx.output(), &report, |report| {
        print_flow(&report.planned.flow);
        if !report.planned.inputs.is_empty() {
            println!("Inputs:");
            for (name, value) in &report.planned.inputs {
                println!("  {name} = {value}");
            }
        }
        if let Some(execution) = &report.execution {
            print_execution(execution);
        }
    })
}
