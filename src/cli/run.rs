use std::collections::BTreeSet;

use anyhow::{Context, Result};
use clap::Args;
use flowsmith_core_types::FlowId;
use flow_engine::ResumeMode;
use serde::Serialize;
use serde_json::Value;

use super::context::CliContext;
use super::inputs::{collect_inputs, parse_input};
use super::output::{emit, print_execution};

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Flow identifier
    pub flow_id: String,

    /// Input as KEY=VALUE; repeat for more
    #[arg(short, long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, Value)>,
}

#[derive(Args, Clone, Debug)]
pub struct ContinueArgs {
    /// Flow identifier
    pub flow_id: String,

    /// Additional input as KEY=VALUE; repeat for more
    #[arg(short, long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, Value)>,

    /// Start over instead of resuming after the last completed action
    #[arg(long)]
    pub restart: bool,
}

#[derive(Args, Clone, Debug)]
pub struct MissingInputsArgs {
    /// Flow identifier
    pub flow_id: String,

    /// Input already available, as KEY=VALUE
    #[arg(short, long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, Value)>,
}

#[derive(Serialize)]
struct MissingReport {
    flow_id: FlowId,
    missing: BTreeSet<String>,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let flow_id = FlowId::from(args.flow_id);
    let execution = app
        .engine()
        .executor
        .execute_flow(&flow_id, collect_inputs(args.inputs))
        .await
        .with_context(|| format!("running flow {flow_id}"))?;
    emit(ctx.output(), &execution, print_execution)
}

pub async fn cmd_continue(args: ContinueArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let flow_id = FlowId::from(args.flow_id);
    let mode = if args.restart {
        ResumeMode::Restart
    } else {
        ResumeMode::Checkpoint
    };
    let execution = app
        .engine()
        .executor
        .continue_flow_execution(&flow_id, collect_inputs(args.inputs), mode)
        .await
        .with_context(|| format!("continuing flow {flow_id}"))?;
    emit(ctx.output(), &execution, print_execution)
}

pub async fn cmd_missing_inputs(args: MissingInputsArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let flow_id = FlowId::from(args.flow_id);
    let missing = app
        .engine()
        .executor
        .check_missing_inputs(&flow_id, &collect_inputs(args.inputs))
        .await?;
    let report = MissingReport { flow_id, missing };
    emit(ctx.output(), &report, |report| {
        if report.missing.is_empty() {
            println!("Flow {} has every input it needs", report.flow_id);
        } else {
            println!("Flow {} is missing:", report.flow_id);
            for name in &report.missing {
                println!("  {name}");
            }
        }
    })
}
