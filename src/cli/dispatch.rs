use anyhow::Result;

use super::actions::cmd_actions;
use super::blocks::cmd_blocks;
use super::commands::Commands;
use super::context::CliContext;
use super::env::CliArgs;
use super::executions::cmd_executions;
use super::flows::cmd_flows;
use super::plan::cmd_plan;
use super::run::{cmd_continue, cmd_missing_inputs, cmd_run};

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Plan(args) => cmd_plan(args, ctx).await,
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Continue(args) => cmd_continue(args, ctx).await,
        Commands::MissingInputs(args) => cmd_missing_inputs(args, ctx).await,
        Commands::Flows(args) => cmd_flows(args, ctx).await,
        Commands::Blocks(args) => cmd_blocks(args, ctx).await,
        Commands::Actions(args) => cmd_actions(args, ctx).await,
        Commands::Executions(args) => cmd_executions(args, ctx).await,
    }
}
