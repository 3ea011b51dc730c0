use anyhow::Result;
use clap::{Args, Subcommand};
use flowsmith_core_types::{ExecutionId, ExecutionStatus, FlowId};

use super::context::CliContext;
use super::output::{emit, print_execution};

#[derive(Args, Clone, Debug)]
pub struct ExecutionsArgs {
    #[command(subcommand)]
    pub command: ExecutionCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ExecutionCommand {
    /// List execution records
    List {
        /// Only executions of this flow
        #[arg(long)]
        flow: Option<String>,
        /// Only executions in this status (pending, running, completed, failed)
        #[arg(long)]
        status: Option<ExecutionStatus>,
    },
    /// Show one execution with its action executions
    Show { execution_id: String },
}

pub async fn cmd_executions(args: ExecutionsArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let flows = &app.engine().flows;
    match args.command {
        ExecutionCommand::List { flow, status } => {
            let flow = flow.map(FlowId::from);
            let executions = flows.list_executions(flow.as_ref(), status).await?;
            emit(ctx.output(), &executions, |executions| {
                if executions.is_empty() {
                    println!("No executions recorded");
                    return;
                }
                println!("{:<38} {:<38} {:<10} {}", "EXECUTION ID", "FLOW ID", "STATUS", "STEPS");
                for execution in executions {
                    println!(
                        "{:<38} {:<38} {:<10} {}",
                        execution.id,
                        execution.flow_id,
                        execution.status,
                        execution.action_executions.len()
                    );
                }
            })
        }
        ExecutionCommand::Show { execution_id } => {
            let execution = flows.get_execution(&ExecutionId::from(execution_id)).await?;
            emit(ctx.output(), &execution, print_execution)
        }
    }
}
