use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use flowsmith_core_types::{ActionId, ActionRef, FlowId};

use super::context::CliContext;
use super::output::{emit, print_flow};

#[derive(Args, Clone, Debug)]
pub struct FlowsArgs {
    #[command(subcommand)]
    pub command: FlowCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum FlowCommand {
    /// Store a flow from existing actions, in execution order
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Action identifier; repeat in execution order
        #[arg(long = "action", required = true)]
        actions: Vec<String>,
    },
    /// List stored flows
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show one flow
    Show { flow_id: String },
}

pub async fn cmd_flows(args: FlowsArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let engine = app.engine();
    match args.command {
        FlowCommand::Create {
            name,
            description,
            actions,
        } => {
            let mut refs = Vec::with_capacity(actions.len());
            for id in actions {
                let action = engine
                    .actions
                    .get(&ActionId::from(id))
                    .await
                    .context("flows may only reference stored actions")?;
                refs.push(ActionRef::from(action.id));
            }
            let flow = engine.flows.create_flow(name, description, refs).await?;
            emit(ctx.output(), &flow, print_flow)
        }
        FlowCommand::List { limit } => {
            let flows = engine.flows.list_flows(limit).await?;
            emit(ctx.output(), &flows, |flows| {
                if flows.is_empty() {
                    println!("No flows stored");
                    return;
                }
                println!("{:<38} {:<8} {}", "FLOW ID", "ACTIONS", "NAME");
                for flow in flows {
                    println!("{:<38} {:<8} {}", flow.id, flow.actions.len(), flow.name);
                }
            })
        }
        FlowCommand::Show { flow_id } => {
            let flow = engine.flows.get_flow(&FlowId::from(flow_id)).await?;
            emit(ctx.output(), &flow, print_flow)
        }
    }
}
