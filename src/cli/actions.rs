use anyhow::Result;
use clap::{Args, Subcommand};
use flowsmith_core_types::{Action, ActionId};

use super::context::CliContext;
use super::output::{emit, print_action, print_action_detail};

#[derive(Args, Clone, Debug)]
pub struct ActionsArgs {
    #[command(subcommand)]
    pub command: ActionCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ActionCommand {
    /// List stored actions
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show one action
    Show { action_id: String },
    /// Rank actions by similarity to free text
    Search { text: String },
    /// Find actions registered for a URL
    ByUrl { url: String },
}

fn print_actions(actions: &Vec<Action>) {
    if actions.is_empty() {
        println!("No matching actions");
    }
    actions.iter().for_each(print_action);
}

pub async fn cmd_actions(args: ActionsArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let actions = &app.engine().actions;
    match args.command {
        ActionCommand::List { limit } => emit(ctx.output(), &actions.list(limit).await?, print_actions),
        ActionCommand::Show { action_id } => {
            let action = actions.get(&ActionId::from(action_id)).await?;
            emit(ctx.output(), &action, print_action_detail)
        }
        ActionCommand::Search { text } => {
            emit(ctx.output(), &actions.search(&text).await?, print_actions)
        }
        ActionCommand::ByUrl { url } => {
            emit(ctx.output(), &actions.search_by_url(&url).await?, print_actions)
        }
    }
}
