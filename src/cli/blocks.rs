use anyhow::Result;
use clap::{Args, Subcommand};
use flowsmith_core_types::{Action, Block, BlockId};
use serde::Serialize;

use super::context::CliContext;
use super::output::{emit, print_action, print_block};

#[derive(Args, Clone, Debug)]
pub struct BlocksArgs {
    #[command(subcommand)]
    pub command: BlockCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum BlockCommand {
    /// Register a website and let the oracle suggest its actions
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        /// Free-form hints about the actions wanted
        #[arg(long, default_value = "")]
        hints: String,
    },
    /// List stored blocks
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show a block with its actions
    Show { block_id: String },
}

#[derive(Serialize)]
struct BlockView {
    block: Block,
    actions: Vec<Action>,
}

fn print_block_view(view: &BlockView) {
    print_block(&view.block);
    for action in &view.actions {
        print!("  ");
        print_action(action);
    }
}

pub async fn cmd_blocks(args: BlocksArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context().await?;
    let engine = app.engine();
    match args.command {
        BlockCommand::Create { name, url, hints } => {
            let created = engine.block_manager.create_block(&name, &url, &hints).await?;
            let view = BlockView {
                block: created.block,
                actions: created.actions,
            };
            emit(ctx.output(), &view, print_block_view)
        }
        BlockCommand::List { limit } => {
            let blocks = engine.blocks.list(limit).await?;
            emit(ctx.output(), &blocks, |blocks| {
                if blocks.is_empty() {
                    println!("No blocks stored");
                }
                blocks.iter().for_each(print_block);
            })
        }
        BlockCommand::Show { block_id } => {
            let block = engine.blocks.get(&BlockId::from(block_id)).await?;
            let actions = engine.actions.list_by_block(&block.id).await?;
            emit(ctx.output(), &BlockView { block, actions }, print_block_view)
        }
    }
}
