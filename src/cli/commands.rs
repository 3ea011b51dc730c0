use clap::Subcommand;

use super::actions::ActionsArgs;
use super::blocks::BlocksArgs;
use super::executions::ExecutionsArgs;
use super::flows::FlowsArgs;
use super::plan::PlanArgs;
use super::run::{ContinueArgs, MissingInputsArgs, RunArgs};

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Plan a flow from a natural-language goal
    Plan(PlanArgs),

    /// Execute a stored flow from its first action
    Run(RunArgs),

    /// Continue a flow with additional inputs
    Continue(ContinueArgs),

    /// List the required inputs a flow is still missing
    MissingInputs(MissingInputsArgs),

    /// Create and inspect flows
    Flows(FlowsArgs),

    /// Create and inspect website blocks
    Blocks(BlocksArgs),

    /// Inspect and search stored actions
    Actions(ActionsArgs),

    /// Inspect flow execution records
    Executions(ExecutionsArgs),
}
