use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run counts, conclusion rates and execution times.
    Runs {
        #[command(flatten)]
        workflow: WorkflowArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Run statistics plus per-job and per-step statistics.
    Jobs {
        #[command(flatten)]
        workflow: WorkflowArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        limits: LimitArgs,
        /// How many jobs to list in each ranking.
        #[arg(long, short = 'n', default_value_t = 3)]
        top: usize,
    },
}
