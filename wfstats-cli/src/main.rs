use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(
    name = "workflow-stats",
    version,
    about = "Statistics for GitHub Actions workflow runs and jobs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    output: OutputArgs,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.output);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command, cli.output));
    std::process::exit(exit_code);
}

fn init_tracing(output: &OutputArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(output.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_command(command: Command, output: OutputArgs) -> i32 {
    match command {
        Command::Runs {
            workflow,
            filters,
            limits,
        } => cmd::runs::runs_cmd(workflow, filters, limits, output).await,
        Command::Jobs {
            workflow,
            filters,
            limits,
            top,
        } => cmd::jobs::jobs_cmd(workflow, filters, limits, top, output).await,
    }
}
