use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use wfstats_core::AnalysisConfig;
use wfstats_fetch::{AnalyzeError, Analyzer, GithubClient, WorkflowReport};

use crate::cmd::config::token_from_env;
use crate::exit_codes;
use crate::output::{print_error, OutputFormat};

/// Runs the analysis, mapping failures to printed errors and exit codes.
pub async fn run_analysis(config: &AnalysisConfig, format: OutputFormat) -> Result<WorkflowReport, i32> {
    let token = token_from_env();
    if token.is_none() {
        tracing::warn!("no GH_TOKEN or GITHUB_TOKEN set; using unauthenticated requests");
    }

    let client = match GithubClient::new(&config.workflow.host, token) {
        Ok(c) => c,
        Err(e) => {
            print_error(format, &format!("failed to create GitHub client: {e}"));
            return Err(exit_codes::RUNTIME_ERROR);
        }
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling outstanding requests");
            on_signal.cancel();
        }
    });

    let result = Analyzer::new(Arc::new(client)).analyze(config, &cancel).await;
    signal.abort();

    match result {
        Ok(report) => Ok(report),
        Err(AnalyzeError::Config(e)) => {
            print_error(format, &e.to_string());
            Err(exit_codes::CONFIG_ERROR)
        }
        Err(AnalyzeError::Fetch(e)) => {
            print_error(format, &format!("failed to fetch workflow data: {e}"));
            Err(exit_codes::FETCH_FAILED)
        }
    }
}
