use crate::cmd::analyze::run_analysis;
use crate::cmd::config::build_analysis_config;
use crate::cmd::render;
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{FilterArgs, LimitArgs, OutputArgs, WorkflowArgs};

pub async fn jobs_cmd(
    workflow: WorkflowArgs,
    filters: FilterArgs,
    limits: LimitArgs,
    top: usize,
    output: OutputArgs,
) -> i32 {
    let format = output.format();
    let config = match build_analysis_config(workflow, filters, &limits, true, top) {
        Ok(c) => c,
        Err(e) => {
            print_error(format, &e.to_string());
            return exit_codes::CONFIG_ERROR;
        }
    };

    let report = match run_analysis(&config, format).await {
        Ok(r) => r,
        Err(code) => return code,
    };

    match format {
        OutputFormat::Json => print_result(format, &report),
        OutputFormat::Text => {
            print!("{}", render::render_report(&config, &report));
            print!("{}", render::render_jobs(&report.job_stats, config.top_jobs));
        }
    }
    exit_codes::SUCCESS
}
