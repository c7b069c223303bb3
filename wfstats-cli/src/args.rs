use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Print the report as JSON.
    #[arg(long, global = true)]
    pub json: bool,
    /// Log phase summaries to stderr.
    #[arg(long, global = true)]
    pub verbose: bool,
    /// Log every request to stderr.
    #[arg(long, global = true)]
    pub debug: bool,
}

impl OutputArgs {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    /// Log filter used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.json {
            "off"
        } else if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct WorkflowArgs {
    /// GitHub host, e.g. github.example.com for GitHub Enterprise Server.
    #[arg(long, short = 'H', env = "GH_HOST", default_value = "github.com")]
    pub host: String,
    #[arg(long, short = 'o')]
    pub org: Option<String>,
    #[arg(long, short = 'r')]
    pub repo: Option<String>,
    /// Workflow file name, e.g. ci.yaml.
    #[arg(long, short = 'f', conflicts_with = "id")]
    pub file: Option<String>,
    /// Numeric workflow id.
    #[arg(long, short = 'i')]
    pub id: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct FilterArgs {
    /// Fetch every page instead of only the first.
    #[arg(long, short = 'A')]
    pub all: bool,
    #[arg(long, short = 'a')]
    pub actor: Option<String>,
    #[arg(long, short = 'b')]
    pub branch: Option<String>,
    #[arg(long, short = 'e')]
    pub event: Option<String>,
    /// Keep runs whose status or conclusion matches (comma separated).
    #[arg(long, short = 's', value_delimiter = ',')]
    pub status: Vec<String>,
    /// Creation date filter, e.g. ">=2024-01-01".
    #[arg(long, short = 'c')]
    pub created: Option<String>,
    #[arg(long, short = 'S')]
    pub head_sha: Option<String>,
    #[arg(long, short = 'x')]
    pub exclude_pull_requests: bool,
    #[arg(long, short = 'C')]
    pub check_suite_id: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct LimitArgs {
    /// Simultaneous API requests (default: min(cpus, 5)).
    #[arg(long)]
    pub max_concurrency: Option<usize>,
    /// Ceiling on stored samples per conclusion bucket.
    #[arg(long, default_value_t = 10_000)]
    pub sample_limit: usize,
}
