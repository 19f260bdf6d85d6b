//! dashboard-admins CLI - bulk add, modify and delete dashboard administrators
//!
//! ```bash
//! dashboard-admins admins.csv <api-key>               # list queue, confirm, submit
//! dashboard-admins admins.csv <api-key> --no-confirm  # submit without prompting
//! dashboard-admins admins.csv --dry-run               # offline validation only
//! ```
//!
//! Exit status: 0 when the run completes (per-record failures included),
//! 1 on fatal input or configuration errors, 2 when the run stopped early
//! and left records unattempted.

use clap::Parser;
use dashboard_admins::pipeline::{self, EXIT_FATAL, EXIT_OK};
use dashboard_admins::report::{log_info, log_warning, logs::LOG_BROADCASTER, print_dry_run};
use dashboard_admins::{print_queue_summary, ConfigError, HttpDashboard, RunConfig, RunError};
use dialoguer::Confirm;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dashboard-admins")]
#[command(about = "Add, modify and delete dashboard administrators from a CSV file", long_about = None)]
struct Cli {
    /// Input CSV file
    csv: PathBuf,

    /// Dashboard API key (not needed with --dry-run)
    api_key: Option<String>,

    /// Submit without listing the queue and asking for confirmation
    #[arg(long)]
    no_confirm: bool,

    /// Result log for accepted and skipped records
    #[arg(long = "logsuccess", value_name = "FILE")]
    success_log: Option<PathBuf>,

    /// Result log for failed and unattempted records
    #[arg(long = "logfail", value_name = "FILE")]
    fail_log: Option<PathBuf>,

    /// API root (default: $DASHBOARD_BASE_URL or the public dashboard)
    #[arg(long)]
    base_url: Option<String>,

    /// Overall deadline for the run, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Organizations processed at the same time
    #[arg(long)]
    org_concurrency: Option<usize>,

    /// Keep going after a transport failure instead of stopping the run
    #[arg(long)]
    no_abort: bool,

    /// Build the queue and validate offline, without sending requests
    #[arg(long)]
    dry_run: bool,

    /// Only write result logs, no console output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig, ConfigError> {
        let mut config = RunConfig::new(self.csv).from_env()?;

        config.api_key = self.api_key;
        config.confirm = !self.no_confirm;
        config.dry_run = self.dry_run;
        config.quiet = self.quiet;
        config.abort_on_transport_error = !self.no_abort;
        config.timeout = self.timeout.map(Duration::from_secs);
        if let Some(url) = self.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = self.success_log {
            config.success_log = path;
        }
        if let Some(path) = self.fail_log {
            config.fail_log = path;
        }
        if let Some(n) = self.org_concurrency {
            config.org_concurrency = n.max(1);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(EXIT_FATAL);
        }
    }
}

async fn run(cli: Cli) -> Result<i32, RunError> {
    let config = cli.into_config()?;
    LOG_BROADCASTER.set_echo(!config.quiet);

    let queue = pipeline::load_queue(&config.csv_path)?;
    if queue.is_empty() {
        log_warning("No admin records found, nothing to do");
        return Ok(EXIT_OK);
    }

    if config.dry_run {
        print_queue_summary(&queue);
        let failures = print_dry_run(&queue);
        log_info(format!(
            "🔎 Dry run: {} of {} record(s) would fail before reaching the dashboard",
            failures,
            queue.record_count()
        ));
        return Ok(EXIT_OK);
    }

    if config.confirm {
        print_queue_summary(&queue);
        let proceed = Confirm::new()
            .with_prompt("Submit these requests?")
            .default(false)
            .interact()
            .map_err(|e| RunError::Prompt(e.to_string()))?;
        if !proceed {
            log_info("Cancelled, no requests sent");
            return Ok(EXIT_OK);
        }
    }

    let api_key = config.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
    let api = HttpDashboard::new(&config.base_url, api_key, config.request_timeout)?;

    let report = pipeline::dispatch_queue(&api, &queue, config.dispatch_options()).await;
    pipeline::finish(&report, &config)?;

    Ok(pipeline::exit_code(&report))
}
