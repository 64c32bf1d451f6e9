//! autoping - survey IPv4 ranges with ICMP echo requests.
//!
//! This is the command-line interface for the autoping library.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use autoping::config::timing;
use autoping::{
    read_range_file, FairScheduler, Survey, SurveyConfig, SurveyError, SurveyReport, TimingConfig,
};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Get the version string for autoping
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments for the survey tool.
#[derive(Parser, Debug)]
#[clap(author, version = get_version(), about = "Survey IPv4 ranges with ICMP echo requests", long_about = None)]
struct Args {
    /// File listing one range per line (start,end or CIDR)
    ranges: PathBuf,

    /// File to append reply records to
    #[clap(short, long, default_value = autoping::survey::config::DEFAULT_LOG_PATH)]
    log: PathBuf,

    /// How long to keep listening after the last request, in milliseconds
    #[clap(short, long, default_value_t = timing::DEFAULT_SETTLE_TIME_MS)]
    settle_ms: u64,

    /// Sleep between listener polls that found nothing, in milliseconds
    #[clap(long, default_value_t = timing::DEFAULT_LISTENER_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    /// Print the probe order without sending anything
    #[clap(long)]
    dry_run: bool,

    /// Print a JSON summary when done
    #[clap(long)]
    json: bool,

    /// Enable verbose output (use -vv for per-packet tracing)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// JSON output structure for a finished survey
#[derive(Debug, serde::Serialize)]
struct JsonOutput {
    version: String,
    #[serde(flatten)]
    report: SurveyReport,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info,autoping=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Create single-threaded tokio runtime for lower overhead
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    if let Err(e) = runtime.block_on(async_main(args)) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn async_main(args: Args) -> Result<()> {
    let specs = match read_range_file(&args.ranges) {
        Ok(specs) => specs,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Each line must be 'start,end', a CIDR block, or a single address.");
            std::process::exit(1);
        }
    };

    if args.dry_run {
        return dry_run(&specs);
    }

    if args.poll_interval_ms == 0 {
        eprintln!("Error: poll-interval-ms must be greater than 0");
        std::process::exit(1);
    }

    // Install CLI timings before any config picks up the defaults
    let _ = timing::set_config(TimingConfig {
        listener_poll_interval: Duration::from_millis(args.poll_interval_ms),
        settle_time: Duration::from_millis(args.settle_ms),
        ..TimingConfig::default()
    });

    let config = SurveyConfig::builder()
        .ranges(specs)
        .log_path(&args.log)
        .build();

    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if !args.json {
        println!(
            "autoping {}: {} addresses in {} ranges, logging replies to {}",
            get_version(),
            config.address_count(),
            config.ranges.len(),
            config.log_path.display()
        );
    }

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let report = match Survey::new(config).run_until(shutdown).await {
        Ok(report) => report,
        Err(SurveyError::InsufficientPermissions {
            required,
            suggestion,
        }) => {
            eprintln!("\nError: Insufficient permissions");
            eprintln!("Required: {}", required);
            eprintln!("Suggestion: {}", suggestion);
            std::process::exit(1);
        }
        Err(SurveyError::InvalidRange { start, end }) => {
            eprintln!("\nError: range {} - {} ends before it starts", start, end);
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("survey failed"),
    };

    if args.json {
        let output = JsonOutput {
            version: get_version().to_string(),
            report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        display_text_report(&report);
    }
    Ok(())
}

/// Print every address in probe order without touching the network
fn dry_run(specs: &[autoping::RangeSpec]) -> Result<()> {
    let scheduler = FairScheduler::from_specs(specs).context("invalid range")?;
    let mut stdout = std::io::stdout().lock();
    for addr in scheduler {
        writeln!(stdout, "{}", addr)?;
    }
    Ok(())
}

fn display_text_report(report: &SurveyReport) {
    println!(
        "Sent {} echo requests in {:.3}s",
        report.probes_sent,
        report.send_duration.as_secs_f64()
    );
    println!(
        "Logged {} replies to {} ({} receive errors)",
        report.replies_logged,
        report.log_path.display(),
        report.receive_errors
    );
}
