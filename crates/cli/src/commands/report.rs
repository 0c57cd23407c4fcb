use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use dora_metrics_core::interval::Interval;
use dora_metrics_core::report::{compute_dora_summary, DoraReport, SummaryInput};
use dora_metrics_developer_platforms::snapshot::JsonSnapshotSource;
use dora_metrics_developer_platforms::EventSource;
use tracing::{debug, info, instrument};

use crate::config::load_config;
use crate::errors::CliError;

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

/// Arguments for the report command
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// JSON file with the exported pull requests, deployments and incidents
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start of the reporting interval (RFC 3339)
    #[arg(long)]
    pub from: String,

    /// End of the reporting interval (RFC 3339)
    #[arg(long)]
    pub to: String,

    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Days of events before the interval used to correlate incidents with
    /// earlier deployments
    #[arg(long, default_value_t = 7)]
    pub lookback_days: u32,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

/// Parse an RFC 3339 timestamp given on the command line
fn parse_timestamp(name: &str, value: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            CliError::InvalidArguments(format!(
                "--{} '{}' is not an RFC 3339 timestamp: {}",
                name, value, e
            ))
        })
}

/// Render the report as JSON
fn render(report: &DoraReport, pretty: bool) -> anyhow::Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };

    rendered.context("Failed to serialize the report")
}

/// Compute the report described by `args`
#[instrument(skip_all, fields(input = %args.input.display()))]
pub async fn build_report(args: &ReportArgs) -> Result<DoraReport, CliError> {
    let interval = Interval::new(
        parse_timestamp("from", &args.from)?,
        parse_timestamp("to", &args.to)?,
    )?;
    let config = load_config(args.config.as_deref())?;

    let source = JsonSnapshotSource::new(&args.input);
    let fetch_from = interval.from_time() - Duration::days(i64::from(args.lookback_days));
    let events = source.fetch_events(fetch_from, interval.to_time()).await?;
    debug!(
        pull_requests = events.pull_requests.len(),
        deployments = events.deployments.len(),
        incidents = events.incidents.len(),
        "Fetched events"
    );

    let input = SummaryInput::with_config(events, &config)?;
    Ok(compute_dora_summary(&input, &interval))
}

/// Execute the report command
pub async fn execute(args: ReportArgs) -> Result<(), CliError> {
    let report = build_report(&args).await?;
    let output = render(&report, args.pretty)?;

    info!(
        deployments = report.deployment_frequency.total_deployments,
        "Report generated"
    );
    writeln!(std::io::stdout().lock(), "{}", output)
        .map_err(|e| CliError::OutputError(e.to_string()))?;

    Ok(())
}
