//! Harvest command - download one tile per CSV row.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tileharvest::config::{ConfigFile, HarvestConfig};
use tileharvest::harvest::{
    BatchReport, ErrorKind, HarvestStatsSnapshot, SetupError, TileHarvester,
};
use tileharvest::input::{read_requests, InputColumns, RejectedRow};
use tileharvest::provider::create_provider;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Rejected rows printed before the rest are summarised.
const MAX_REJECTED_SHOWN: usize = 10;

/// Arguments for the harvest command.
pub struct HarvestArgs {
    pub input: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub zoom: Option<u8>,
    pub workers: Option<usize>,
    pub timeout: Option<u64>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub jpeg_quality: Option<u8>,
    pub lat_column: Option<String>,
    pub lon_column: Option<String>,
    pub id_column: Option<String>,
    pub keep_going: bool,
    pub verbose: bool,
    pub debug: bool,
}

/// Run the harvest command.
pub async fn run(args: HarvestArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose, args.debug)?;
    runner.log_startup("harvest");

    let config = build_config(&args, runner.config());
    let columns = build_columns(&args, runner.config());

    let input = read_requests(&args.input, &columns)?;
    println!(
        "Read {} row(s) from {}",
        input.requests.len() + input.rejected.len(),
        args.input.display()
    );
    print_rejected(&input.rejected);

    let provider = create_provider(&config)?;
    let harvester =
        TileHarvester::new(config.clone(), provider)?.with_progress(Arc::new(render_progress));
    harvester
        .store()
        .remove_stale_temp_files()
        .map_err(|e| CliError::Setup(SetupError::Store(e)))?;

    println!(
        "Harvesting {} tile(s) at zoom {} into {} ({} worker(s))",
        input.requests.len(),
        config.zoom(),
        config.output_dir().display(),
        config.workers()
    );
    println!();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight tiles");
            eprintln!("Interrupted: finishing in-flight tiles...");
            interrupt.cancel();
        }
    });

    let start = Instant::now();
    let report = harvester.harvest_batch(input.requests, &cancel).await;
    if report.processed > 0 {
        eprintln!();
    }
    print_summary(&report, start.elapsed(), input.rejected.len());

    if report.persistence_failures > 0 && config.stop_on_persistence_error() {
        return Err(CliError::Persistence {
            failures: report.persistence_failures,
            output_dir: config.output_dir().to_path_buf(),
        });
    }

    info!(
        succeeded = report.succeeded,
        total = report.total,
        "Harvest command complete"
    );
    Ok(())
}

/// Resolve harvest settings: CLI flags over config file over defaults.
fn build_config(args: &HarvestArgs, file: &ConfigFile) -> HarvestConfig {
    let mut config = HarvestConfig::from_config_file(file);

    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(zoom) = args.zoom {
        config = config.with_zoom(zoom);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout(Duration::from_secs(timeout));
    }
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url);
    }
    if let Some(user_agent) = &args.user_agent {
        config = config.with_user_agent(user_agent);
    }
    if let Some(quality) = args.jpeg_quality {
        config = config.with_jpeg_quality(quality);
    }
    if args.keep_going {
        config = config.with_stop_on_persistence_error(false);
    }

    config
}

/// Resolve CSV column names: CLI flags over config file.
fn build_columns(args: &HarvestArgs, file: &ConfigFile) -> InputColumns {
    let mut columns = InputColumns::from(&file.input);

    if let Some(lat) = &args.lat_column {
        columns.lat = lat.clone();
    }
    if let Some(lon) = &args.lon_column {
        columns.lon = lon.clone();
    }
    if let Some(id) = &args.id_column {
        columns.id = Some(id.clone());
    }

    columns
}

/// Redraws the single progress line on stderr.
fn render_progress(snapshot: HarvestStatsSnapshot, total: usize) {
    let mut stderr = std::io::stderr().lock();
    // Progress output is best effort; a closed stderr must not stop the run.
    let _ = write!(stderr, "\r{}", progress_line(&snapshot, total));
    let _ = stderr.flush();
}

fn progress_line(snapshot: &HarvestStatsSnapshot, total: usize) -> String {
    format!(
        "Harvesting tiles: {}/{} ({} ok, {} failed)",
        snapshot.processed(),
        total,
        snapshot.succeeded(),
        snapshot.failed
    )
}

fn print_rejected(rejected: &[RejectedRow]) {
    if rejected.is_empty() {
        return;
    }

    println!("Skipping {} invalid row(s):", rejected.len());
    for row in rejected.iter().take(MAX_REJECTED_SHOWN) {
        println!("  row {}: {}", row.row, row.reason);
    }
    if rejected.len() > MAX_REJECTED_SHOWN {
        println!("  ... and {} more", rejected.len() - MAX_REJECTED_SHOWN);
    }
}

fn print_summary(report: &BatchReport, elapsed: Duration, rejected: usize) {
    println!("Harvest Summary");
    println!("===============");
    println!("  Succeeded:  {}/{}", report.succeeded, report.total);
    println!("    cached:   {}", report.cached);
    println!("    fetched:  {}", report.fetched);
    println!("  Failed:     {}", report.failed);

    for kind in [
        ErrorKind::Addressing,
        ErrorKind::Transport,
        ErrorKind::RemoteStatus,
        ErrorKind::Decode,
        ErrorKind::Persistence,
        ErrorKind::Internal,
    ] {
        let count = report.failures_of(kind);
        if count > 0 {
            println!("    {:<14}{}", format!("{}:", kind), count);
        }
    }

    if report.skipped > 0 {
        println!("  Skipped:    {} (run stopped early)", report.skipped);
    }
    if rejected > 0 {
        println!("  Rejected:   {} input row(s)", rejected);
    }
    println!(
        "  Written:    {:.2} MB in {:.1}s",
        report.bytes_written as f64 / 1_048_576.0,
        elapsed.as_secs_f64()
    );

    if report.cancelled && report.persistence_failures == 0 {
        println!();
        println!("Run was interrupted; re-run the same command to resume.");
    }
}
