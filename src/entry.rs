use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::info;

use crate::aggregate::{AggregateStore, LogLineParser};
use crate::args::ExporterArgs;
use crate::config::{ExporterSettings, apply_config, load_config, resolve_settings};
use crate::error::AppResult;
use crate::scan::CycleScheduler;
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};
use crate::storage::S3Connector;
use crate::summary::print_summary;

/// Parses arguments, merges configuration and runs the exporter until it
/// is interrupted (or after one cycle with `--once`).
///
/// # Errors
///
/// Returns an error when arguments or configuration are invalid, or when
/// the runtime or HTTP client cannot be built.
pub fn run() -> AppResult<()> {
    let (mut args, matches) = parse_args()?;

    crate::logger::init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    if let Some(config) = config.as_ref() {
        apply_config(&mut args, &matches, config)?;
    }
    let settings = resolve_settings(&args, config.as_ref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(settings))
}

fn parse_args() -> AppResult<(ExporterArgs, ArgMatches)> {
    let matches = ExporterArgs::command().get_matches();
    let args = ExporterArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

async fn run_async(settings: ExporterSettings) -> AppResult<()> {
    let connector = Arc::new(S3Connector::new(settings.client)?);
    let store = Arc::new(AggregateStore::new());
    let scheduler = CycleScheduler::new(
        &settings.scan,
        settings.endpoints,
        connector,
        Arc::clone(&store),
        LogLineParser::new()?,
    );

    if settings.once {
        let report = scheduler.run_cycle().await;
        return print_summary(settings.output_format, &report, &store.snapshot());
    }

    info!(
        "Scanning every {:?} with up to {} concurrent requests.",
        settings.scan.cycle_interval, settings.scan.max_concurrency
    );
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    scheduler.run(&mut shutdown_rx).await;
    signal_handle.abort();
    info!("Stopped.");
    Ok(())
}
