// # dynzone - Dynamic DNS updater
//
// One-shot updater: discovers the public IPv4 address, brings every
// configured Cloudflare record in line with it, then exits.
//
// This binary is a thin integration layer. All update decisions live in
// `dynzone-core`; this crate only wires the pieces together:
// 1. Load `.env`, parse flags, initialize logging
// 2. Load and expand the YAML configuration
// 3. Resolve the current IP (`--ip` or HTTP echo services)
// 4. Run the engine once and render its events
//
// ## Configuration
//
// - `CLOUDFLARE_CONF` / `--config`: YAML file with `auth_tokens`
// - `CLOUDFLARE_CACHE` / `--cache`: JSON cache file (default `cf_cache.json`)
// - `DYNZONE_LOG_LEVEL` / `--log-level`: log level (default `info`)
//
// ## Example
//
// ```bash
// export CLOUDFLARE_CONF=/etc/dynzone/config.yaml
// export CF_TOKEN=your_token
//
// dynzone --dry-run
// ```

mod cli;
mod report;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use dynzone_core::{
    CacheStore, DnsProvider, EngineConfig, FileCacheStore, IpSource, RunSummary, UpdateEngine,
    UpdaterConfig,
};
use dynzone_ip_http::HttpIpSource;
use dynzone_provider_cloudflare::CloudflareProvider;
use std::net::Ipv4Addr;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::Args;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DynzoneExitCode {
    /// Run completed (possibly with reported failures)
    Success = 0,
    /// Configuration error, IP discovery failure or startup failure
    StartupError = 1,
    /// `--fail-on-error` was given and some scope failed
    PartialFailure = 2,
}

impl From<DynzoneExitCode> for ExitCode {
    fn from(code: DynzoneExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    report::configure_colors(args.no_color);

    let log_level = parse_log_level(args.effective_log_level());
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DynzoneExitCode::StartupError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DynzoneExitCode::StartupError.into();
        }
    };

    let result = rt.block_on(run(&args));
    if let Err(e) = &result {
        error!(ok = false, "{} {:#}", report::status_tag(false), e);
    }

    exit_code(&result, args.fail_on_error).into()
}

/// Map the outcome of a run to the process exit code
fn exit_code(result: &Result<RunSummary>, fail_on_error: bool) -> DynzoneExitCode {
    match result {
        Ok(summary) if fail_on_error && summary.has_failures() => DynzoneExitCode::PartialFailure,
        Ok(_) => DynzoneExitCode::Success,
        Err(_) => DynzoneExitCode::StartupError,
    }
}

fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Run one update pass
async fn run(args: &Args) -> Result<RunSummary> {
    let config = settings::load(&args.config)?;
    info!(
        accounts = config.auth_tokens.len(),
        records = config.record_count(),
        "Configuration loaded from {}",
        args.config.display()
    );

    let current_ip = resolve_ip(args).await?;
    info!("Current public IP: {}", current_ip);

    let provider = CloudflareProvider::new()?;
    let cache_store = FileCacheStore::new(&args.cache);

    Ok(reconcile(
        Box::new(provider),
        Box::new(cache_store),
        &config,
        current_ip,
        args.dry_run,
    )
    .await)
}

/// Run the engine once, rendering its events as they arrive
///
/// The reporter is the only writer of per-record status lines; it is
/// drained completely before the closing line is logged.
async fn reconcile(
    provider: Box<dyn DnsProvider>,
    cache_store: Box<dyn CacheStore>,
    config: &UpdaterConfig,
    current_ip: Ipv4Addr,
    dry_run: bool,
) -> RunSummary {
    let engine_config = EngineConfig::default().with_dry_run(dry_run);
    let (mut engine, events) = UpdateEngine::new(provider, cache_store, engine_config).await;
    let reporter = tokio::spawn(report::drain(events));

    let summary = engine
        .update_all(&config.auth_tokens, &current_ip.to_string())
        .await;

    // Dropping the engine closes the channel so the reporter can finish
    drop(engine);
    if let Err(e) = reporter.await {
        debug!("Event reporter stopped abnormally: {}", e);
    }

    info!(
        updated = summary.updated,
        would_update = summary.would_update,
        up_to_date = summary.up_to_date,
        failed = summary.records_failed + summary.records_not_found,
        "Update finished"
    );

    summary
}

/// The `--ip` override, or the first answer from the echo services
async fn resolve_ip(args: &Args) -> Result<Ipv4Addr> {
    if let Some(ip) = args.ip {
        debug!("Using IP from command line");
        return Ok(ip);
    }

    let source = if args.ip_urls.is_empty() {
        HttpIpSource::new()?
    } else {
        HttpIpSource::with_urls(args.ip_urls.clone())?
    };

    source
        .current()
        .await
        .context("Failed to get public IP")
}
