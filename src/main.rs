use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod prefs;
mod tui;

use cli::Args;
use gms::config::Config;
use gms::export::{export_json, generate_report};
use gms::probe::PingProber;
use gms::state::{ProbeOutcome, TraceStatus};
use gms::{Monitor, MonitorSnapshot};
use prefs::Prefs;
use tui::{Theme, run_tui};

/// How often headless modes look at the monitor
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(&args)?;

    let prefs = Prefs::load();
    let mut config = Config::from(&args);
    if args.window.is_none()
        && let Some(window) = prefs.window_size
    {
        config.window_size = window;
    }
    if let Some(quality) = prefs.quality {
        config.quality = quality;
    }

    let monitor = match Monitor::new(config) {
        Ok(monitor) => monitor,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let prober = PingProber::new(
        monitor.config().ping_command.clone(),
        monitor.config().timeout,
    );
    info!(host = %monitor.config().target_host, "monitor starting");

    // Cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_clone.cancel();
    });

    if args.is_batch_mode() {
        run_batch_mode(&args, monitor, prober, cancel).await
    } else if args.no_tui {
        run_streaming_mode(&args, monitor, prober, cancel).await
    } else {
        run_interactive_mode(&args, prefs, monitor, prober, cancel).await
    }
}

/// Logs go to stderr in headless modes. The TUI owns the terminal, so there
/// they go to `--log-file` or nowhere.
fn init_logging(args: &Args) -> Result<()> {
    let default_level = if args.is_batch_mode() { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if args.no_tui || args.is_batch_mode() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else if let Some(ref path) = args.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

async fn run_interactive_mode(
    args: &Args,
    mut prefs: Prefs,
    monitor: Monitor,
    prober: PingProber,
    cancel: CancellationToken,
) -> Result<()> {
    let probe_handle = monitor.spawn(prober);
    if !args.no_trace {
        monitor.start_trace();
    }

    let theme_name = args
        .theme
        .as_deref()
        .or(prefs.theme.as_deref())
        .unwrap_or("default");
    let language = args.language().or(prefs.language).unwrap_or_default();

    let result = run_tui(&monitor, cancel, Theme::by_name(theme_name), language, args.admin).await;

    monitor.shutdown();
    join_probe_loop(probe_handle).await?;
    let outcome = result?;

    prefs.theme = Some(outcome.theme);
    prefs.language = Some(outcome.language);
    prefs.window_size = Some(outcome.window_size);
    if let Err(e) = prefs.save() {
        warn!(error = %e, "failed to save preferences");
        eprintln!("Warning: failed to save preferences: {}", e);
    }

    Ok(())
}

async fn run_batch_mode(
    args: &Args,
    monitor: Monitor,
    prober: PingProber,
    cancel: CancellationToken,
) -> Result<()> {
    let probe_handle = monitor.spawn(prober);

    let mut interval = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if monitor.snapshot().total_probes >= args.count {
                    break;
                }
            }
        }
    }

    monitor.shutdown();
    join_probe_loop(probe_handle).await?;

    let snapshot = monitor.snapshot();
    if args.json {
        export_json(&snapshot, std::io::stdout())?;
    } else {
        generate_report(&snapshot, std::io::stdout())?;
    }

    Ok(())
}

async fn run_streaming_mode(
    args: &Args,
    monitor: Monitor,
    prober: PingProber,
    cancel: CancellationToken,
) -> Result<()> {
    let probe_handle = monitor.spawn(prober);
    if !args.no_trace {
        monitor.start_trace();
    }

    let mut last_total = 0;
    let mut trace_generation = 0;
    let mut printed_hops = 0;
    let mut trace_reported = false;
    let mut interval = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let snapshot = monitor.snapshot();

                if snapshot.total_probes > last_total {
                    println!("{}", probe_line(&snapshot));
                    last_total = snapshot.total_probes;
                }

                let trace = &snapshot.trace;
                if trace.generation != trace_generation {
                    trace_generation = trace.generation;
                    printed_hops = 0;
                    trace_reported = false;
                }
                for hop in trace.hops.iter().skip(printed_hops) {
                    let host = hop.host.as_deref().or(hop.address.as_deref()).unwrap_or("*");
                    let rtt = hop.rtt_ms.map_or_else(|| "*".to_string(), |ms| format!("{:.2}ms", ms));
                    println!("TRACE {:2}  {:40}  {:>9}", hop.hop_index, host, rtt);
                }
                printed_hops = trace.hops.len();

                if !trace_reported && !matches!(trace.status, TraceStatus::Idle | TraceStatus::Running) {
                    println!(
                        "TRACE {:?}: {} hops, {} without reply",
                        trace.status, trace.summary.hop_count, trace.summary.timeout_count
                    );
                    if let Some(ref failure) = trace.failure {
                        println!("TRACE failure: {:?}", failure);
                    }
                    trace_reported = true;
                }

                if args.count > 0 && snapshot.total_probes >= args.count {
                    break;
                }
            }
        }
    }

    monitor.shutdown();
    join_probe_loop(probe_handle).await?;

    Ok(())
}

async fn join_probe_loop(handle: Option<JoinHandle<()>>) -> Result<()> {
    if let Some(handle) = handle {
        handle.await.context("probe loop panicked")?;
    }
    Ok(())
}

/// One line per probe for `--no-tui`
fn probe_line(snapshot: &MonitorSnapshot) -> String {
    let now = match snapshot.last_sample.map(|s| s.outcome) {
        Some(ProbeOutcome::Success { latency_ms }) => format!("{:.2}ms", latency_ms),
        Some(ProbeOutcome::Timeout) => "timeout".to_string(),
        Some(ProbeOutcome::Error { error }) => format!("error ({:?})", error).to_lowercase(),
        None => "-".to_string(),
    };
    let avg = snapshot
        .recent
        .avg_ms
        .map_or_else(|| "-".to_string(), |ms| format!("{:.2}ms", ms));
    let alert = snapshot
        .alert
        .map(|a| format!("  [{}]", a.key()))
        .unwrap_or_default();

    format!(
        "{}  {}  {:>10}  avg {:>9}  loss {:>5.1}%  {:?}{}",
        snapshot.taken_at.format("%H:%M:%S"),
        snapshot.target_host,
        now,
        avg,
        snapshot.recent.loss_pct,
        snapshot.quality,
        alert
    )
}
