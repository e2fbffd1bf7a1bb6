//! Owns the shared state, drives periodic probing and exposes every control
//! operation the front end needs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::snapshot::MonitorSnapshot;
use crate::config::Config;
use crate::error::{MonitorError, validate_host};
use crate::probe::Prober;
use crate::state::{
    ProbeErrorKind, ProbeOutcome, ProbeSample, SharedState, SubsystemStatus, new_shared_state,
};
use crate::trace::TraceRunner;

/// Control messages a front end can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    Pause,
    Resume,
    TogglePause,
    StartTrace,
    StopTrace,
    SetWindowSize(usize),
    AdjustWindow(i64),
    ResetSession,
}

/// Monitoring session for one target host
pub struct Monitor {
    config: Config,
    state: SharedState,
    trace: TraceRunner,
    shutdown: CancellationToken,
    /// Set once the probe loop has been spawned
    probing: AtomicBool,
}

impl Monitor {
    /// Validate `config` and build an idle monitor. Nothing runs until
    /// [`Monitor::spawn`] is called.
    pub fn new(config: Config) -> Result<Self, MonitorError> {
        validate_host(&config.target_host)?;
        if config.interval.is_zero() {
            return Err(MonitorError::InvalidConfig("probe interval must be positive".into()));
        }
        if config.timeout.is_zero() || config.timeout >= config.interval {
            return Err(MonitorError::InvalidConfig(format!(
                "probe timeout ({:?}) must be positive and shorter than the interval ({:?})",
                config.timeout, config.interval
            )));
        }
        if config.history == 0 {
            return Err(MonitorError::InvalidConfig("history must hold at least one sample".into()));
        }
        if config.trace_timeout.is_zero() {
            return Err(MonitorError::InvalidConfig("trace timeout must be positive".into()));
        }

        let state = new_shared_state(&config);
        let shutdown = CancellationToken::new();
        let trace = TraceRunner::new(
            state.clone(),
            config.trace_command.clone(),
            config.trace_timeout,
            shutdown.clone(),
        );

        Ok(Self {
            config,
            state,
            trace,
            shutdown,
            probing: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared state handle, for readers that need more than a snapshot
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Start the periodic probe task. At most one probe is in flight at a time;
    /// ticks missed while a probe runs are skipped.
    ///
    /// Only one probe loop runs per monitor: later calls return `None` and
    /// drop `prober`.
    pub fn spawn<P: Prober + 'static>(&self, prober: P) -> Option<JoinHandle<()>> {
        if self.probing.swap(true, Ordering::SeqCst) {
            debug!("probe loop already running");
            return None;
        }
        Some(tokio::spawn(probe_loop(
            prober,
            self.state.clone(),
            self.config.interval,
            self.shutdown.clone(),
        )))
    }

    /// Record a finished probe. Returns `false` if it was discarded because
    /// the monitor is paused.
    pub fn record(&self, sample: ProbeSample) -> bool {
        record_sample(&self.state, sample)
    }

    /// Stop inserting samples. Returns `false` if already paused.
    pub fn pause(&self) -> bool {
        let mut state = self.state.write();
        if state.paused {
            return false;
        }
        state.paused = true;
        info!("monitoring paused");
        true
    }

    /// Returns `false` if not paused
    pub fn resume(&self) -> bool {
        let mut state = self.state.write();
        if !state.paused {
            return false;
        }
        state.paused = false;
        info!("monitoring resumed");
        true
    }

    /// Flip the pause flag; returns the new value
    pub fn toggle_pause(&self) -> bool {
        let mut state = self.state.write();
        state.paused = !state.paused;
        info!(paused = state.paused, "pause toggled");
        state.paused
    }

    pub fn is_paused(&self) -> bool {
        self.state.read().paused
    }

    /// Set the recent-window size, clamped into [min_window, history].
    /// Returns the size actually applied.
    pub fn set_window_size(&self, requested: usize) -> usize {
        let applied = self.config.clamp_window(requested);
        self.state.write().window_size = applied;
        debug!(requested, applied, "window size set");
        applied
    }

    /// Grow or shrink the recent window by `delta`, clamped like
    /// [`Monitor::set_window_size`]
    pub fn adjust_window(&self, delta: i64) -> usize {
        let mut state = self.state.write();
        let current = state.window_size;
        let magnitude = usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX);
        let requested = if delta < 0 {
            current.saturating_sub(magnitude)
        } else {
            current.saturating_add(magnitude)
        };
        state.window_size = self.config.clamp_window(requested);
        debug!(delta, applied = state.window_size, "window size adjusted");
        state.window_size
    }

    /// Forget all samples and session totals. Trace results are kept.
    pub fn reset_session(&self) {
        self.state.write().reset_session();
        info!("session reset");
    }

    /// Start a trace; no-op returning `false` if one is already running
    pub fn start_trace(&self) -> bool {
        self.trace.start()
    }

    /// Cancel the running trace; no-op returning `false` if none is running
    pub fn stop_trace(&self) -> bool {
        self.trace.stop()
    }

    /// Apply a front-end command. Returns whether it changed anything.
    pub fn apply(&self, command: MonitorCommand) -> bool {
        match command {
            MonitorCommand::Pause => self.pause(),
            MonitorCommand::Resume => self.resume(),
            MonitorCommand::TogglePause => {
                self.toggle_pause();
                true
            }
            MonitorCommand::StartTrace => self.start_trace(),
            MonitorCommand::StopTrace => self.stop_trace(),
            MonitorCommand::SetWindowSize(n) => {
                let before = self.state.read().window_size;
                self.set_window_size(n) != before
            }
            MonitorCommand::AdjustWindow(delta) => {
                let before = self.state.read().window_size;
                self.adjust_window(delta) != before
            }
            MonitorCommand::ResetSession => {
                self.reset_session();
                true
            }
        }
    }

    /// Consistent view of everything, taken under one read lock
    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.read();
        MonitorSnapshot::capture(&state, &self.config)
    }

    /// Stop probing and cancel any running trace
    pub fn shutdown(&self) {
        self.trace.stop();
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn probe_loop<P: Prober>(
    prober: P,
    state: SharedState,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(host) = next_target(&state) else {
                    continue;
                };

                let sample = tokio::select! {
                    _ = cancel.cancelled() => break,
                    sample = prober.probe(&host) => sample,
                };
                record_sample(&state, sample);
            }
        }
    }

    debug!("probe loop stopped");
}

/// Host to probe on this tick, or `None` while paused
fn next_target(state: &SharedState) -> Option<String> {
    let state = state.read();
    (!state.paused).then(|| state.target_host.clone())
}

fn record_sample(state: &SharedState, sample: ProbeSample) -> bool {
    let mut state = state.write();
    if state.paused {
        return false;
    }

    let spawn_failed = matches!(
        sample.outcome,
        ProbeOutcome::Error { error: ProbeErrorKind::Spawn }
    );
    match (spawn_failed, state.probe_status) {
        (true, SubsystemStatus::Available) => {
            error!(host = %state.target_host, "ping could not be started; probing unavailable");
            state.probe_status = SubsystemStatus::Unavailable;
        }
        (false, SubsystemStatus::Unavailable) => {
            info!(host = %state.target_host, "ping available again");
            state.probe_status = SubsystemStatus::Available;
        }
        _ => {}
    }

    state.record(sample);
    true
}
