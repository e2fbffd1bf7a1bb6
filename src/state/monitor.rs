use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::sample::{ProbeSample, SampleWindow};
use super::stats::StatsAccumulator;
use super::trace::TraceState;
use crate::config::Config;

/// Whether a subprocess-backed subsystem can currently run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsystemStatus {
    #[default]
    Available,
    /// The tool could not be launched
    Unavailable,
}

/// Everything the monitor knows. Only the controller and trace runner mutate it,
/// always through `SharedState`.
#[derive(Debug)]
pub struct MonitorState {
    pub target_host: String,
    pub paused: bool,
    pub window_size: usize,
    pub samples: SampleWindow,
    /// Whole-session totals; survive eviction from `samples`
    pub session: StatsAccumulator,
    pub probe_status: SubsystemStatus,
    pub trace: TraceState,
    /// Samples recorded since start; not cleared by `reset_session`
    pub total_probes: u64,
}

impl MonitorState {
    pub fn new(config: &Config) -> Self {
        Self {
            target_host: config.target_host.clone(),
            paused: false,
            window_size: config.clamp_window(config.window_size),
            samples: SampleWindow::with_capacity(config.history),
            session: StatsAccumulator::new(),
            probe_status: SubsystemStatus::Available,
            trace: TraceState::default(),
            total_probes: 0,
        }
    }

    /// Store a sample in the window and the session totals
    pub fn record(&mut self, sample: ProbeSample) {
        self.session.record(&sample.outcome);
        self.samples.record(sample);
        self.total_probes += 1;
    }

    /// Drop all samples and session totals
    pub fn reset_session(&mut self) {
        self.samples.clear();
        self.session.reset();
    }
}

/// The single serialization point shared by the probe loop, the trace stream
/// and snapshot readers
pub type SharedState = Arc<RwLock<MonitorState>>;

pub fn new_shared_state(config: &Config) -> SharedState {
    Arc::new(RwLock::new(MonitorState::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::stats::aggregate;

    #[test]
    fn test_initial_window_is_clamped() {
        let config = Config {
            window_size: 5000,
            ..Default::default()
        };
        let state = MonitorState::new(&config);
        assert_eq!(state.window_size, config.history);
        assert!(!state.paused);
    }

    #[test]
    fn test_session_matches_window_until_eviction() {
        let config = Config {
            history: 4,
            ..Default::default()
        };
        let mut state = MonitorState::new(&config);
        for ms in [10.0, 12.0, 11.0] {
            state.record(ProbeSample::success(ms));
        }
        state.record(ProbeSample::timeout());
        assert_eq!(state.session.snapshot(), aggregate(state.samples.all()));

        // Fifth sample evicts the first; session still counts it
        state.record(ProbeSample::success(13.0));
        assert_eq!(state.samples.len(), 4);
        assert_eq!(state.session.snapshot().count, 5);
        assert_eq!(state.session.snapshot().min_ms, Some(10.0));
    }

    #[test]
    fn test_reset_session() {
        let mut state = MonitorState::new(&Config::default());
        state.record(ProbeSample::success(1.0));
        state.reset_session();
        assert!(state.samples.is_empty());
        assert_eq!(state.session.snapshot().count, 0);
        assert_eq!(state.total_probes, 1);
    }
}
