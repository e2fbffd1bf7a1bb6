use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Config, SHORT_WINDOW_SIZE};
use crate::state::{
    Alert, MonitorState, ProbeSample, QualityReason, QualityTier, StatsSnapshot, SubsystemStatus,
    TraceState, aggregate, classify, detect_alert,
};

/// Consistent read-only view of the monitor at one instant.
///
/// Carries data only; formatting and wording belong to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub taken_at: DateTime<Utc>,
    pub target_host: String,
    pub paused: bool,
    pub window_size: usize,
    pub min_window: usize,
    pub capacity: usize,
    pub probe_status: SubsystemStatus,
    /// Probes recorded since start, including ones before a session reset
    pub total_probes: u64,
    pub last_sample: Option<ProbeSample>,
    /// Last `window_size` samples
    pub recent: StatsSnapshot,
    /// Everything since start or the last reset
    pub session: StatsSnapshot,
    /// Last few samples, used for alerts
    pub short_term: StatsSnapshot,
    pub quality: QualityTier,
    pub quality_reason: QualityReason,
    pub alert: Option<Alert>,
    /// Latencies of the recent window, oldest first; `None` marks a lost probe
    pub history: Vec<Option<f64>>,
    pub trace: TraceState,
}

impl MonitorSnapshot {
    /// Build a snapshot from a locked state. Cost is O(window_size + hops).
    pub fn capture(state: &MonitorState, config: &Config) -> Self {
        let recent = aggregate(state.samples.recent(state.window_size));
        let short_term = aggregate(state.samples.recent(SHORT_WINDOW_SIZE));
        let (quality, quality_reason) = classify(&recent, &config.quality, state.window_size);

        Self {
            taken_at: Utc::now(),
            target_host: state.target_host.clone(),
            paused: state.paused,
            window_size: state.window_size,
            min_window: config.min_window(),
            capacity: state.samples.capacity(),
            probe_status: state.probe_status,
            total_probes: state.total_probes,
            last_sample: state.samples.last().copied(),
            recent,
            session: state.session.snapshot(),
            short_term,
            quality,
            quality_reason,
            alert: detect_alert(&short_term),
            history: state
                .samples
                .recent(state.window_size)
                .map(|s| s.outcome.latency_ms())
                .collect(),
            trace: state.trace.clone(),
        }
    }
}
