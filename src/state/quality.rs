//! Connection quality rating and short-term alerts.
//!
//! Both are pure functions of a `StatsSnapshot`. They return opaque keys
//! rather than display text; the front end owns the wording.

use serde::{Deserialize, Serialize};

use super::stats::StatsSnapshot;
use crate::config::QualityThresholds;

/// Discrete quality rating of the recent window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Too few samples or no reply yet
    Unknown,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityTier {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Unknown => "QUALITY_UNKNOWN",
            Self::Excellent => "QUALITY_EXCELLENT",
            Self::Good => "QUALITY_GOOD",
            Self::Fair => "QUALITY_FAIR",
            Self::Poor => "QUALITY_POOR",
        }
    }
}

/// Why a tier was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityReason {
    NoSamples,
    /// Window not yet full enough to rate
    WarmingUp,
    NoSuccessfulSamples,
    LowLossLatencyJitter,
    SmallLossModerateLatency,
    NoticeableLossOrLatency,
    HighLossOrLatency,
}

impl QualityReason {
    pub fn key(&self) -> &'static str {
        match self {
            Self::NoSamples => "QUALITY_UNKNOWN_REASON",
            Self::WarmingUp => "QUALITY_WARMING_UP_REASON",
            Self::NoSuccessfulSamples => "QUALITY_NO_REPLY_REASON",
            Self::LowLossLatencyJitter => "QUALITY_EXCELLENT_REASON",
            Self::SmallLossModerateLatency => "QUALITY_GOOD_REASON",
            Self::NoticeableLossOrLatency => "QUALITY_FAIR_REASON",
            Self::HighLossOrLatency => "QUALITY_POOR_REASON",
        }
    }
}

/// Rate the recent window of `window_size` probes. Stays `Unknown` until
/// the window holds `thresholds.min_samples_for(window_size)` samples.
pub fn classify(
    stats: &StatsSnapshot,
    thresholds: &QualityThresholds,
    window_size: usize,
) -> (QualityTier, QualityReason) {
    if stats.count == 0 {
        return (QualityTier::Unknown, QualityReason::NoSamples);
    }
    if stats.count < thresholds.min_samples_for(window_size) {
        return (QualityTier::Unknown, QualityReason::WarmingUp);
    }
    let Some(avg) = stats.avg_ms else {
        return (QualityTier::Unknown, QualityReason::NoSuccessfulSamples);
    };
    let loss = stats.loss_pct;
    let jitter_ok = stats
        .jitter_ms
        .is_none_or(|j| j < thresholds.excellent_jitter_ms);

    if loss < thresholds.excellent_loss_pct && avg < thresholds.excellent_avg_ms && jitter_ok {
        (QualityTier::Excellent, QualityReason::LowLossLatencyJitter)
    } else if loss < thresholds.good_loss_pct && avg < thresholds.good_avg_ms {
        (QualityTier::Good, QualityReason::SmallLossModerateLatency)
    } else if loss < thresholds.fair_loss_pct && avg < thresholds.fair_avg_ms {
        (QualityTier::Fair, QualityReason::NoticeableLossOrLatency)
    } else {
        (QualityTier::Poor, QualityReason::HighLossOrLatency)
    }
}

/// Short-term problem worth flagging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alert {
    DelaySpike,
    HighLoss,
}

impl Alert {
    pub fn key(&self) -> &'static str {
        match self {
            Self::DelaySpike => "ALERT_DELAY_SPIKE",
            Self::HighLoss => "ALERT_HIGH_LOSS",
        }
    }
}

/// Minimum samples in the short window before alerting
const ALERT_MIN_SAMPLES: u64 = 5;
const SPIKE_RATIO: f64 = 3.0;
const SPIKE_MIN_DELTA_MS: f64 = 100.0;
const HIGH_LOSS_PCT: f64 = 10.0;

/// Check the short-term window for a delay spike or elevated loss
pub fn detect_alert(short: &StatsSnapshot) -> Option<Alert> {
    if short.count < ALERT_MIN_SAMPLES {
        return None;
    }

    if let (Some(avg), Some(max)) = (short.avg_ms, short.max_ms)
        && max > SPIKE_RATIO * avg
        && max - avg > SPIKE_MIN_DELTA_MS
    {
        return Some(Alert::DelaySpike);
    }

    (short.loss_pct >= HIGH_LOSS_PCT).then_some(Alert::HighLoss)
}
