use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Why a probe produced no usable round-trip time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    /// Host name could not be resolved
    Resolve,
    /// Probe tool could not be launched
    Spawn,
    /// Tool exited non-zero without a timeout signature
    Failed,
    /// Tool exited successfully but no round-trip time was found
    Unparseable,
}

/// Outcome of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success { latency_ms: f64 },
    Timeout,
    Error { error: ProbeErrorKind },
}

impl ProbeOutcome {
    pub fn latency_ms(&self) -> Option<f64> {
        match *self {
            Self::Success { latency_ms } => Some(latency_ms),
            _ => None,
        }
    }

    /// Timeouts and errors both count as loss
    pub fn is_loss(&self) -> bool {
        !matches!(self, Self::Success { .. })
    }
}

/// One recorded probe. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeSample {
    pub timestamp: DateTime<Utc>,
    pub outcome: ProbeOutcome,
}

impl ProbeSample {
    pub fn new(outcome: ProbeOutcome) -> Self {
        Self::at(Utc::now(), outcome)
    }

    pub fn at(timestamp: DateTime<Utc>, outcome: ProbeOutcome) -> Self {
        Self { timestamp, outcome }
    }

    /// Successful probe; negative or non-finite latencies are clamped to 0
    pub fn success(latency_ms: f64) -> Self {
        let latency_ms = if latency_ms.is_finite() { latency_ms.max(0.0) } else { 0.0 };
        Self::new(ProbeOutcome::Success { latency_ms })
    }

    pub fn timeout() -> Self {
        Self::new(ProbeOutcome::Timeout)
    }

    pub fn error(error: ProbeErrorKind) -> Self {
        Self::new(ProbeOutcome::Error { error })
    }
}

/// Bounded FIFO ring of probe samples in arrival order
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<ProbeSample>,
    capacity: usize,
}

impl SampleWindow {
    /// Create an empty window. A capacity of 0 is raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    /// Returns the evicted sample, if any.
    pub fn record(&mut self, sample: ProbeSample) -> Option<ProbeSample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// The last `min(n, len)` samples, oldest first
    pub fn recent(&self, n: usize) -> impl DoubleEndedIterator<Item = &ProbeSample> + ExactSizeIterator {
        let start = self.samples.len().saturating_sub(n);
        self.samples.range(start..)
    }

    /// Every stored sample, oldest first
    pub fn all(&self) -> impl DoubleEndedIterator<Item = &ProbeSample> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn last(&self) -> Option<&ProbeSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
