use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Target monitored when none is given
pub const DEFAULT_TARGET_HOST: &str = "www.youtube.com";
/// Samples kept in memory
pub const DEFAULT_HISTORY: usize = 300;
/// Initial "recent" window, in probes
pub const DEFAULT_WINDOW_SIZE: usize = 60;
/// Smallest window the controller accepts
pub const MIN_WINDOW_SIZE: usize = 10;
/// Window used for short-term alerts
pub const SHORT_WINDOW_SIZE: usize = 10;
/// Step applied by the window +/- commands
pub const WINDOW_STEP: i64 = 10;

/// Thresholds for the quality rating.
///
/// A tier is reached when loss and average latency are both strictly below its
/// limits; Excellent additionally requires jitter below `excellent_jitter_ms`
/// (or no jitter measurement yet). Nothing is rated until the window holds
/// enough samples; see [`QualityThresholds::min_samples_for`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub excellent_loss_pct: f64,
    pub excellent_avg_ms: f64,
    pub excellent_jitter_ms: f64,
    pub good_loss_pct: f64,
    pub good_avg_ms: f64,
    pub fair_loss_pct: f64,
    pub fair_avg_ms: f64,
    /// Samples required before rating; derived from the window when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_samples: Option<u64>,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            excellent_loss_pct: 1.0,
            excellent_avg_ms: 40.0,
            excellent_jitter_ms: 5.0,
            good_loss_pct: 2.0,
            good_avg_ms: 80.0,
            fair_loss_pct: 5.0,
            fair_avg_ms: 150.0,
            min_samples: None,
        }
    }
}

/// Floor of the derived warm-up sample count
const MIN_RATED_SAMPLES: u64 = 20;

impl QualityThresholds {
    /// Samples the recent window must hold before it is rated: half the
    /// window but at least 20, unless overridden. Never more than the window
    /// itself, so small windows still get a rating once full.
    pub fn min_samples_for(&self, window_size: usize) -> u64 {
        let window = window_size as u64;
        self.min_samples
            .unwrap_or_else(|| (window / 2).max(MIN_RATED_SAMPLES))
            .min(window)
    }
}

/// External command used for a subprocess; the host is appended last
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// `ping -n -c 1 <host>`: one numeric echo request
    pub fn ping() -> Self {
        Self::new("ping", &["-n", "-c", "1"])
    }

    /// `traceroute <host>`
    pub fn traceroute() -> Self {
        Self::new("traceroute", &[])
    }
}

/// Runtime configuration derived from CLI args and preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host name or IP address to monitor
    pub target_host: String,
    /// Interval between probes
    #[serde(with = "duration_serde")]
    pub interval: Duration,
    /// Hard bound on a single probe; strictly shorter than `interval`
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
    /// Capacity of the sample store
    pub history: usize,
    /// Initial recent-window size (clamped into [MIN_WINDOW_SIZE, history])
    pub window_size: usize,
    /// Overall deadline for one trace run
    #[serde(with = "duration_serde")]
    pub trace_timeout: Duration,
    pub ping_command: ToolCommand,
    pub trace_command: ToolCommand,
    pub quality: QualityThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_host: DEFAULT_TARGET_HOST.to_string(),
            interval: Duration::from_secs(1),
            timeout: Duration::from_millis(900),
            history: DEFAULT_HISTORY,
            window_size: DEFAULT_WINDOW_SIZE,
            trace_timeout: Duration::from_secs(300),
            ping_command: ToolCommand::ping(),
            trace_command: ToolCommand::traceroute(),
            quality: QualityThresholds::default(),
        }
    }
}

impl Config {
    /// Config for `host` with every other field at its default
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            target_host: host.into(),
            ..Default::default()
        }
    }

    /// Smallest window size accepted for this capacity
    pub fn min_window(&self) -> usize {
        MIN_WINDOW_SIZE.min(self.history)
    }

    /// Clamp a requested window size into [min_window, history]
    pub fn clamp_window(&self, n: usize) -> usize {
        n.clamp(self.min_window(), self.history)
    }
}

/// Serde helper for Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout_shorter_than_interval() {
        let config = Config::default();
        assert!(config.timeout < config.interval);
    }

    #[test]
    fn test_clamp_window() {
        let config = Config::default();
        assert_eq!(config.clamp_window(0), MIN_WINDOW_SIZE);
        assert_eq!(config.clamp_window(config.history + 50), config.history);
        assert_eq!(config.clamp_window(42), 42);
    }

    #[test]
    fn test_min_window_never_exceeds_tiny_history() {
        let config = Config {
            history: 5,
            ..Default::default()
        };
        assert_eq!(config.min_window(), 5);
        assert_eq!(config.clamp_window(0), 5);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::for_host("1.1.1.1");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"interval\":1.0"));
        let restored: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.target_host, "1.1.1.1");
        assert_eq!(restored.timeout, Duration::from_millis(900));
        assert_eq!(restored.quality, QualityThresholds::default());
    }

    #[test]
    fn test_partial_thresholds_fill_defaults() {
        let thresholds: QualityThresholds = toml::from_str("good_avg_ms = 100.0").unwrap();
        assert_eq!(thresholds.good_avg_ms, 100.0);
        assert_eq!(thresholds.fair_avg_ms, 150.0);
        assert_eq!(thresholds.min_samples, None);
    }

    #[test]
    fn test_min_samples_for_window() {
        let thresholds = QualityThresholds::default();
        assert_eq!(thresholds.min_samples_for(60), 30);
        assert_eq!(thresholds.min_samples_for(30), 20);
        assert_eq!(thresholds.min_samples_for(300), 150);
        // Capped at the window so a 10-sample window is still rated
        assert_eq!(thresholds.min_samples_for(10), 10);

        let fixed = QualityThresholds {
            min_samples: Some(5),
            ..Default::default()
        };
        assert_eq!(fixed.min_samples_for(60), 5);
    }
}
