use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::sanitize_display;

/// Lifecycle of a trace run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    #[default]
    Idle,
    Running,
    Done,
    Failed,
    Cancelled,
}

/// Why a trace ended in `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceFailure {
    /// Trace tool could not be launched; the trace subsystem is unavailable
    Spawn { message: String },
    /// Tool exited unsuccessfully
    Exit { code: Option<i32>, stderr: String },
    /// Run exceeded the overall deadline and was killed
    TimedOut,
    /// Reading the tool's output failed
    Io { message: String },
}

impl TraceFailure {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

/// One parsed hop line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopRecord {
    pub hop_index: u8,
    /// Reverse-resolved name, when the tool printed one
    pub host: Option<String>,
    pub address: Option<String>,
    /// Individual round-trip times, in printed order
    pub rtts: Vec<f64>,
    /// Mean of `rtts`; `None` when every probe of the hop was lost
    pub rtt_ms: Option<f64>,
}

impl HopRecord {
    pub fn is_timeout(&self) -> bool {
        self.rtt_ms.is_none()
    }

    pub fn min_rtt(&self) -> Option<f64> {
        self.rtts.iter().copied().reduce(f64::min)
    }

    pub fn max_rtt(&self) -> Option<f64> {
        self.rtts.iter().copied().reduce(f64::max)
    }
}

/// Running summary of a trace
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Highest hop index seen
    pub hop_count: u8,
    /// Hops with no round-trip time at all
    pub timeout_count: u32,
    pub max_rtt_ms: Option<f64>,
}

impl TraceSummary {
    fn update(&mut self, hop: &HopRecord) {
        self.hop_count = self.hop_count.max(hop.hop_index);
        if hop.is_timeout() {
            self.timeout_count += 1;
        }
        if let Some(max) = hop.max_rtt() {
            self.max_rtt_ms = Some(self.max_rtt_ms.map_or(max, |m| m.max(max)));
        }
    }

    /// Hop indices whose probes all timed out
    pub fn timeout_hops(hops: &[HopRecord]) -> Vec<u8> {
        hops.iter().filter(|h| h.is_timeout()).map(|h| h.hop_index).collect()
    }
}

/// State of the current (or last) trace run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceState {
    pub status: TraceStatus,
    pub hops: Vec<HopRecord>,
    pub summary: TraceSummary,
    pub failure: Option<TraceFailure>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Incremented for every run; lets a stale stream recognise it was superseded
    pub generation: u64,
}

impl TraceState {
    pub fn is_running(&self) -> bool {
        self.status == TraceStatus::Running
    }

    /// Clear the previous run and enter `Running`. Returns the new generation.
    pub fn begin(&mut self) -> u64 {
        let generation = self.generation + 1;
        *self = Self {
            status: TraceStatus::Running,
            started_at: Some(Utc::now()),
            generation,
            ..Default::default()
        };
        generation
    }

    /// Parse one output line into the hop table. Unparseable lines are ignored.
    pub fn apply_line(&mut self, line: &str) -> Option<&HopRecord> {
        let hop = parse_hop_line(line)?;
        self.summary.update(&hop);
        self.hops.push(hop);
        self.hops.last()
    }

    /// Leave `Running`. Hops parsed so far are kept.
    pub fn finish(&mut self, status: TraceStatus, failure: Option<TraceFailure>) {
        self.status = status;
        self.failure = failure;
        self.finished_at = Some(Utc::now());
    }

    /// True if `generation` is the run currently streaming
    pub fn accepts(&self, generation: u64) -> bool {
        self.is_running() && self.generation == generation
    }
}

/// Parse a single traceroute hop line.
///
/// Accepts the classic format, e.g.
/// ` 3  core1.example.net (203.0.113.9)  11.204 ms  10.998 ms *`
/// or ` 4  * * *`, and the Windows `tracert` layout with RTTs first and the
/// responder last. Header and diagnostic lines return `None`.
pub fn parse_hop_line(line: &str) -> Option<HopRecord> {
    let mut tokens = line.split_whitespace().peekable();
    let hop_index: u8 = tokens.next()?.parse().ok()?;
    if hop_index == 0 {
        return None;
    }

    let mut host: Option<String> = None;
    let mut address: Option<String> = None;
    let mut rtts = Vec::new();
    // Set once a `*` or an RTT is read; words after that are usually tool messages
    let mut seen_probe = false;

    while let Some(token) = tokens.next() {
        if token == "*" {
            seen_probe = true;
            continue;
        }
        if token.starts_with('!') {
            continue;
        }

        // "12.3 ms", "<1 ms"
        if let Some(value) = parse_number(token)
            && tokens.peek() == Some(&"ms")
        {
            tokens.next();
            rtts.push(value);
            seen_probe = true;
            continue;
        }
        // "12.3ms"
        if let Some(value) = token.strip_suffix("ms").and_then(parse_number) {
            rtts.push(value);
            seen_probe = true;
            continue;
        }

        // "(10.0.0.1)" from traceroute, "[10.0.0.1]" from tracert
        if let Some(inner) = token
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .or_else(|| token.strip_prefix('[').and_then(|t| t.strip_suffix(']')))
        {
            if address.is_none() {
                address = Some(sanitize_display(inner));
            }
            continue;
        }

        // First bare token is the responder; later responders on the same line are ignored
        if host.is_none() && address.is_none() && (!seen_probe || looks_like_host(token)) {
            host = Some(sanitize_display(token));
        }
    }

    // Numeric output prints the address in the host position
    if address.is_none()
        && let Some(h) = host.as_deref()
        && h.parse::<IpAddr>().is_ok()
    {
        address = host.take();
    }

    let rtt_ms = (!rtts.is_empty()).then(|| rtts.iter().sum::<f64>() / rtts.len() as f64);

    Some(HopRecord {
        hop_index,
        host,
        address,
        rtts,
        rtt_ms,
    })
}

/// An address or a dotted name, as opposed to a word like "Request"
fn looks_like_host(token: &str) -> bool {
    if token.parse::<IpAddr>().is_ok() {
        return true;
    }
    token.contains('.')
        && !token.starts_with('.')
        && !token.ends_with('.')
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
}

fn parse_number(token: &str) -> Option<f64> {
    let value: f64 = token.trim_start_matches('<').parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_hop() {
        let hop = parse_hop_line(" 3  core1.example.net (203.0.113.9)  11.204 ms  10.998 ms  12.001 ms").unwrap();
        assert_eq!(hop.hop_index, 3);
        assert_eq!(hop.host.as_deref(), Some("core1.example.net"));
        assert_eq!(hop.address.as_deref(), Some("203.0.113.9"));
        assert_eq!(hop.rtts, vec![11.204, 10.998, 12.001]);
        assert_eq!(hop.min_rtt(), Some(10.998));
        assert_eq!(hop.max_rtt(), Some(12.001));
    }

    #[test]
    fn test_parse_numeric_hop() {
        let hop = parse_hop_line(" 1  192.168.1.1  1.000 ms  3.000 ms").unwrap();
        assert!(hop.host.is_none());
        assert_eq!(hop.address.as_deref(), Some("192.168.1.1"));
        assert_eq!(hop.rtt_ms, Some(2.0));
    }

    #[test]
    fn test_parse_timeout_hop() {
        let hop = parse_hop_line(" 7  * * *").unwrap();
        assert_eq!(hop.hop_index, 7);
        assert!(hop.host.is_none());
        assert!(hop.address.is_none());
        assert!(hop.is_timeout());
    }

    #[test]
    fn test_parse_partial_loss_and_annotations() {
        let hop = parse_hop_line("12  10.0.0.1  5.5 ms !H * 6.5ms").unwrap();
        assert_eq!(hop.rtts, vec![5.5, 6.5]);
        assert_eq!(hop.address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_parse_windows_style_rtt() {
        let hop = parse_hop_line("  2    <1 ms    <1 ms     1 ms  10.1.1.1").unwrap();
        assert_eq!(hop.rtts, vec![1.0, 1.0, 1.0]);
        assert_eq!(hop.address.as_deref(), Some("10.1.1.1"));

        let hop = parse_hop_line("  4    12 ms    11 ms    13 ms  edge.example.net [203.0.113.7]").unwrap();
        assert_eq!(hop.host.as_deref(), Some("edge.example.net"));
        assert_eq!(hop.address.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_parse_windows_timeout_message_is_not_a_host() {
        let hop = parse_hop_line("  3     *        *        *     Request timed out.").unwrap();
        assert_eq!(hop.hop_index, 3);
        assert!(hop.host.is_none());
        assert!(hop.address.is_none());
        assert!(hop.is_timeout());

        let hop = parse_hop_line(" 5  10.0.0.9  reports: Destination host unreachable.").unwrap();
        assert_eq!(hop.address.as_deref(), Some("10.0.0.9"));
        assert!(hop.host.is_none());
    }

    #[test]
    fn test_ignores_non_hop_lines() {
        assert!(parse_hop_line("traceroute to example.com (93.184.216.34), 30 hops max, 60 byte packets").is_none());
        assert!(parse_hop_line("").is_none());
        assert!(parse_hop_line("traceroute: unknown host nowhere").is_none());
        assert!(parse_hop_line(" 0  10.0.0.1  1 ms").is_none());
    }

    #[test]
    fn test_strips_control_characters() {
        let hop = parse_hop_line(" 1  evil\u{1b}[2Jhost (10.0.0.1)  1 ms").unwrap();
        assert_eq!(hop.host.as_deref(), Some("evil[2Jhost"));
    }

    #[test]
    fn test_summary_with_timeout_hop() {
        let mut state = TraceState::default();
        state.begin();
        state.apply_line(" 1  10.0.0.1  4.0 ms");
        state.apply_line(" 2  * * *");
        state.apply_line(" 3  10.0.0.3  9.5 ms");

        assert_eq!(state.hops.len(), 3);
        assert_eq!(state.summary.hop_count, 3);
        assert_eq!(state.summary.timeout_count, 1);
        assert_eq!(state.summary.max_rtt_ms, Some(9.5));
        assert_eq!(TraceSummary::timeout_hops(&state.hops), vec![2]);
    }

    #[test]
    fn test_apply_line_ignores_garbage() {
        let mut state = TraceState::default();
        state.begin();
        assert!(state.apply_line("traceroute to x (1.2.3.4), 30 hops max").is_none());
        assert!(state.hops.is_empty());
        assert_eq!(state.summary, TraceSummary::default());
    }

    #[test]
    fn test_begin_resets_and_bumps_generation() {
        let mut state = TraceState::default();
        let first = state.begin();
        state.apply_line(" 1  10.0.0.1  1 ms");
        state.finish(TraceStatus::Done, None);
        assert!(!state.accepts(first));

        let second = state.begin();
        assert_eq!(second, first + 1);
        assert!(state.hops.is_empty());
        assert!(state.accepts(second));
        assert!(!state.accepts(first));
    }

    #[test]
    fn test_finish_keeps_partial_hops() {
        let mut state = TraceState::default();
        state.begin();
        state.apply_line(" 1  10.0.0.1  1 ms");
        state.finish(TraceStatus::Failed, Some(TraceFailure::TimedOut));
        assert_eq!(state.hops.len(), 1);
        assert!(state.finished_at.is_some());
        assert!(!state.failure.as_ref().unwrap().is_unavailable());
    }
}
