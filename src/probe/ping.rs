//! Single-shot reachability probe using the system `ping`.
//!
//! Each probe spawns one short-lived child, waits for it under a hard timeout
//! and parses the round-trip time out of its text output. Output grammar
//! differs between platforms, so parsing is substring based and anything
//! unrecognised becomes an error sample rather than a failure.

use chrono::Utc;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

use super::Prober;
use crate::config::ToolCommand;
use crate::state::{ProbeErrorKind, ProbeOutcome, ProbeSample};

/// Output fragments meaning the echo request got no reply
const TIMEOUT_SIGNATURES: &[&str] = &[
    "100% packet loss",
    "100.0% packet loss",
    " 0 received",
    " 0 packets received",
    "Request timed out",
    "Request timeout for icmp_seq",
    "Destination Host Unreachable",
    "Destination host unreachable",
    "Destination Net Unreachable",
];

/// Output fragments meaning the host name did not resolve
const RESOLVE_SIGNATURES: &[&str] = &[
    "unknown host",
    "Unknown host",
    "Name or service not known",
    "cannot resolve",
    "Temporary failure in name resolution",
    "could not find host",
    "No address associated with hostname",
    "nodename nor servname provided",
];

/// Probe runner backed by an external ping command
#[derive(Debug, Clone)]
pub struct PingProber {
    command: ToolCommand,
    timeout: Duration,
}

impl PingProber {
    pub fn new(command: ToolCommand, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Prober for PingProber {
    async fn probe(&self, host: &str) -> ProbeSample {
        let started = Utc::now();

        let child = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!(program = %self.command.program, error = %e, "failed to spawn ping");
                return ProbeSample::at(started, ProbeOutcome::Error { error: ProbeErrorKind::Spawn });
            }
        };

        // On expiry the future is dropped, which kills the child
        let outcome = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Err(_) => {
                trace!(host, timeout = ?self.timeout, "ping exceeded hard timeout");
                ProbeOutcome::Timeout
            }
            Ok(Err(e)) => {
                debug!(host, error = %e, "failed to collect ping output");
                ProbeOutcome::Error { error: ProbeErrorKind::Failed }
            }
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                parse_ping_output(&stdout, &stderr, output.status.success())
            }
        };

        ProbeSample::at(started, outcome)
    }
}

/// Classify the output of one ping invocation
pub fn parse_ping_output(stdout: &str, stderr: &str, exit_ok: bool) -> ProbeOutcome {
    if exit_ok && let Some(latency_ms) = find_rtt(stdout) {
        return ProbeOutcome::Success { latency_ms };
    }

    let matches_any = |signatures: &[&str]| {
        signatures
            .iter()
            .any(|sig| stdout.contains(sig) || stderr.contains(sig))
    };

    if matches_any(RESOLVE_SIGNATURES) {
        ProbeOutcome::Error { error: ProbeErrorKind::Resolve }
    } else if matches_any(TIMEOUT_SIGNATURES) {
        ProbeOutcome::Timeout
    } else if exit_ok {
        ProbeOutcome::Error { error: ProbeErrorKind::Unparseable }
    } else {
        ProbeOutcome::Error { error: ProbeErrorKind::Failed }
    }
}

/// Find the first `time=X ms` / `time<X ms` / `time=Xms` value
fn find_rtt(text: &str) -> Option<f64> {
    text.lines().find_map(|line| {
        let idx = line.find("time=").or_else(|| line.find("time<"))?;
        let rest = &line[idx + 5..];
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, unit) = rest.split_at(digits);
        if !unit.trim_start().starts_with("ms") {
            return None;
        }
        let value: f64 = number.parse().ok()?;
        value.is_finite().then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_OK: &str = "PING 8.8.8.8 (8.8.8.8) 56(84) bytes of data.
64 bytes from 8.8.8.8: icmp_seq=1 ttl=117 time=12.4 ms

--- 8.8.8.8 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 12.405/12.405/12.405/0.000 ms
";

    const LINUX_LOST: &str = "PING 10.255.255.1 (10.255.255.1) 56(84) bytes of data.

--- 10.255.255.1 ping statistics ---
1 packets transmitted, 0 received, 100% packet loss, time 0ms
";

    const MACOS_LOST: &str = "PING 10.255.255.1 (10.255.255.1): 56 data bytes

--- 10.255.255.1 ping statistics ---
1 packets transmitted, 0 packets received, 100.0% packet loss
";

    const WINDOWS_OK: &str = "Reply from 1.1.1.1: bytes=32 time<1ms TTL=57";

    #[test]
    fn test_linux_success() {
        assert_eq!(
            parse_ping_output(LINUX_OK, "", true),
            ProbeOutcome::Success { latency_ms: 12.4 }
        );
    }

    #[test]
    fn test_windows_sub_millisecond() {
        assert_eq!(
            parse_ping_output(WINDOWS_OK, "", true),
            ProbeOutcome::Success { latency_ms: 1.0 }
        );
    }

    #[test]
    fn test_lost_packet_is_timeout() {
        assert_eq!(parse_ping_output(LINUX_LOST, "", false), ProbeOutcome::Timeout);
        assert_eq!(parse_ping_output(MACOS_LOST, "", false), ProbeOutcome::Timeout);
        assert_eq!(
            parse_ping_output("Request timed out.\n", "", false),
            ProbeOutcome::Timeout
        );
    }

    #[test]
    fn test_macos_per_packet_timeout_without_summary() {
        let output = "PING 10.255.255.1 (10.255.255.1): 56 data bytes\nRequest timeout for icmp_seq 0\n";
        assert_eq!(parse_ping_output(output, "", false), ProbeOutcome::Timeout);
    }

    #[test]
    fn test_unresolvable_host() {
        assert_eq!(
            parse_ping_output("", "ping: nowhere.invalid: Name or service not known\n", false),
            ProbeOutcome::Error { error: ProbeErrorKind::Resolve }
        );
        assert_eq!(
            parse_ping_output("", "ping: cannot resolve nowhere.invalid: Unknown host\n", false),
            ProbeOutcome::Error { error: ProbeErrorKind::Resolve }
        );
    }

    #[test]
    fn test_unrecognised_output() {
        assert_eq!(
            parse_ping_output("all good\n", "", true),
            ProbeOutcome::Error { error: ProbeErrorKind::Unparseable }
        );
        assert_eq!(
            parse_ping_output("", "ping: permission denied\n", false),
            ProbeOutcome::Error { error: ProbeErrorKind::Failed }
        );
    }

    #[test]
    fn test_rtt_with_nonzero_exit_is_not_success() {
        assert_eq!(
            parse_ping_output(LINUX_OK, "", false),
            ProbeOutcome::Error { error: ProbeErrorKind::Failed }
        );
    }

    #[test]
    fn test_find_rtt_requires_ms_unit() {
        assert_eq!(find_rtt("time=12.5 ms"), Some(12.5));
        assert_eq!(find_rtt("time=7ms"), Some(7.0));
        assert_eq!(find_rtt("time=12.5 s"), None);
        assert_eq!(find_rtt("time=abc ms"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let prober = PingProber::new(
            ToolCommand::new("gms-no-such-ping-binary", &[]),
            Duration::from_millis(500),
        );
        let sample = prober.probe("127.0.0.1").await;
        assert_eq!(sample.outcome, ProbeOutcome::Error { error: ProbeErrorKind::Spawn });
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hard_timeout_bounds_probe() {
        // The host lands in $1 and is ignored
        let prober = PingProber::new(
            ToolCommand::new("sh", &["-c", "sleep 5", "sh"]),
            Duration::from_millis(100),
        );
        let started = std::time::Instant::now();
        let sample = prober.probe("127.0.0.1").await;
        assert_eq!(sample.outcome, ProbeOutcome::Timeout);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_parses_child_output() {
        let prober = PingProber::new(
            ToolCommand::new("sh", &["-c", "echo '64 bytes from $0: icmp_seq=1 time=3.25 ms'"]),
            Duration::from_secs(2),
        );
        let sample = prober.probe("127.0.0.1").await;
        assert_eq!(sample.outcome, ProbeOutcome::Success { latency_ms: 3.25 });
    }
}
