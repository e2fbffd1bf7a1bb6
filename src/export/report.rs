use std::io::Write;

use crate::monitor::MonitorSnapshot;
use crate::state::{StatsSnapshot, TraceStatus};

/// Plain-text summary of a snapshot, for `--report` and non-interactive runs
pub fn generate_report<W: Write>(snapshot: &MonitorSnapshot, mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "gms report for {}", snapshot.target_host)?;
    writeln!(writer, "Taken: {}", snapshot.taken_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(
        writer,
        "Quality: {:?} ({:?})",
        snapshot.quality, snapshot.quality_reason
    )?;
    if let Some(alert) = snapshot.alert {
        writeln!(writer, "Alert: {:?}", alert)?;
    }
    writeln!(writer)?;

    writeln!(
        writer,
        "{:<16} {:>6} {:>7} {:>9} {:>9} {:>9} {:>9}",
        "Window", "Sent", "Loss%", "Min", "Avg", "Max", "Jitter"
    )?;
    writeln!(writer, "{}", "-".repeat(70))?;
    write_stats_row(&mut writer, &format!("last {}", snapshot.window_size), &snapshot.recent)?;
    write_stats_row(&mut writer, "short term", &snapshot.short_term)?;
    write_stats_row(&mut writer, "session", &snapshot.session)?;

    let trace = &snapshot.trace;
    if trace.status == TraceStatus::Idle {
        return Ok(());
    }

    writeln!(writer)?;
    writeln!(
        writer,
        "Trace: {:?}, {} hops, {} timed out",
        trace.status, trace.summary.hop_count, trace.summary.timeout_count
    )?;
    if let Some(ref failure) = trace.failure {
        writeln!(writer, "Failure: {:?}", failure)?;
    }
    for hop in &trace.hops {
        let host = match (&hop.host, &hop.address) {
            (Some(host), Some(addr)) => format!("{} ({})", host, addr),
            (None, Some(addr)) => addr.clone(),
            (Some(host), None) => host.clone(),
            (None, None) => "* * *".to_string(),
        };
        writeln!(writer, "{:>3}  {:<50} {:>9}", hop.hop_index, host, fmt_ms(hop.rtt_ms))?;
    }

    Ok(())
}

fn write_stats_row<W: Write>(writer: &mut W, label: &str, stats: &StatsSnapshot) -> std::io::Result<()> {
    writeln!(
        writer,
        "{:<16} {:>6} {:>6.1}% {:>9} {:>9} {:>9} {:>9}",
        label,
        stats.count,
        stats.loss_pct,
        fmt_ms(stats.min_ms),
        fmt_ms(stats.avg_ms),
        fmt_ms(stats.max_ms),
        fmt_ms(stats.jitter_ms)
    )
}

fn fmt_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |ms| format!("{:.1}ms", ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::monitor::Monitor;
    use crate::state::ProbeSample;

    #[test]
    fn test_report_contents() {
        let monitor = Monitor::new(Config::for_host("example.com")).unwrap();
        for ms in [10.0, 20.0, 30.0] {
            monitor.record(ProbeSample::success(ms));
        }
        monitor.record(ProbeSample::timeout());

        let mut buf = Vec::new();
        generate_report(&monitor.snapshot(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("gms report for example.com"));
        assert!(text.contains("25.0%"));
        assert!(text.contains("20.0ms"));
        assert!(!text.contains("Trace:"));
    }

    #[test]
    fn test_empty_stats_render_dashes() {
        assert_eq!(fmt_ms(None), "-");
        assert_eq!(fmt_ms(Some(1.26)), "1.3ms");
    }
}
