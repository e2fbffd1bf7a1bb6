use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::monitor::MonitorSnapshot;

/// Write a snapshot as pretty-printed JSON
pub fn export_json<W: Write>(snapshot: &MonitorSnapshot, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writeln!(writer)?;
    Ok(())
}

/// File name used by [`export_json_file`]: `gms-<host>-<timestamp>.json`
pub fn export_file_name(snapshot: &MonitorSnapshot) -> String {
    let host: String = snapshot
        .target_host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("gms-{}-{}.json", host, snapshot.taken_at.format("%Y%m%d-%H%M%S"))
}

/// Write a snapshot to a timestamped file in the current directory.
/// Returns the file name.
pub fn export_json_file(snapshot: &MonitorSnapshot) -> Result<String> {
    let filename = export_file_name(snapshot);
    let file = File::create(&filename).with_context(|| format!("Failed to create {}", filename))?;
    let mut writer = BufWriter::new(file);
    export_json(snapshot, &mut writer)?;
    writer.flush()?;
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::monitor::Monitor;
    use crate::state::ProbeSample;

    fn snapshot(host: &str) -> MonitorSnapshot {
        let monitor = Monitor::new(Config::for_host(host)).unwrap();
        monitor.record(ProbeSample::success(10.0));
        monitor.record(ProbeSample::timeout());
        monitor.snapshot()
    }

    #[test]
    fn test_export_json_is_parseable() {
        let mut buf = Vec::new();
        export_json(&snapshot("example.com"), &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["target_host"], "example.com");
        assert_eq!(value["session"]["count"], 2);
        assert_eq!(value["history"][1], serde_json::Value::Null);
        assert_eq!(value["trace"]["status"], "idle");
    }

    #[test]
    fn test_file_name_is_safe() {
        let name = export_file_name(&snapshot("fe80::1%eth0"));
        assert!(name.starts_with("gms-fe80__1_eth0-"));
        assert!(name.ends_with(".json"));
        assert!(!name.contains(':'));
    }
}
