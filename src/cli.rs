use clap::Parser;
use gms::config::{Config, DEFAULT_HISTORY, DEFAULT_TARGET_HOST, DEFAULT_WINDOW_SIZE, ToolCommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::prefs::Language;

/// Terminal network stability monitor: rolling ping statistics, quality rating and a live traceroute
#[derive(Parser, Debug, Clone)]
#[command(name = "gms")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host to monitor (hostname or IP address)
    #[arg(long = "host", default_value = DEFAULT_TARGET_HOST)]
    pub host: String,

    /// Probe interval in seconds
    #[arg(short = 'i', long = "interval", default_value = "1.0")]
    pub interval: f64,

    /// Probe timeout in seconds (must be shorter than the interval)
    #[arg(long = "timeout", default_value = "0.9")]
    pub timeout: f64,

    /// Initial recent-window size, in probes
    #[arg(short = 'w', long = "window")]
    pub window: Option<usize>,

    /// Number of samples kept in memory
    #[arg(long = "history", default_value_t = DEFAULT_HISTORY)]
    pub history: usize,

    /// Overall traceroute deadline in seconds
    #[arg(long = "trace-timeout", default_value = "300")]
    pub trace_timeout: f64,

    /// Ping command; the host is appended
    #[arg(long = "ping-cmd", default_value = "ping -n -c 1")]
    pub ping_cmd: String,

    /// Traceroute command; the host is appended
    #[arg(long = "trace-cmd", default_value = "traceroute")]
    pub trace_cmd: String,

    /// Don't start a traceroute at startup
    #[arg(long = "no-trace")]
    pub no_trace: bool,

    /// Interface language (en, id)
    #[arg(long = "lang")]
    pub lang: Option<String>,

    /// Color theme (default, nord, dracula, monochrome)
    #[arg(long = "theme")]
    pub theme: Option<String>,

    /// Show short-term diagnostics
    #[arg(long = "admin")]
    pub admin: bool,

    /// Disable TUI (one line per probe on stdout)
    #[arg(long = "no-tui")]
    pub no_tui: bool,

    /// Number of probes to run before exiting (0 = run until interrupted)
    #[arg(short = 'c', long = "count", default_value = "0")]
    pub count: u64,

    /// Output JSON snapshot (batch mode, requires -c)
    #[arg(long = "json")]
    pub json: bool,

    /// Text report (batch mode, requires -c)
    #[arg(long = "report")]
    pub report: bool,

    /// Write logs to this file (TUI mode discards logs otherwise)
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    /// Check if running in batch mode (non-interactive)
    pub fn is_batch_mode(&self) -> bool {
        self.json || self.report
    }

    pub fn language(&self) -> Option<Language> {
        self.lang.as_deref().and_then(Language::from_name)
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.is_batch_mode() && self.count == 0 {
            return Err("Batch output modes (--json, --report) require -c to be set".into());
        }

        if self.json && self.report {
            return Err("Cannot specify both --json and --report".into());
        }

        if !self.interval.is_finite() || self.interval <= 0.0 {
            return Err("Interval must be positive".into());
        }

        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err("Timeout must be positive".into());
        }

        if self.timeout >= self.interval {
            return Err(format!(
                "Timeout ({}s) must be shorter than the interval ({}s)",
                self.timeout, self.interval
            ));
        }

        if !self.trace_timeout.is_finite() || self.trace_timeout <= 0.0 {
            return Err("Trace timeout must be positive".into());
        }

        if self.history == 0 {
            return Err("History must be at least 1".into());
        }

        if let Some(ref lang) = self.lang
            && Language::from_name(lang).is_none()
        {
            return Err(format!("Unknown language: {}. Use en or id", lang));
        }

        if self.ping_cmd.split_whitespace().next().is_none() {
            return Err("Ping command cannot be empty".into());
        }
        if self.trace_cmd.split_whitespace().next().is_none() {
            return Err("Traceroute command cannot be empty".into());
        }

        Ok(())
    }
}

/// Split a command line on whitespace into program and arguments
fn parse_command(line: &str, fallback: ToolCommand) -> ToolCommand {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some(program) => ToolCommand {
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
        },
        None => fallback,
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            target_host: args.host.trim().to_string(),
            interval: args.interval_duration(),
            timeout: args.timeout_duration(),
            history: args.history,
            window_size: args.window.unwrap_or(DEFAULT_WINDOW_SIZE),
            trace_timeout: Duration::from_secs_f64(args.trace_timeout),
            ping_command: parse_command(&args.ping_cmd, ToolCommand::ping()),
            trace_command: parse_command(&args.trace_cmd, ToolCommand::traceroute()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("gms").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(args.validate().is_ok());

        let config = Config::from(&args);
        assert_eq!(config.target_host, DEFAULT_TARGET_HOST);
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.timeout, Duration::from_millis(900));
        assert_eq!(config.ping_command, ToolCommand::ping());
        assert_eq!(config.trace_command, ToolCommand::traceroute());
        assert_eq!(config.window_size, DEFAULT_WINDOW_SIZE);
    }

    #[test]
    fn test_batch_requires_count() {
        assert!(parse(&["--json"]).validate().is_err());
        assert!(parse(&["--json", "-c", "5"]).validate().is_ok());
        assert!(parse(&["--json", "--report", "-c", "5"]).validate().is_err());
    }

    #[test]
    fn test_timeout_must_be_shorter_than_interval() {
        assert!(parse(&["--interval", "0.5"]).validate().is_err());
        assert!(parse(&["--interval", "2", "--timeout", "1.5"]).validate().is_ok());
        assert!(parse(&["--timeout", "0"]).validate().is_err());
    }

    #[test]
    fn test_unknown_language_rejected() {
        assert!(parse(&["--lang", "fr"]).validate().is_err());
        assert_eq!(parse(&["--lang", "id"]).language(), Some(Language::Id));
    }

    #[test]
    fn test_custom_commands() {
        let args = parse(&["--ping-cmd", "ping6 -c 1", "--trace-cmd", "traceroute -n -q 1"]);
        let config = Config::from(&args);
        assert_eq!(config.ping_command.program, "ping6");
        assert_eq!(config.ping_command.args, vec!["-c", "1"]);
        assert_eq!(config.trace_command.args, vec!["-n", "-q", "1"]);

        assert!(parse(&["--ping-cmd", "  "]).validate().is_err());
    }
}
