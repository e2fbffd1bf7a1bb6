// Public API - monitor controller, data types and export functions
pub mod config;
pub mod error;
pub mod export;
pub mod monitor;
pub mod probe;
pub mod state;
pub mod trace;

pub use config::Config;
pub use error::MonitorError;
pub use monitor::{Monitor, MonitorCommand, MonitorSnapshot};

/// Strip control characters from tool output before it is stored or drawn
pub fn sanitize_display(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_display_strips_escapes() {
        assert_eq!(sanitize_display("router\x1b[31m.lan\r"), "router[31m.lan");
        assert_eq!(sanitize_display("plain-host"), "plain-host");
    }
}
