//! Errors surfaced at the monitor's call boundary.
//!
//! Probe and trace failures that happen while running are recorded as data in
//! the monitor state; only configuration problems and failures to launch a
//! subprocess are reported through `MonitorError`.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("invalid host {host:?}: {reason}")]
    InvalidHost { host: String, reason: &'static str },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Longest host name accepted (RFC 1035 limit for a full domain name)
const MAX_HOST_LEN: usize = 253;

/// Validate host syntax without resolving it.
///
/// Resolution failures are per-probe data; this only rejects strings that can
/// never be a host or that a subprocess would read as an option.
pub fn validate_host(host: &str) -> Result<(), MonitorError> {
    let invalid = |reason| MonitorError::InvalidHost {
        host: host.to_string(),
        reason,
    };

    if host.is_empty() {
        return Err(invalid("empty"));
    }
    if host.len() > MAX_HOST_LEN {
        return Err(invalid("too long"));
    }
    if host.starts_with('-') {
        return Err(invalid("must not start with '-'"));
    }
    if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("contains whitespace or control characters"));
    }
    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | ':' | '_' | '%' | '[' | ']'))
    {
        return Err(invalid("contains characters not valid in a host name or address"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_names_and_addresses() {
        assert!(validate_host("www.youtube.com").is_ok());
        assert!(validate_host("8.8.8.8").is_ok());
        assert!(validate_host("2001:4860:4860::8888").is_ok());
        assert!(validate_host("fe80::1%eth0").is_ok());
        assert!(validate_host("does-not-exist.invalid").is_ok());
    }

    #[test]
    fn test_rejects_option_like_host() {
        let err = validate_host("-f").unwrap_err();
        assert!(matches!(err, MonitorError::InvalidHost { .. }));
        assert!(err.to_string().contains("-f"));
    }

    #[test]
    fn test_rejects_malformed_hosts() {
        assert!(validate_host("").is_err());
        assert!(validate_host("exa mple.com").is_err());
        assert!(validate_host("host;rm").is_err());
        assert!(validate_host(&"a".repeat(254)).is_err());
    }
}
