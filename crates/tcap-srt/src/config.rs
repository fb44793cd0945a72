//! SRT engine configuration

use crate::errors::{Result, SrtError};
use serde::{Deserialize, Serialize};

/// Correlation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SrtConfig {
    /// Run transaction matching at all
    pub enable_correlation: bool,
    /// Window after which a repeated Begin for an answered dialogue opens a
    /// new one (seconds)
    pub repetition_timeout_seconds: u64,
    /// Window after which a repeated Begin for an unanswered dialogue opens a
    /// new one (seconds)
    pub lost_timeout_seconds: u64,
    /// Keep index entries of closed dialogues
    pub persistent_retention: bool,
}

impl Default for SrtConfig {
    fn default() -> Self {
        Self {
            enable_correlation: true,
            repetition_timeout_seconds: 10,
            lost_timeout_seconds: 30,
            persistent_retention: false,
        }
    }
}

impl SrtConfig {
    /// Load configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SrtError::Config(format!("{}: {}", path, e)))?;

        serde_json::from_str(&content)
            .map_err(|e| SrtError::Config(format!("{}: {}", path, e)))
    }

    /// Build from `TCAP_SRT_*` environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_var("TCAP_SRT_ENABLE_CORRELATION") {
            config.enable_correlation = parse_bool("TCAP_SRT_ENABLE_CORRELATION", &v)?;
        }
        if let Some(v) = env_var("TCAP_SRT_REPETITION_TIMEOUT_SECONDS") {
            config.repetition_timeout_seconds = parse_secs("TCAP_SRT_REPETITION_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = env_var("TCAP_SRT_LOST_TIMEOUT_SECONDS") {
            config.lost_timeout_seconds = parse_secs("TCAP_SRT_LOST_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = env_var("TCAP_SRT_PERSISTENT_RETENTION") {
            config.persistent_retention = parse_bool("TCAP_SRT_PERSISTENT_RETENTION", &v)?;
        }

        Ok(config)
    }

    /// Get repetition timeout as a capture-time delta
    pub fn repetition_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(clamp_secs(self.repetition_timeout_seconds))
    }

    /// Get lost timeout as a capture-time delta
    pub fn lost_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(clamp_secs(self.lost_timeout_seconds))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SrtError::Config(format!("{}: not a boolean: {}", name, other))),
    }
}

fn parse_secs(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| SrtError::Config(format!("{}: {}", name, e)))
}

// chrono::Duration::seconds panics past i64::MAX / 1000
fn clamp_secs(secs: u64) -> i64 {
    secs.min(i64::MAX as u64 / 1000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SrtConfig::default();
        assert!(config.enable_correlation);
        assert!(!config.persistent_retention);
        assert_eq!(config.repetition_timeout(), chrono::Duration::seconds(10));
        assert_eq!(config.lost_timeout(), chrono::Duration::seconds(30));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SrtConfig =
            serde_json::from_str(r#"{"persistent_retention": true, "lost_timeout_seconds": 60}"#).unwrap();
        assert!(config.persistent_retention);
        assert_eq!(config.lost_timeout_seconds, 60);
        assert_eq!(config.repetition_timeout_seconds, 10);
        assert!(config.enable_correlation);
    }

    #[test]
    fn test_missing_file() {
        let err = SrtConfig::from_file("/nonexistent/tcap-srt.json").unwrap_err();
        assert!(matches!(err, SrtError::Config(_)));
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_bool("X", "Yes").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
        assert_eq!(parse_secs("X", " 15 ").unwrap(), 15);
        assert!(parse_secs("X", "-1").is_err());
    }

    #[test]
    fn test_huge_timeout_does_not_overflow() {
        let config = SrtConfig {
            lost_timeout_seconds: u64::MAX,
            ..SrtConfig::default()
        };
        assert!(config.lost_timeout() > chrono::Duration::days(365));
    }
}
