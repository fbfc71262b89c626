//! Core runtime configuration.
//!
//! # Responsibility
//! - Hold tunables for codec rendering, reminder delay and email policy.
//! - Load them from JSON with defaults for every missing field.
//!
//! # Invariants
//! - A loaded config has passed `validate()`.

use crate::codec::identity::{IdentityCodec, DEFAULT_SCALE, MAX_SCALE, MIN_SCALE};
use crate::logging::default_log_level;
use crate::reminder::scheduler::DEFAULT_REMINDER_DELAY;
use crate::service::email_policy::EmailPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables for the prospects core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Pixels per QR module.
    pub qr_scale: u32,
    /// Fixed interval before a reminder fires.
    pub reminder_delay_secs: u64,
    pub email_policy: EmailPolicy,
    /// `None` uses the build-mode default.
    pub log_level: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            qr_scale: DEFAULT_SCALE,
            reminder_delay_secs: DEFAULT_REMINDER_DELAY.as_secs(),
            email_policy: EmailPolicy::default(),
            log_level: None,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.qr_scale) {
            return Err(ConfigError::Invalid(format!(
                "qr_scale must be within {MIN_SCALE}..={MAX_SCALE}, got {}",
                self.qr_scale
            )));
        }
        if self.reminder_delay_secs == 0 {
            return Err(ConfigError::Invalid(
                "reminder_delay_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn codec(&self) -> Result<IdentityCodec, ConfigError> {
        IdentityCodec::new(self.qr_scale).map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    pub fn reminder_delay(&self) -> Duration {
        Duration::from_secs(self.reminder_delay_secs)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::logging::default_log_level;
    use crate::service::email_policy::EmailPolicy;
    use std::time::Duration;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.reminder_delay(), Duration::from_secs(5));
        assert_eq!(config.codec().unwrap().scale(), 2);
    }

    #[test]
    fn unset_log_level_falls_back_to_build_default() {
        let config = CoreConfig::default();
        assert_eq!(config.log_level(), default_log_level());

        let config = CoreConfig {
            log_level: Some("error".to_string()),
            ..CoreConfig::default()
        };
        assert_eq!(config.log_level(), "error");
    }

    #[test]
    fn parses_overrides() {
        let config = CoreConfig::from_json_str(
            r#"{"qr_scale": 8, "reminder_delay_secs": 60, "email_policy": "basic_syntax", "log_level": "warn"}"#,
        )
        .unwrap();
        assert_eq!(config.qr_scale, 8);
        assert_eq!(config.email_policy, EmailPolicy::BasicSyntax);
        assert_eq!(config.log_level(), "warn");
    }

    #[test]
    fn rejects_invalid_values_and_unknown_fields() {
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"qr_scale": 1}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"reminder_delay_secs": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"remind_at_hour": 9}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
