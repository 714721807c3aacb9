//! Configuration module
//!
//! Loaded from a TOML file; every section and field has a default, so a
//! partial (or missing) file still yields a usable configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::payment::PaymentPolicy;
use crate::domain::tariff::RoundingPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// `~/.config/smart-parking/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smart-parking")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub parking: ParkingConfig,
    pub overstay: OverstaySection,
    pub receipts: ReceiptsConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight work on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./parking.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error (or any `EnvFilter` directive)
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    pub default_currency: String,
    pub payment_policy: PaymentPolicy,
    pub rounding: RoundingPolicy,
    pub max_recommended_minutes: i64,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            default_currency: "PEN".to_string(),
            payment_policy: PaymentPolicy::Minimum,
            rounding: RoundingPolicy::PerMinute,
            max_recommended_minutes: 480,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverstaySection {
    pub enabled: bool,
    pub check_interval_secs: u64,
}

impl Default for OverstaySection {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptsConfig {
    pub enabled: bool,
    pub max_attempts: u32,
}

impl Default for ReceiptsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub demo_data: bool,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, raw).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let currency = &self.parking.default_currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Invalid(format!(
                "parking.default_currency must be a 3-letter ISO code, got '{}'",
                currency
            )));
        }
        if self.parking.max_recommended_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "parking.max_recommended_minutes must be positive".into(),
            ));
        }
        if self.overstay.check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "overstay.check_interval_secs must be positive".into(),
            ));
        }
        if self.receipts.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "receipts.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.server.api_port, 8080);
        assert_eq!(cfg.parking.default_currency, "PEN");
        assert_eq!(cfg.parking.payment_policy, PaymentPolicy::Minimum);
        assert_eq!(cfg.parking.rounding, RoundingPolicy::PerMinute);
        assert_eq!(cfg.parking.max_recommended_minutes, 480);
        assert!(!cfg.seed.demo_data);
    }

    #[test]
    fn partial_sections_are_merged_with_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            api_port = 9090

            [parking]
            payment_policy = "exact"
            rounding = "per_started_hour"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.api_port, 9090);
        assert_eq!(cfg.server.api_host, "0.0.0.0");
        assert_eq!(cfg.parking.payment_policy, PaymentPolicy::Exact);
        assert_eq!(cfg.parking.rounding, RoundingPolicy::PerStartedHour);
        assert_eq!(cfg.parking.default_currency, "PEN");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(AppConfig::from_toml("[parking]\npayment_policy = \"whatever\"").is_err());
    }

    #[test]
    fn bad_currency_is_rejected() {
        let err = AppConfig::from_toml("[parking]\ndefault_currency = \"soles\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("smart-parking/config.toml"));
    }
}
