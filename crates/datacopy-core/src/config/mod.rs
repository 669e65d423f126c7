//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files plus `DATACOPY__`-prefixed environment variables. Each
//! sub-module represents a logical configuration section.

pub mod job;
pub mod logging;
pub mod store;
pub mod transfer;

use serde::{Deserialize, Serialize};

pub use self::job::JobConfig;
pub use self::logging::LoggingConfig;
pub use self::store::StoreConfig;
pub use self::transfer::TransferConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote storage service connection settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Single-object transfer settings.
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Batch copy job retry policy.
    #[serde(default)]
    pub job: JobConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default`, an environment-specific overlay, and
    /// environment variables such as `DATACOPY__STORE__ACCESS_TOKEN`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Load configuration from an explicit configuration directory.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DATACOPY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the retry policy or transfers unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.job.max_attempts == 0 {
            return Err(AppError::configuration("job.max_attempts must be at least 1"));
        }
        if self.transfer.max_parts == 0 {
            return Err(AppError::configuration("transfer.max_parts must be at least 1"));
        }
        if self.transfer.min_part_size_bytes == 0 {
            return Err(AppError::configuration(
                "transfer.min_part_size_bytes must be non-zero",
            ));
        }
        if self.store.scheme.is_empty() || self.store.scheme.contains(':') {
            return Err(AppError::configuration(format!(
                "store.scheme '{}' is not a valid URI scheme",
                self.store.scheme
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.job.max_attempts, 10);
        assert_eq!(config.transfer.settle_wait_seconds, 5);
        assert_eq!(config.store.scheme, "icav2");
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = AppConfig::default();
        config.job.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let config = AppConfig::load_from("does-not-exist", "test").expect("defaults");
        assert_eq!(config.job.wait_increment_seconds, 10);
    }
}
