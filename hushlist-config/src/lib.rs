//! # Hushlist Configuration
//!
//! Layered configuration for the notification filter.
//!
//! Hierarchy:
//! 1. Default values
//! 2. `config/hushlist.yaml`
//! 3. `config/<HUSHLIST_ENV>.yaml`
//! 4. `HUSHLIST_*` environment variables, `__` separating nested keys
//!    (`HUSHLIST_CHANNEL__CAPACITY=64`)

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

mod channel;
mod error;
mod host;
mod telemetry;
mod validation;

pub use channel::ChannelConfig;
pub use error::ConfigError;
pub use host::HostConfig;
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/hushlist.yaml";
const ENV_PREFIX: &str = "HUSHLIST_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct HushlistConfig {
    /// Command channel parameters.
    #[validate(nested)]
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Logging parameters.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Simulated host parameters.
    #[validate(nested)]
    #[serde(default)]
    pub host: HostConfig,
}

impl HushlistConfig {
    /// Load configuration from default files and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(HushlistConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        } else {
            debug!("{BASE_FILE} not found, using default configuration");
        }

        if let Ok(env) = std::env::var("HUSHLIST_ENV") {
            let env_file = format!("config/{}.yaml", env);
            if Path::new(&env_file).exists() {
                figment = figment.merge(Yaml::file(env_file));
            }
        }

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from a specific file, still honouring env overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::extract(
            Figment::from(Serialized::defaults(HushlistConfig::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}
