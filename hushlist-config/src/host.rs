//! Parameters of the simulated host platform.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct HostConfig {
    /// Host API level. Levels from 21 up address notifications by key and
    /// can list the visible ones.
    #[serde(default = "default_api_level")]
    #[validate(range(min = 1, max = 100))]
    pub api_level: u32,
}

fn default_api_level() -> u32 {
    34
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_level: default_api_level(),
        }
    }
}
