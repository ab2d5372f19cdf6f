//! Replayable YAML scenarios.
//!
//! ```yaml
//! api_level: 34
//! apps:
//!   - { identifier: com.whatsapp, display_name: WhatsApp }
//! steps:
//!   - post: { app: com.whatsapp, id: 1 }
//!   - block: com.whatsapp
//!   - expect_visible: []
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hushlist_core::host::InstalledApp;

use crate::host::SimulatedHost;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scenario is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostStep {
    pub app: String,
    #[serde(default)]
    pub tag: Option<String>,
    pub id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Host posts a notification.
    Post(PostStep),
    /// Control surface requests a block.
    Block(String),
    /// Control surface requests an unblock.
    Unblock(String),
    /// Sends a raw command frame, bypassing the control surface.
    RawFrame(String),
    /// Host rejects the next n cancellations.
    FailCancels(usize),
    /// Sorted app ids of the visible notifications.
    ExpectVisible(Vec<String>),
    /// Sorted blocked app ids.
    ExpectBlocked(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Overrides the configured host API level.
    #[serde(default)]
    pub api_level: Option<u32>,
    #[serde(default = "default_true")]
    pub listener_access: bool,
    #[serde(default)]
    pub apps: Vec<InstalledApp>,
    pub steps: Vec<Step>,
}

fn default_true() -> bool {
    true
}

impl Scenario {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Builds the simulated host this scenario runs against.
    pub fn build_host(&self, default_api_level: u32) -> SimulatedHost {
        let host = SimulatedHost::new(self.api_level.unwrap_or(default_api_level))
            .with_apps(self.apps.clone());
        host.set_access(true, self.listener_access, false);
        host
    }
}
