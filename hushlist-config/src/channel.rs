//! Command channel configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ChannelConfig {
    /// Action name carried by command frames; frames with other actions are ignored.
    #[serde(default = "default_action")]
    #[validate(custom(function = validation::validate_action))]
    pub action: String,

    /// Frames the receiver can hold before new ones are dropped.
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1, max = 65536))]
    pub capacity: usize,
}

fn default_action() -> String {
    "hushlist.intent.BLOCK_NOTIFICATIONS".into()
}

fn default_capacity() -> usize {
    256
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            action: default_action(),
            capacity: default_capacity(),
        }
    }
}
