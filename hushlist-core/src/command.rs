//! Block/unblock commands and their wire frame.
//!
//! A frame is a small JSON object shaped like a platform broadcast:
//! `{"action": "...", "packageName": "com.example", "block": true}`.
//! Frames for other actions decode as [`Decoded::Foreign`]. A missing `block`
//! field means block.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{ChannelError, CommandError};

/// Action name carried by command frames unless configured otherwise.
pub const DEFAULT_ACTION: &str = "hushlist.intent.BLOCK_NOTIFICATIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Block,
    Unblock,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Block => "block",
            Intent::Unblock => "unblock",
        }
    }
}

/// One control instruction. `identifier` is optional on the wire; commands
/// without one are malformed and get discarded by the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub identifier: Option<String>,
    pub intent: Intent,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    Command(Command),
    Foreign,
}

#[derive(Serialize, Deserialize)]
struct Frame {
    action: String,
    #[serde(rename = "packageName", default)]
    package_name: Option<String>,
    #[serde(default = "default_block")]
    block: bool,
}

fn default_block() -> bool {
    true
}

impl Command {
    pub fn block(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            intent: Intent::Block,
        }
    }

    pub fn unblock(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            intent: Intent::Unblock,
        }
    }

    /// The target identifier, provided it is present and non-empty.
    pub fn target(&self) -> Result<&str, CommandError> {
        match self.identifier.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(CommandError::MissingIdentifier),
        }
    }

    pub fn encode(&self, action: &str) -> Result<Bytes, ChannelError> {
        let frame = Frame {
            action: action.to_owned(),
            package_name: self.identifier.clone(),
            block: self.intent == Intent::Block,
        };
        Ok(Bytes::from(serde_json::to_vec(&frame)?))
    }

    pub fn decode(action: &str, frame: &[u8]) -> Result<Decoded, CommandError> {
        let frame: Frame = serde_json::from_slice(frame)?;
        if frame.action != action {
            return Ok(Decoded::Foreign);
        }
        Ok(Decoded::Command(Command {
            identifier: frame.package_name,
            intent: if frame.block {
                Intent::Block
            } else {
                Intent::Unblock
            },
        }))
    }
}
