//! # hushlist-core
//!
//! Foundation types for the notification filter.
//!
//! ### Key Submodules:
//! - `blocklist`: concurrency-safe set of blocked application identifiers
//! - `events`: notification-posted events and cancellation addressing
//! - `command`: block/unblock commands and their wire encoding
//! - `channel`: fire-and-forget, at-most-once command transport
//! - `host`: traits the host platform implements

pub mod blocklist;
pub mod channel;
pub mod command;
pub mod error;
pub mod events;
pub mod host;

pub mod prelude {
    pub use crate::blocklist::BlockList;
    pub use crate::channel::{CommandBus, CommandReceiver, CommandSender, Delivery};
    pub use crate::command::{Command, Decoded, Intent};
    pub use crate::error::*;
    pub use crate::events::{CancelTarget, NotificationEvent};
    pub use crate::host::*;
}
