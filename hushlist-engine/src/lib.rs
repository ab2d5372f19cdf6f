//! # hushlist-engine
//!
//! The notification filtering service, the control surface that feeds it
//! commands, and a runtime that replays scenarios against a simulated host.

pub mod control;
pub mod error;
pub mod runtime;
pub mod service;

pub use control::ControlSurface;
pub use error::{ControlError, EngineError, ServiceError};
pub use runtime::{replay_scenario, ReplayReport};
pub use service::{FilterService, ServiceState};

pub mod prelude {
    pub use super::{ControlError, ControlSurface, EngineError, FilterService, ServiceError};
}
