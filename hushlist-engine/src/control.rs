//! Control surface: the caller-facing API that turns block/unblock requests
//! into command frames.
//!
//! Requests return as soon as the transport has the frame. Nothing here waits
//! for the filter to apply it, and a frame the transport drops is not reported
//! back beyond the returned [`Delivery`].

use std::sync::Arc;

use tracing::{debug, info};

use hushlist_core::channel::{CommandSender, Delivery};
use hushlist_core::command::Command;
use hushlist_core::host::{AccessGate, AccessOutcome, AppCatalog, InstalledApp};

use crate::error::ControlError;

pub struct ControlSurface {
    sender: CommandSender,
    gate: Arc<dyn AccessGate>,
}

impl ControlSurface {
    pub fn new(sender: CommandSender, gate: Arc<dyn AccessGate>) -> Self {
        Self { sender, gate }
    }

    pub fn request_block(&self, app_id: &str) -> Result<Delivery, ControlError> {
        self.request(Command::block(app_id))
    }

    pub fn request_unblock(&self, app_id: &str) -> Result<Delivery, ControlError> {
        self.request(Command::unblock(app_id))
    }

    /// Both notification posting and listener access are granted.
    pub fn check_permission(&self) -> bool {
        let post = self.gate.post_permission_granted();
        let listener = self.gate.listener_access_granted();
        debug!(post, listener, "Checked notification permission");
        post && listener
    }

    pub fn request_permission(&self) -> AccessOutcome {
        let outcome = self.gate.request_access();
        info!(?outcome, "Requested notification permission");
        outcome
    }

    /// Installed apps that are not part of the system image.
    pub fn installed_apps(
        &self,
        catalog: &dyn AppCatalog,
    ) -> Result<Vec<InstalledApp>, ControlError> {
        Ok(catalog.user_apps()?)
    }

    fn request(&self, command: Command) -> Result<Delivery, ControlError> {
        let app_id = command
            .target()
            .map_err(|_| ControlError::MissingIdentifier)?;
        if !self.gate.listener_access_granted() {
            return Err(ControlError::ListenerAccessRequired);
        }

        let delivery = self.sender.dispatch(&command)?;
        info!(
            app_id,
            intent = command.intent.as_str(),
            ?delivery,
            "Command handed to transport"
        );
        Ok(delivery)
    }
}
