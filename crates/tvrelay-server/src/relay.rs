//! Control relay: resolves a pairing code and forwards a command to the
//! receiver holding it.

use tvrelay_common::RelayError;

use crate::protocol::ServerEvent;
use crate::registry::SessionRegistry;

pub const CONTROL_PARAMS_MISSING: &str = "Url Param 'tvcode' or 'ctls' is missing";
pub const EXISTS_PARAM_MISSING: &str = "Url Param 'tvcode' is missing.";

#[derive(Clone)]
pub struct ControlRelay {
    registry: SessionRegistry,
}

impl ControlRelay {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Push `command` to the receiver paired under `code`.
    ///
    /// Delivery is fire-and-forget: once the code resolves, a failed push is
    /// logged and the call still succeeds. The session is left in place.
    pub async fn forward_control(
        &self,
        code: Option<&str>,
        command: Option<&str>,
    ) -> Result<(), RelayError> {
        let (Some(code), Some(command)) = (non_empty(code), non_empty(command)) else {
            return Err(RelayError::MissingParameter(CONTROL_PARAMS_MISSING.into()));
        };

        let handle = self
            .registry
            .lookup(code)
            .await
            .ok_or(RelayError::CodeNotFound)?;

        match handle.push(ServerEvent::Control {
            command: command.to_string(),
        }) {
            Ok(()) => {
                tracing::debug!(code = %code, connection = %handle.id(), command = %command, "Control forwarded");
            }
            Err(e) => {
                tracing::warn!(code = %code, connection = %handle.id(), error = %e, "Control push failed");
            }
        }
        Ok(())
    }

    /// Check whether a receiver is paired under `code`.
    pub async fn check_exists(&self, code: Option<&str>) -> Result<(), RelayError> {
        let code =
            non_empty(code).ok_or_else(|| RelayError::MissingParameter(EXISTS_PARAM_MISSING.into()))?;

        if self.registry.exists(code).await {
            Ok(())
        } else {
            Err(RelayError::CodeNotFound)
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
