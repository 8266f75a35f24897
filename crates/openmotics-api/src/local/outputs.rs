// Local output actions

use tracing::debug;

use crate::engine::Payload;
use crate::error::Error;
use crate::local::LocalGateway;
use crate::local::normalize;
use crate::models::{Light, Output};

/// `gateway.outputs()`
pub struct Outputs<'a> {
    gateway: &'a LocalGateway,
}

impl<'a> Outputs<'a> {
    pub(crate) fn new(gateway: &'a LocalGateway) -> Self {
        Self { gateway }
    }

    /// Every output with its live status.
    pub async fn list(&self) -> Result<Vec<Output>, Error> {
        let configs = self
            .gateway
            .configurations("get_output_configurations", &self.gateway.configs.outputs)
            .await?;
        let statuses = self
            .gateway
            .action_field("get_output_status", "status")
            .await?;

        Ok(normalize::merge_status(configs, &statuses)
            .iter()
            .filter_map(normalize::output)
            .collect())
    }

    pub async fn get(&self, id: u64) -> Result<Option<Output>, Error> {
        Ok(self.list().await?.into_iter().find(|o| o.id == id))
    }

    /// Switch on, optionally at dimmer level `value` (clamped to 0..=100).
    pub async fn turn_on(&self, id: u64, value: Option<i64>) -> Result<Payload, Error> {
        let mut form = vec![("id", id.to_string()), ("is_on", "true".to_owned())];
        if let Some(value) = value {
            form.push(("dimmer", value.clamp(0, 100).to_string()));
        }
        debug!(id, ?value, "turning output on");
        self.gateway.exec_action("set_output", &form).await
    }

    pub async fn turn_off(&self, id: u64) -> Result<Payload, Error> {
        debug!(id, "turning output off");
        self.gateway
            .exec_action("set_output", &[("id", id.to_string()), ("is_on", "false".to_owned())])
            .await
    }

    /// Flip the output based on its current status. `None` when no output
    /// has this id.
    pub async fn toggle(&self, id: u64) -> Result<Option<Payload>, Error> {
        let Some(output) = self.get(id).await? else {
            return Ok(None);
        };
        let payload = if output.status.on == Some(true) {
            self.turn_off(id).await?
        } else {
            self.turn_on(id, None).await?
        };
        Ok(Some(payload))
    }
}

/// `gateway.lights()`
///
/// The gateway has no separate light resource; lights are outputs of type
/// `LIGHT`. Listing returns nothing so callers can treat both backends
/// alike.
pub struct Lights<'a> {
    _gateway: &'a LocalGateway,
}

impl<'a> Lights<'a> {
    pub(crate) fn new(gateway: &'a LocalGateway) -> Self {
        Self { _gateway: gateway }
    }

    #[allow(clippy::unused_async)]
    pub async fn list(&self) -> Result<Vec<Light>, Error> {
        Ok(Vec::new())
    }
}
