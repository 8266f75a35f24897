// Local shutter actions

use tracing::debug;

use crate::engine::Payload;
use crate::error::Error;
use crate::local::LocalGateway;
use crate::local::normalize;
use crate::models::Shutter;

/// `gateway.shutters()`
pub struct Shutters<'a> {
    gateway: &'a LocalGateway,
}

impl<'a> Shutters<'a> {
    pub(crate) fn new(gateway: &'a LocalGateway) -> Self {
        Self { gateway }
    }

    async fn action(&self, action: &str, form: &[(&str, String)]) -> Result<Payload, Error> {
        debug!(action, "shutter action");
        self.gateway.exec_action(action, form).await
    }

    pub async fn list(&self) -> Result<Vec<Shutter>, Error> {
        let configs = self
            .gateway
            .configurations("get_shutter_configurations", &self.gateway.configs.shutters)
            .await?;
        let detail = self
            .gateway
            .action_field("get_shutter_status", "detail")
            .await?;
        Ok(normalize::shutters(&configs, &detail))
    }

    pub async fn get(&self, id: u64) -> Result<Option<Shutter>, Error> {
        Ok(self.list().await?.into_iter().find(|s| s.id == id))
    }

    pub async fn move_up(&self, id: u64) -> Result<Payload, Error> {
        self.action("do_shutter_up", &[("id", id.to_string())]).await
    }

    pub async fn move_down(&self, id: u64) -> Result<Payload, Error> {
        self.action("do_shutter_down", &[("id", id.to_string())]).await
    }

    pub async fn stop(&self, id: u64) -> Result<Payload, Error> {
        self.action("do_shutter_stop", &[("id", id.to_string())]).await
    }

    /// Go to `position`, from 0 to the shutter's step count (exclusive).
    pub async fn change_position(&self, id: u64, position: i64) -> Result<Payload, Error> {
        self.action(
            "do_shutter_goto",
            &[("id", id.to_string()), ("position", position.to_string())],
        )
        .await
    }
}
