// Local energy sensors (power module inputs, read-only)

use crate::error::Error;
use crate::local::LocalGateway;
use crate::local::normalize;
use crate::models::EnergySensor;

/// `gateway.energysensors()`
pub struct EnergySensors<'a> {
    gateway: &'a LocalGateway,
}

impl<'a> EnergySensors<'a> {
    pub(crate) fn new(gateway: &'a LocalGateway) -> Self {
        Self { gateway }
    }

    /// Every input of every power module with its realtime reading.
    pub async fn list(&self) -> Result<Vec<EnergySensor>, Error> {
        let modules = self
            .gateway
            .cached_list("get_power_modules", "modules", &self.gateway.configs.energy_modules)
            .await?;
        let realtime = self
            .gateway
            .exec_action("get_realtime_power", &[])
            .await?
            .into_json()?;
        Ok(normalize::energy_sensors(&modules, &realtime))
    }

    pub async fn get(&self, id: u64) -> Result<Option<EnergySensor>, Error> {
        Ok(self.list().await?.into_iter().find(|s| s.id == id))
    }
}
