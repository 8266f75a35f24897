// Local inputs and sensors (read-only)

use crate::error::Error;
use crate::local::LocalGateway;
use crate::local::normalize;
use crate::models::{Input, Sensor};

/// `gateway.inputs()`
pub struct Inputs<'a> {
    gateway: &'a LocalGateway,
}

impl<'a> Inputs<'a> {
    pub(crate) fn new(gateway: &'a LocalGateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Input>, Error> {
        let configs = self
            .gateway
            .configurations("get_input_configurations", &self.gateway.configs.inputs)
            .await?;
        let statuses = self
            .gateway
            .action_field("get_input_status", "status")
            .await?;

        Ok(normalize::merge_status(configs, &statuses)
            .iter()
            .filter_map(normalize::input)
            .collect())
    }

    pub async fn get(&self, id: u64) -> Result<Option<Input>, Error> {
        Ok(self.list().await?.into_iter().find(|i| i.id == id))
    }
}

/// `gateway.sensors()`
pub struct Sensors<'a> {
    gateway: &'a LocalGateway,
}

impl<'a> Sensors<'a> {
    pub(crate) fn new(gateway: &'a LocalGateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Sensor>, Error> {
        let configs = self
            .gateway
            .configurations("get_sensor_configurations", &self.gateway.configs.sensors)
            .await?;
        let statuses = self
            .gateway
            .action_field("get_sensor_status", "status")
            .await?;
        Ok(normalize::sensors(&configs, &statuses))
    }

    pub async fn get(&self, id: u64) -> Result<Option<Sensor>, Error> {
        Ok(self.list().await?.into_iter().find(|s| s.id == id))
    }
}
