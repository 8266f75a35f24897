// Local thermostat groups and units (read-only)

use crate::error::Error;
use crate::local::LocalGateway;
use crate::local::normalize;
use crate::models::{ThermostatGroup, ThermostatUnit};

/// `gateway.thermostats()`
pub struct Thermostats<'a> {
    gateway: &'a LocalGateway,
}

impl<'a> Thermostats<'a> {
    pub(crate) fn new(gateway: &'a LocalGateway) -> Self {
        Self { gateway }
    }

    pub fn groups(&self) -> ThermostatGroups<'a> {
        ThermostatGroups {
            gateway: self.gateway,
        }
    }

    pub fn units(&self) -> ThermostatUnits<'a> {
        ThermostatUnits {
            gateway: self.gateway,
        }
    }
}

/// `gateway.thermostats().groups()`
pub struct ThermostatGroups<'a> {
    gateway: &'a LocalGateway,
}

impl ThermostatGroups<'_> {
    pub async fn list(&self) -> Result<Vec<ThermostatGroup>, Error> {
        let configs = self
            .gateway
            .configurations(
                "get_thermostat_group_configurations",
                &self.gateway.configs.thermostat_groups,
            )
            .await?;
        let statuses = self
            .gateway
            .action_field("get_thermostat_group_status", "status")
            .await?;

        Ok(normalize::merge_status(configs, &statuses)
            .iter()
            .filter_map(normalize::thermostat_group)
            .collect())
    }

    pub async fn get(&self, id: u64) -> Result<Option<ThermostatGroup>, Error> {
        Ok(self.list().await?.into_iter().find(|g| g.id == id))
    }
}

/// `gateway.thermostats().units()`
pub struct ThermostatUnits<'a> {
    gateway: &'a LocalGateway,
}

impl ThermostatUnits<'_> {
    pub async fn list(&self) -> Result<Vec<ThermostatUnit>, Error> {
        let configs = self
            .gateway
            .configurations(
                "get_thermostat_configurations",
                &self.gateway.configs.thermostat_units,
            )
            .await?;
        let statuses = self
            .gateway
            .action_field("get_thermostat_status", "status")
            .await?;

        Ok(normalize::merge_status(configs, &statuses)
            .iter()
            .filter_map(normalize::thermostat_unit)
            .collect())
    }

    pub async fn get(&self, id: u64) -> Result<Option<ThermostatUnit>, Error> {
        Ok(self.list().await?.into_iter().find(|u| u.id == id))
    }
}
