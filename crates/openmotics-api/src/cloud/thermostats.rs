// Cloud thermostat endpoints
//
// Thermostats are split into groups (shared mode/state) and units (one
// room each, with their own setpoint and presets).

use serde_json::json;
use tracing::debug;

use crate::cloud::CloudClient;
use crate::engine::Payload;
use crate::error::Error;
use crate::models::{PresetConfig, ThermostatGroup, ThermostatUnit};

/// `client.thermostats()`
pub struct Thermostats<'a> {
    client: &'a CloudClient,
}

impl<'a> Thermostats<'a> {
    pub(crate) fn new(client: &'a CloudClient) -> Self {
        Self { client }
    }

    pub fn groups(&self) -> ThermostatGroups<'a> {
        ThermostatGroups {
            client: self.client,
        }
    }

    pub fn units(&self) -> ThermostatUnits<'a> {
        ThermostatUnits {
            client: self.client,
        }
    }

    /// Installation-wide mode: `HEATING` or `COOLING`.
    pub async fn set_mode(&self, mode: &str) -> Result<Payload, Error> {
        let path = self.client.installation_path("/thermostats/mode")?;
        debug!(mode, "setting thermostat mode");
        self.client.post(&path, Some(json!({ "mode": mode }))).await
    }

    /// Installation-wide state: `ON` or `OFF`.
    pub async fn set_state(&self, state: &str) -> Result<Payload, Error> {
        let path = self.client.installation_path("/thermostats/state")?;
        debug!(state, "setting thermostat state");
        self.client.post(&path, Some(json!({ "state": state }))).await
    }
}

/// `client.thermostats().groups()`
pub struct ThermostatGroups<'a> {
    client: &'a CloudClient,
}

impl ThermostatGroups<'_> {
    pub async fn list(&self) -> Result<Vec<ThermostatGroup>, Error> {
        let path = self.client.installation_path("/thermostats/groups")?;
        self.client.get_data(&path, &[]).await
    }

    pub async fn get(&self, id: u64) -> Result<ThermostatGroup, Error> {
        let path = self
            .client
            .installation_path(&format!("/thermostats/groups/{id}"))?;
        self.client.get_data(&path, &[]).await
    }

    /// `HEATING` or `COOLING`.
    pub async fn set_mode(&self, id: u64, mode: &str) -> Result<Payload, Error> {
        let path = self
            .client
            .installation_path(&format!("/thermostats/groups/{id}/mode"))?;
        self.client.post(&path, Some(json!({ "mode": mode }))).await
    }
}

/// `client.thermostats().units()`
pub struct ThermostatUnits<'a> {
    client: &'a CloudClient,
}

impl ThermostatUnits<'_> {
    fn path(&self, id: u64, action: &str) -> Result<String, Error> {
        self.client
            .installation_path(&format!("/thermostats/units/{id}/{action}"))
    }

    pub async fn list(&self) -> Result<Vec<ThermostatUnit>, Error> {
        let path = self.client.installation_path("/thermostats/units")?;
        self.client.get_data(&path, &[]).await
    }

    pub async fn get(&self, id: u64) -> Result<ThermostatUnit, Error> {
        let path = self
            .client
            .installation_path(&format!("/thermostats/units/{id}"))?;
        self.client.get_data(&path, &[]).await
    }

    /// `ON` or `OFF`.
    pub async fn set_state(&self, id: u64, state: &str) -> Result<Payload, Error> {
        let path = self.path(id, "state")?;
        self.client.post(&path, Some(json!({ "state": state }))).await
    }

    /// `POST .../thermostats/units/{id}/setpoint`
    pub async fn set_temperature(&self, id: u64, temperature: f64) -> Result<Payload, Error> {
        let path = self.path(id, "setpoint")?;
        debug!(id, temperature, "setting setpoint");
        self.client
            .post(&path, Some(json!({ "temperature": temperature })))
            .await
    }

    /// `AUTO`, `AWAY`, `PARTY` or `VACATION`.
    pub async fn set_preset(&self, id: u64, preset: &str) -> Result<Payload, Error> {
        let path = self.path(id, "preset")?;
        self.client
            .post(&path, Some(json!({ "preset": preset })))
            .await
    }

    /// Store the AWAY/VACATION/PARTY temperatures for heating and cooling.
    pub async fn set_preset_config(&self, id: u64, config: PresetConfig) -> Result<Payload, Error> {
        let path = self.path(id, "preset/config")?;
        let body = serde_json::to_value(config).map_err(|e| Error::generic(e.to_string()))?;
        self.client.post(&path, Some(body)).await
    }
}
