// Device records shared by the cloud and local backends.
//
// Fields are `#[serde(default)]` throughout because payloads differ between
// gateway firmware versions and between cloud and local. Anything not
// modelled lands in `extra`. A missing or `null` status decodes as the
// all-`None` "zombie" status so a dead device never fails a listing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Decode `null` or a missing field as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ── Envelope ─────────────────────────────────────────────────────────

/// Cloud responses wrap their payload as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

// ── Location ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorCoordinates {
    #[serde(default)]
    pub x: Option<i64>,
    #[serde(default)]
    pub y: Option<i64>,
}

/// Where a device sits inside an installation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub floor_coordinates: Option<FloorCoordinates>,
    #[serde(default)]
    pub installation_id: Option<u64>,
    #[serde(default)]
    pub gateway_id: Option<u64>,
    #[serde(default)]
    pub floor_id: Option<u64>,
    #[serde(default)]
    pub room_id: Option<u64>,
}

// ── Installation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Allowed {
    #[serde(default)]
    pub allowed: Option<bool>,
}

/// Access rights of the current user on an installation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallationAcl {
    #[serde(default)]
    pub configure: Option<Allowed>,
    #[serde(default)]
    pub view: Option<Allowed>,
    #[serde(default)]
    pub control: Option<Allowed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub local_ip_address: Option<String>,
}

/// A cloud-registered site, from `/base/installations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installation {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub gateway_model: Option<String>,
    #[serde(default, rename = "_acl")]
    pub acl: Option<InstallationAcl>,
    #[serde(default, rename = "_version")]
    pub version: Option<Value>,
    #[serde(default)]
    pub user_role: Option<Value>,
    #[serde(default)]
    pub registration_key: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub network: Option<Network>,
    #[serde(default)]
    pub flags: Option<Map<String, Value>>,
    #[serde(default)]
    pub features: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Output / Light ───────────────────────────────────────────────────

/// Live state of an output or light. `value` is the dimmer level (0..=100).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStatus {
    #[serde(default)]
    pub on: Option<bool>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub manual_override: Option<bool>,
    #[serde(default)]
    pub value: Option<u8>,
}

impl OutputStatus {
    /// True when no live status was reported.
    pub fn is_zombie(&self) -> bool {
        *self == Self::default()
    }
}

/// A switchable (and possibly dimmable) output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// `OUTLET`, `LIGHT`, `VALVE`, ...
    #[serde(default, rename = "type")]
    pub output_type: String,
    #[serde(default)]
    pub local_id: Option<u64>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub last_state_change: Option<f64>,
    #[serde(default, rename = "_version")]
    pub version: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: OutputStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A light. The cloud exposes lights as their own resource with the
/// output status shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Light {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub local_id: Option<u64>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, rename = "_version")]
    pub version: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: OutputStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Input ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStatus {
    #[serde(default)]
    pub on: Option<bool>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub value: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Input {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub local_id: Option<u64>,
    #[serde(default)]
    pub room: Option<u64>,
    #[serde(default)]
    pub last_state_change: Option<f64>,
    #[serde(default, rename = "_version")]
    pub version: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: InputStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Sensor ───────────────────────────────────────────────────────────

/// Sensor readings. Quantities other than the three common ones (e.g.
/// `sound`, `dust`) land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorStatus {
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub brightness: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub local_id: Option<u64>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub physical_quantity: Option<String>,
    #[serde(default)]
    pub last_state_change: Option<f64>,
    #[serde(default, rename = "_version")]
    pub version: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: SensorStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Shutter ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShutterStatus {
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub manual_override: Option<bool>,
    /// `UP`, `DOWN`, `STOP`, `GOING_UP` or `GOING_DOWN`.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub last_change: Option<f64>,
    #[serde(default)]
    pub preset_position: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shutter {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub shutter_type: Option<String>,
    #[serde(default)]
    pub local_id: Option<u64>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub attributes: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub configuration: Option<Value>,
    #[serde(default, rename = "_version")]
    pub version: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ShutterStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Group action ─────────────────────────────────────────────────────

/// A server-stored sequence of actions, triggerable as a unit (a scene).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAction {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub local_id: Option<u64>,
    #[serde(default)]
    pub actions: Vec<Value>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default, rename = "_version")]
    pub version: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Thermostats ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermostatGroupStatus {
    /// `HEATING` or `COOLING`.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub state: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermostatGroup {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub local_id: Option<u64>,
    #[serde(default)]
    pub schedule: Option<Value>,
    #[serde(default)]
    pub capabilities: Vec<Value>,
    #[serde(default)]
    pub thermostat_ids: Option<Value>,
    #[serde(default, rename = "_acl")]
    pub acl: Option<Value>,
    #[serde(default, rename = "_version")]
    pub version: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ThermostatGroupStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermostatUnitStatus {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub setpoint: Option<f64>,
    #[serde(default)]
    pub steering_power: Option<f64>,
    #[serde(default)]
    pub active_preset: Option<String>,
    #[serde(default)]
    pub current_temperature: Option<f64>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub preset_expiration: Option<String>,
    #[serde(default)]
    pub actual_temperature: Option<f64>,
    #[serde(default)]
    pub current_setpoint: Option<f64>,
    #[serde(default)]
    pub preset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitLocation {
    #[serde(default)]
    pub thermostat_group_id: Option<u64>,
    #[serde(default)]
    pub installation_id: Option<u64>,
    #[serde(default)]
    pub room_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermostatUnit {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub local_id: Option<u64>,
    #[serde(default)]
    pub location: Option<UnitLocation>,
    #[serde(default, rename = "_version")]
    pub version: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ThermostatUnitStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Preset temperatures for one operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct PresetTemperatures {
    pub away: f64,
    pub vacation: f64,
    pub party: f64,
}

/// Body of `thermostats/units/{id}/preset/config`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetConfig {
    pub heating: PresetTemperatures,
    pub cooling: PresetTemperatures,
}

// ── Energy sensor ────────────────────────────────────────────────────

/// Realtime reading of one power module input. Missing values read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyStatus {
    pub voltage: f64,
    pub frequency: f64,
    pub current: f64,
    pub power: f64,
}

impl EnergyStatus {
    /// Build from the gateway's `[voltage, frequency, current, power]` list.
    pub fn from_readings(readings: &[f64]) -> Self {
        let at = |i: usize| readings.get(i).copied().unwrap_or_default();
        Self {
            voltage: at(0),
            frequency: at(1),
            current: at(2),
            power: at(3),
        }
    }
}

/// One measured input of a gateway power module. Ids run across all
/// modules in the order the gateway lists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySensor {
    pub id: u64,
    pub local_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub status: EnergyStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn output_without_status_gets_zombie_status() {
        let output: Output = serde_json::from_value(json!({
            "id": 18,
            "name": "Pond",
            "type": "OUTLET",
            "capabilities": ["ON_OFF"],
            "status": null,
            "_version": 1.0
        }))
        .unwrap();

        assert_eq!(output.status, OutputStatus::default());
        assert!(output.status.is_zombie());
        assert_eq!(output.output_type, "OUTLET");
    }

    #[test]
    fn output_keeps_unknown_fields_in_extra() {
        let output: Output = serde_json::from_value(json!({
            "id": 1,
            "name": "Hall",
            "type": "LIGHT",
            "status": {"on": true, "value": 80},
            "dimmer_config": "linear"
        }))
        .unwrap();

        assert_eq!(output.status.on, Some(true));
        assert_eq!(output.status.value, Some(80));
        assert_eq!(output.extra["dimmer_config"], "linear");
    }

    #[test]
    fn installation_reads_underscore_fields() {
        let inst: Installation = serde_json::from_value(json!({
            "id": 5,
            "name": "Home",
            "_acl": {"control": {"allowed": true}},
            "_version": 1.0,
            "network": {"local_ip_address": "10.0.0.2"}
        }))
        .unwrap();

        assert_eq!(inst.id, 5);
        assert_eq!(
            inst.acl.and_then(|a| a.control).and_then(|c| c.allowed),
            Some(true)
        );
        assert_eq!(
            inst.network.and_then(|n| n.local_ip_address).as_deref(),
            Some("10.0.0.2")
        );
    }

    #[test]
    fn sensor_keeps_unusual_quantities() {
        let sensor: Sensor = serde_json::from_value(json!({
            "id": 3,
            "name": "Kitchen",
            "physical_quantity": "sound",
            "status": {"sound": 42.0}
        }))
        .unwrap();

        assert_eq!(sensor.status.temperature, None);
        assert_eq!(sensor.status.extra["sound"], 42.0);
    }

    #[test]
    fn thermostat_unit_without_status_is_zombie() {
        let unit: ThermostatUnit = serde_json::from_value(json!({"id": 0, "name": "None"})).unwrap();
        assert_eq!(unit.status, ThermostatUnitStatus::default());
    }

    #[test]
    fn preset_config_serializes_with_uppercase_keys() {
        let config = PresetConfig {
            heating: PresetTemperatures {
                away: 16.0,
                vacation: 12.0,
                party: 22.0,
            },
            cooling: PresetTemperatures {
                away: 28.0,
                vacation: 30.0,
                party: 24.0,
            },
        };
        assert_eq!(
            serde_json::to_value(config).unwrap(),
            json!({
                "heating": {"AWAY": 16.0, "VACATION": 12.0, "PARTY": 22.0},
                "cooling": {"AWAY": 28.0, "VACATION": 30.0, "PARTY": 24.0}
            })
        );
    }

    #[test]
    fn short_energy_readings_default_to_zero() {
        assert_eq!(
            EnergyStatus::from_readings(&[230.1, 50.0]),
            EnergyStatus {
                voltage: 230.1,
                frequency: 50.0,
                current: 0.0,
                power: 0.0,
            }
        );
    }
}
