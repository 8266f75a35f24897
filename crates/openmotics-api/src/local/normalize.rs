// Local payload normalization.
//
// The gateway reports configuration and status separately, with numeric
// codes where the cloud uses names. These functions pair the two and build
// the same records the cloud accessors return. Entries that are not JSON
// objects are skipped; fields of an unexpected type read as absent.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::models::{
    EnergySensor, EnergyStatus, GroupAction, Input, InputStatus, Location, Output, OutputStatus, Sensor, SensorStatus,
    Shutter, ShutterStatus, ThermostatGroup, ThermostatGroupStatus, ThermostatUnit,
    ThermostatUnitStatus, UnitLocation,
};

/// Output type name for a gateway type code.
pub fn output_type_name(code: u64) -> &'static str {
    match code {
        0 => "OUTLET",
        1 => "VALVE",
        2 => "ALARM",
        3 => "APPLIANCE",
        4 => "PUMP",
        5 => "HVAC",
        6 => "GENERIC",
        7 => "MOTOR",
        8 => "VENTILATION",
        9 => "HEATER",
        127 => "SHUTTER_RELAY",
        255 => "LIGHT",
        _ => "UNKNOWN",
    }
}

/// Attach `statuses[i]` to `configs[i]` under `"status"`.
///
/// Pairing is positional and stops at the shorter list. Without statuses
/// the configurations are returned untouched.
pub fn merge_status(configs: Vec<Value>, statuses: &Value) -> Vec<Value> {
    let statuses = match statuses.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => return configs,
    };
    configs
        .into_iter()
        .zip(statuses)
        .map(|(mut config, status)| {
            if let Some(map) = config.as_object_mut() {
                map.insert("status".into(), status.clone());
            }
            config
        })
        .collect()
}

// ── Field access ─────────────────────────────────────────────────────

fn u64_of(map: &Map<String, Value>, key: &str) -> Option<u64> {
    map.get(key).and_then(Value::as_u64)
}

fn i64_of(map: &Map<String, Value>, key: &str) -> Option<i64> {
    map.get(key).and_then(Value::as_i64)
}

fn f64_of(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

fn bool_of(map: &Map<String, Value>, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

fn string_of(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn status_of(map: &Map<String, Value>) -> Option<&Map<String, Value>> {
    map.get("status").and_then(Value::as_object)
}

/// Everything in `map` except `consumed`.
fn extra_of(map: &Map<String, Value>, consumed: &[&str]) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| !consumed.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn location_of(map: &Map<String, Value>) -> Location {
    Location {
        room_id: u64_of(map, "room_id").or_else(|| u64_of(map, "room")),
        ..Location::default()
    }
}

/// `status == 1` means on; everything else is off.
fn is_on(status: &Map<String, Value>) -> bool {
    i64_of(status, "status") == Some(1)
}

// ── Outputs / inputs ─────────────────────────────────────────────────

pub fn output(config: &Value) -> Option<Output> {
    let map = config.as_object()?;
    let id = u64_of(map, "id").unwrap_or_default();

    let status = status_of(map).map_or_else(OutputStatus::default, |s| OutputStatus {
        on: Some(is_on(s)),
        locked: Some(bool_of(s, "locked").unwrap_or(false)),
        manual_override: Some(bool_of(s, "manual_override").unwrap_or(false)),
        value: Some(
            u64_of(s, "dimmer")
                .and_then(|d| u8::try_from(d.min(100)).ok())
                .unwrap_or(0),
        ),
    });

    let mut capabilities = vec!["ON_OFF".to_owned()];
    if map.get("module_type").and_then(Value::as_str) == Some("D") {
        capabilities.push("RANGE".to_owned());
    }

    let output_type = match map.get("type") {
        Some(Value::String(name)) => name.clone(),
        Some(code) => output_type_name(code.as_u64().unwrap_or(u64::MAX)).to_owned(),
        None => output_type_name(0).to_owned(),
    };

    Some(Output {
        id,
        name: string_of(map, "name").unwrap_or_default(),
        output_type,
        local_id: Some(id),
        location: Some(location_of(map)),
        capabilities,
        metadata: None,
        last_state_change: f64_of(map, "last_state_change"),
        version: None,
        status,
        extra: extra_of(map, &["id", "name", "type", "status", "last_state_change"]),
    })
}

pub fn input(config: &Value) -> Option<Input> {
    let map = config.as_object()?;
    let id = u64_of(map, "id").unwrap_or_default();

    let status = status_of(map).map_or_else(InputStatus::default, |s| InputStatus {
        on: Some(is_on(s)),
        locked: Some(bool_of(s, "locked").unwrap_or(false)),
        value: i64_of(s, "dimmer"),
    });

    Some(Input {
        id,
        name: string_of(map, "name").unwrap_or_default(),
        local_id: Some(id),
        room: u64_of(map, "room"),
        last_state_change: f64_of(map, "last_state_change"),
        version: None,
        status,
        extra: extra_of(map, &["id", "name", "room", "status", "last_state_change"]),
    })
}

// ── Sensors ──────────────────────────────────────────────────────────

/// Sensor readings arrive as `[{ "id": n, "value": v }]`; each one is
/// matched to its configuration by id and stored under the sensor's
/// physical quantity.
pub fn sensors(configs: &[Value], statuses: &Value) -> Vec<Sensor> {
    let readings: HashMap<u64, &Value> = statuses
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|s| Some((s.get("id")?.as_u64()?, s.get("value")?)))
        .collect();

    configs
        .iter()
        .filter_map(|config| {
            let map = config.as_object()?;
            let id = u64_of(map, "id").unwrap_or_default();
            let quantity = string_of(map, "physical_quantity");

            let mut status = SensorStatus::default();
            if let (Some(value), Some(quantity)) = (readings.get(&id), quantity.as_deref()) {
                match quantity {
                    "temperature" => status.temperature = value.as_f64(),
                    "humidity" => status.humidity = value.as_f64(),
                    "brightness" => status.brightness = value.as_f64(),
                    other => {
                        status.extra.insert(other.to_owned(), (*value).clone());
                    }
                }
            }

            Some(Sensor {
                id,
                name: string_of(map, "name").unwrap_or_default(),
                local_id: Some(id),
                location: Some(location_of(map)),
                physical_quantity: quantity,
                last_state_change: f64_of(map, "last_state_change"),
                version: None,
                status,
                extra: extra_of(map, &["id", "name", "physical_quantity", "last_state_change"]),
            })
        })
        .collect()
}

// ── Shutters ─────────────────────────────────────────────────────────

/// Shutter statuses arrive as a `detail` object keyed by the shutter id
/// as a string.
pub fn shutters(configs: &[Value], detail: &Value) -> Vec<Shutter> {
    configs
        .iter()
        .filter_map(|config| {
            let map = config.as_object()?;
            let id = u64_of(map, "id").unwrap_or_default();

            let status = detail
                .get(id.to_string())
                .and_then(Value::as_object)
                .map_or_else(ShutterStatus::default, |s| ShutterStatus {
                    locked: Some(bool_of(s, "locked").unwrap_or(false)),
                    manual_override: Some(bool_of(s, "manual_override").unwrap_or(false)),
                    state: string_of(s, "state"),
                    position: i64_of(s, "position"),
                    last_change: f64_of(s, "last_change"),
                    preset_position: i64_of(s, "preset_position"),
                });

            Some(Shutter {
                id,
                name: string_of(map, "name").unwrap_or_default(),
                shutter_type: string_of(map, "type"),
                local_id: Some(id),
                location: Some(location_of(map)),
                capabilities: Vec::new(),
                attributes: None,
                metadata: None,
                configuration: None,
                version: None,
                status,
                extra: extra_of(map, &["id", "name", "type"]),
            })
        })
        .collect()
}

// ── Group actions ────────────────────────────────────────────────────

/// The gateway encodes a group action's steps as a comma-separated list
/// of numbers.
fn actions_of(map: &Map<String, Value>) -> Vec<Value> {
    match map.get("actions") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(raw)) => raw
            .split(',')
            .filter_map(|part| part.trim().parse::<u64>().ok())
            .map(Value::from)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn group_action(config: &Value) -> Option<GroupAction> {
    let map = config.as_object()?;
    let id = u64_of(map, "id").unwrap_or_default();
    Some(GroupAction {
        id,
        name: string_of(map, "name").unwrap_or_default(),
        local_id: Some(id),
        actions: actions_of(map),
        location: Some(location_of(map)),
        version: None,
        extra: extra_of(map, &["id", "name", "actions"]),
    })
}

// ── Thermostats ──────────────────────────────────────────────────────

pub fn thermostat_group(config: &Value) -> Option<ThermostatGroup> {
    let map = config.as_object()?;
    let id = u64_of(map, "id").unwrap_or_default();

    let status = status_of(map).map_or_else(ThermostatGroupStatus::default, |s| {
        ThermostatGroupStatus {
            mode: string_of(s, "mode"),
            state: bool_of(s, "state"),
        }
    });

    Some(ThermostatGroup {
        id,
        name: string_of(map, "name").unwrap_or_default(),
        local_id: Some(id),
        schedule: None,
        capabilities: Vec::new(),
        thermostat_ids: None,
        acl: None,
        version: None,
        status,
        extra: extra_of(map, &["id", "name", "status"]),
    })
}

/// The gateway calls the setpoint `setpoint_temperature`.
pub fn thermostat_unit(config: &Value) -> Option<ThermostatUnit> {
    let map = config.as_object()?;
    let id = u64_of(map, "id").unwrap_or_default();

    let status = status_of(map).map_or_else(ThermostatUnitStatus::default, |s| {
        ThermostatUnitStatus {
            actual_temperature: f64_of(s, "actual_temperature"),
            current_setpoint: f64_of(s, "setpoint_temperature"),
            preset: string_of(s, "preset"),
            ..ThermostatUnitStatus::default()
        }
    });

    Some(ThermostatUnit {
        id,
        name: string_of(map, "name").unwrap_or_default(),
        local_id: Some(id),
        location: Some(UnitLocation {
            room_id: u64_of(map, "room"),
            ..UnitLocation::default()
        }),
        version: None,
        status,
        extra: extra_of(map, &["id", "name", "status"]),
    })
}

// ── Energy ───────────────────────────────────────────────────────────

/// Power modules describe their inputs as `input{n}` / `inverted{n}`
/// fields; realtime readings are keyed by module id, one
/// `[voltage, frequency, current, power]` list per input. Modules without
/// an id or without readings contribute nothing.
pub fn energy_sensors(modules: &[Value], realtime: &Value) -> Vec<EnergySensor> {
    let mut sensors = Vec::new();
    let mut next_id = 0_u64;

    for map in modules.iter().filter_map(Value::as_object) {
        let Some(module_id) = map.get("id").filter(|id| !id.is_null()) else {
            continue;
        };
        let key = match module_id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let Some(inputs) = realtime.get(&key).and_then(Value::as_array) else {
            continue;
        };

        for (idx, reading) in inputs.iter().enumerate() {
            let readings: Vec<f64> = reading
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_f64)
                .collect();
            let inverted = match map.get(&format!("inverted{idx}")) {
                Some(Value::Bool(b)) => *b,
                Some(Value::Number(n)) => n.as_u64().is_some_and(|n| n != 0),
                _ => false,
            };

            sensors.push(EnergySensor {
                id: next_id,
                local_id: next_id,
                name: string_of(map, &format!("input{idx}")).unwrap_or_default(),
                inverted,
                status: EnergyStatus::from_readings(&readings),
            });
            next_id += 1;
        }
    }
    sensors
}
