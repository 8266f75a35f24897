//! Sensor command handlers.

use tabled::Tabled;

use openmotics_api::models::Sensor;
use openmotics_config::Client;

use crate::cli::{GlobalOpts, SensorsArgs, SensorsCommand};
use crate::error::CliError;
use crate::output;

use super::cell;

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Temperature")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Brightness")]
    brightness: String,
}

impl From<&Sensor> for SensorRow {
    fn from(s: &Sensor) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            quantity: cell(s.physical_quantity.as_deref()),
            temperature: cell(s.status.temperature),
            humidity: cell(s.status.humidity),
            brightness: cell(s.status.brightness),
        }
    }
}

pub async fn handle(
    client: &Client,
    args: SensorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SensorsCommand::List => {
            let sensors = match client {
                Client::Cloud(cloud) => cloud.sensors().list(None).await?,
                Client::Local(gateway) => gateway.sensors().list().await?,
            };
            let out = output::render_list(&global.output, &sensors, |s| SensorRow::from(s))?;
            output::print_output(&out);
            Ok(())
        }
    }
}
