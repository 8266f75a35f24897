//! Shutter command handlers.

use tabled::Tabled;

use openmotics_api::models::Shutter;
use openmotics_config::Client;

use crate::cli::{GlobalOpts, ShuttersArgs, ShuttersCommand};
use crate::error::CliError;
use crate::output;

use super::cell;

#[derive(Tabled)]
struct ShutterRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Position")]
    position: String,
}

impl From<&Shutter> for ShutterRow {
    fn from(s: &Shutter) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            state: cell(s.status.state.as_deref()),
            position: cell(s.status.position),
        }
    }
}

pub async fn handle(
    client: &Client,
    args: ShuttersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let payload = match (args.command, client) {
        (ShuttersCommand::List, _) => {
            let shutters = match client {
                Client::Cloud(cloud) => cloud.shutters().list(None).await?,
                Client::Local(gateway) => gateway.shutters().list().await?,
            };
            let out = output::render_list(&global.output, &shutters, |s| ShutterRow::from(s))?;
            output::print_output(&out);
            return Ok(());
        }
        (ShuttersCommand::Up { id }, Client::Cloud(cloud)) => cloud.shutters().move_up(id).await?,
        (ShuttersCommand::Up { id }, Client::Local(gw)) => gw.shutters().move_up(id).await?,
        (ShuttersCommand::Down { id }, Client::Cloud(cloud)) => {
            cloud.shutters().move_down(id).await?
        }
        (ShuttersCommand::Down { id }, Client::Local(gw)) => gw.shutters().move_down(id).await?,
        (ShuttersCommand::Stop { id }, Client::Cloud(cloud)) => cloud.shutters().stop(id).await?,
        (ShuttersCommand::Stop { id }, Client::Local(gw)) => gw.shutters().stop(id).await?,
    };

    output::print_output(&output::render_payload(&global.output, &payload)?);
    Ok(())
}
