//! Output command handlers.

use tabled::Tabled;

use openmotics_api::models::Output;
use openmotics_config::Client;

use crate::cli::{GlobalOpts, OutputsArgs, OutputsCommand};
use crate::error::CliError;
use crate::output;

use super::cell;

#[derive(Tabled)]
struct OutputRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    output_type: String,
    #[tabled(rename = "On")]
    on: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&Output> for OutputRow {
    fn from(o: &Output) -> Self {
        Self {
            id: o.id,
            name: o.name.clone(),
            output_type: o.output_type.clone(),
            on: cell(o.status.on),
            value: cell(o.status.value),
        }
    }
}

pub async fn handle(
    client: &Client,
    args: OutputsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let payload = match args.command {
        OutputsCommand::List => {
            let outputs = match client {
                Client::Cloud(cloud) => cloud.outputs().list(None).await?,
                Client::Local(gateway) => gateway.outputs().list().await?,
            };
            let out = output::render_list(&global.output, &outputs, |o| OutputRow::from(o))?;
            output::print_output(&out);
            return Ok(());
        }

        OutputsCommand::On { id, value } => match client {
            Client::Cloud(cloud) => cloud.outputs().turn_on(id, value).await?,
            Client::Local(gateway) => gateway.outputs().turn_on(id, value).await?,
        },

        OutputsCommand::Off { id } => match client {
            Client::Cloud(cloud) => cloud.outputs().turn_off(Some(id)).await?,
            Client::Local(gateway) => gateway.outputs().turn_off(id).await?,
        },

        OutputsCommand::Toggle { id } => match client {
            Client::Cloud(cloud) => cloud.outputs().toggle(id).await?,
            Client::Local(gateway) => {
                gateway
                    .outputs()
                    .toggle(id)
                    .await?
                    .ok_or_else(|| CliError::NotFound {
                        resource_type: "output".into(),
                        identifier: id.to_string(),
                        list_command: "outputs list".into(),
                    })?
            }
        },
    };

    output::print_output(&output::render_payload(&global.output, &payload)?);
    Ok(())
}
