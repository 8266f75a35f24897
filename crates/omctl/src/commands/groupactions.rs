//! Group action command handlers.

use tabled::Tabled;

use openmotics_api::models::GroupAction;
use openmotics_config::Client;

use crate::cli::{GlobalOpts, GroupActionsArgs, GroupActionsCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct GroupActionRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Actions")]
    actions: usize,
}

impl From<&GroupAction> for GroupActionRow {
    fn from(g: &GroupAction) -> Self {
        Self {
            id: g.id,
            name: g.name.clone(),
            actions: g.actions.len(),
        }
    }
}

pub async fn handle(
    client: &Client,
    args: GroupActionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GroupActionsCommand::List => {
            let actions = match client {
                Client::Cloud(cloud) => cloud.groupactions().list(None).await?,
                Client::Local(gateway) => gateway.groupactions().list().await?,
            };
            let out = output::render_list(&global.output, &actions, |g| GroupActionRow::from(g))?;
            output::print_output(&out);
            Ok(())
        }

        GroupActionsCommand::Trigger { id } => {
            let payload = match client {
                Client::Cloud(cloud) => cloud.groupactions().trigger(id).await?,
                Client::Local(gateway) => gateway.groupactions().trigger(id).await?,
            };
            output::print_output(&output::render_payload(&global.output, &payload)?);
            Ok(())
        }
    }
}
