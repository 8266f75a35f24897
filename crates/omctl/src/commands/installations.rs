//! Installation command handlers.

use tabled::Tabled;

use openmotics_api::models::Installation;
use openmotics_config::Client;

use crate::cli::{GlobalOpts, InstallationsArgs, InstallationsCommand};
use crate::error::CliError;
use crate::output;

use super::cell;

#[derive(Tabled)]
struct InstallationRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Platform")]
    platform: String,
}

impl From<&Installation> for InstallationRow {
    fn from(i: &Installation) -> Self {
        Self {
            id: i.id,
            name: i.name.clone(),
            model: cell(i.gateway_model.as_deref()),
            platform: cell(i.platform.as_deref()),
        }
    }
}

pub async fn handle(
    client: &Client,
    args: InstallationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        InstallationsCommand::List => {
            let Client::Cloud(cloud) = client else {
                return Err(CliError::Unsupported {
                    operation: "installations list".into(),
                    backend: "local".into(),
                });
            };
            let installations = cloud.installations().list(None).await?;
            let out = output::render_list(&global.output, &installations, |i| {
                InstallationRow::from(i)
            })?;
            output::print_output(&out);
            Ok(())
        }
    }
}
