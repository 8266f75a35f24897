//! Command dispatch.

pub mod config_cmd;
pub mod groupactions;
pub mod installations;
pub mod outputs;
pub mod sensors;
pub mod shutters;

use openmotics_config::Client;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Installations(args) => installations::handle(client, args, global).await,
        Command::Outputs(args) => outputs::handle(client, args, global).await,
        Command::Shutters(args) => shutters::handle(client, args, global).await,
        Command::Sensors(args) => sensors::handle(client, args, global).await,
        Command::Groupactions(args) => groupactions::handle(client, args, global).await,
        Command::Config(_) => unreachable!(),
    }
}

/// Text for an optional table cell.
pub(crate) fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
