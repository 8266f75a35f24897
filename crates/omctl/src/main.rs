mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a connection
        Command::Config(args) => commands::config_cmd::handle(args),

        cmd => {
            let client = build_client(&cli.global)?;

            tracing::debug!(command = ?cmd, backend = ?client.backend(), "dispatching command");
            let result = commands::dispatch(cmd, &client, &cli.global).await;
            client.close();
            result
        }
    }
}

/// Build a client from the selected profile with CLI flag overrides.
fn build_client(global: &GlobalOpts) -> Result<openmotics_config::Client, CliError> {
    let cfg = openmotics_config::load_config()?;
    let profile_name = cfg.active_profile_name(global.profile.as_deref());

    let mut profile = cfg.profile(&profile_name)?.clone();
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        if timeout == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least one second".into(),
            });
        }
        profile.timeout = Some(timeout);
    }

    Ok(openmotics_config::connect(
        &profile,
        &profile_name,
        &cfg.defaults,
    )?)
}
