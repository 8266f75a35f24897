//! Config subcommand handlers.

use openmotics_config::{self as config, BackendKind};

use crate::cli::{ConfigArgs, ConfigCommand};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string());
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured in {}", config::config_path().display());
                return Ok(());
            }

            let mut names: Vec<_> = cfg.profiles.iter().collect();
            names.sort_unstable_by_key(|(name, _)| *name);
            for (name, profile) in names {
                let backend = match profile.backend {
                    BackendKind::Cloud => "cloud",
                    BackendKind::Local => "local",
                };
                let marker = if name == default { " *" } else { "" };
                output::print_output(&format!("{name} ({backend}){marker}"));
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            cfg.profile(&name)?;

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }
    }
}
