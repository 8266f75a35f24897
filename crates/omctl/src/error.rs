//! CLI error types with miette diagnostics.
//!
//! Maps API and config errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use openmotics_api::{Error as ApiError, ErrorKind};
use openmotics_config::ConfigError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const TLS: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach OpenMotics: {message}")]
    #[diagnostic(
        code(omctl::connection_failed),
        help("Check that the gateway or API is reachable from this machine.")
    )]
    ConnectionFailed { message: String },

    #[error("TLS certificate verification failed: {message}")]
    #[diagnostic(
        code(omctl::tls_error),
        help(
            "Local gateways ship a self-signed certificate.\n\
             Use --insecure (-k) to accept it, or set ca_cert in your profile."
        )
    )]
    Tls { message: String },

    #[error("Request timed out: {message}")]
    #[diagnostic(
        code(omctl::timeout),
        help("Increase the timeout with --timeout or check the gateway's load.")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(omctl::auth_failed),
        help("Verify the token or username/password of the selected profile.")
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(omctl::no_credentials),
        help(
            "Set token/password in the profile, point token_env/password_env at an\n\
             environment variable, or store the secret in the system keyring."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(omctl::not_found),
        help("Run: omctl {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("'{operation}' is not available on the {backend} backend")]
    #[diagnostic(code(omctl::unsupported))]
    Unsupported { operation: String, backend: String },

    #[error("{message}")]
    #[diagnostic(code(omctl::api_error))]
    Api { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(omctl::profile_not_found),
        help("Available profiles: {available}\nConfig file: {path}")
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(omctl::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(omctl::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(omctl::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Tls { .. } => exit_code::TLS,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            Self::Api { .. } | Self::Config { .. } | Self::Io(_) | Self::Json(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── API / config error mapping ───────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Ssl => Self::Tls { message },
            ErrorKind::Authentication => Self::AuthFailed { message },
            ErrorKind::ConnectionTimeout => Self::Timeout { message },
            ErrorKind::Connection => Self::ConnectionFailed { message },
            ErrorKind::Generic => Self::Api { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name, available } => Self::ProfileNotFound {
                name,
                available,
                path: openmotics_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Api(api) => api.into(),
            ConfigError::Io(io) => Self::Io(io),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn tls_errors_carry_the_certificate_hint() {
        let err = CliError::from(ApiError::Ssl {
            message: "self-signed certificate".into(),
        });
        assert_eq!(err.exit_code(), exit_code::TLS);
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("--insecure"));
    }

    #[test]
    fn each_api_kind_has_its_own_exit_code() {
        let timeout = CliError::from(ApiError::ConnectionTimeout {
            timeout: Duration::from_secs(8),
        });
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let refused = CliError::from(ApiError::Authentication {
            message: "gateway refused the login".into(),
            status: None,
        });
        assert_eq!(refused.exit_code(), exit_code::AUTH);

        let down = CliError::from(ApiError::Connection {
            message: "connection refused".into(),
            status: None,
            source: None,
        });
        assert_eq!(down.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn unknown_profile_is_a_usage_error() {
        let err = CliError::from(ConfigError::UnknownProfile {
            name: "office".into(),
            available: "home".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
