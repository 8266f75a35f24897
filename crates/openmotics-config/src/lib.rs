//! Shared configuration for OpenMotics tools.
//!
//! TOML profiles merged with `OPENMOTICS_*` environment variables,
//! credential resolution (env + keyring + plaintext), and translation of a
//! profile into a ready [`CloudClient`] or [`LocalGateway`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use openmotics_api::{CloudClient, Credentials, LocalGateway, TlsMode, TransportConfig};

/// Keyring service name under which secrets are stored.
pub const KEYRING_SERVICE: &str = "openmotics";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] openmotics_api::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is requested.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    8
}

/// Which API a profile talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Cloud,
    Local,
}

/// A named connection profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub backend: BackendKind,

    /// Cloud API base URL, or a URL overriding `https://{host}:{port}/`
    /// for a local gateway.
    pub base_url: Option<String>,

    /// Local gateway host name or address.
    pub host: Option<String>,

    /// Local gateway port (443 when unset).
    pub port: Option<u16>,

    /// Cloud installation scoping device calls.
    pub installation_id: Option<u64>,

    /// Cloud access token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable holding the cloud access token.
    pub token_env: Option<String>,

    /// Local gateway user.
    pub username: Option<String>,

    /// Local gateway password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the local gateway password.
    pub password_env: Option<String>,

    /// PEM file with a CA certificate to trust.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid certificates.
    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,
}

impl Config {
    /// `requested`, else the configured default, else `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles.get(name).ok_or_else(|| {
            let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            ConfigError::UnknownProfile {
                name: name.into(),
                available: if names.is_empty() {
                    "none".into()
                } else {
                    names.join(", ")
                },
            }
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "openmotics", "openmotics").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("openmotics");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` merged with `OPENMOTICS_*` variables.
///
/// Nested keys are separated by a double underscore, e.g.
/// `OPENMOTICS_PROFILES__HOME__HOST`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OPENMOTICS_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_secret(profile_name: &str, kind: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{kind}")).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

fn env_secret(var: Option<&str>) -> Option<SecretString> {
    var.and_then(|name| std::env::var(name).ok())
        .map(SecretString::from)
}

/// Resolve the cloud access token: env var, then keyring, then plaintext.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    env_secret(profile.token_env.as_deref())
        .or_else(|| keyring_secret(profile_name, "token"))
        .or_else(|| profile.token.clone().map(SecretString::from))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve local gateway credentials. The password follows the same
/// env, keyring, plaintext order as the cloud token.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };
    let username = profile.username.clone().ok_or_else(no_credentials)?;
    let password = env_secret(profile.password_env.as_deref())
        .or_else(|| keyring_secret(profile_name, "password"))
        .or_else(|| profile.password.clone().map(SecretString::from))
        .ok_or_else(no_credentials)?;
    Ok(Credentials::new(username, password))
}

// ── Profile → client ────────────────────────────────────────────────

/// Transport settings for a profile, falling back to `defaults`.
///
/// `insecure` wins over `ca_cert`. Without either, cloud profiles verify
/// against the web PKI and local profiles accept the gateway's self-signed
/// certificate.
pub fn transport_config(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        match profile.backend {
            BackendKind::Cloud => TlsMode::System,
            BackendKind::Local => TlsMode::DangerAcceptInvalid,
        }
    };
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    TransportConfig::default().with_tls(tls).with_timeout(timeout)
}

/// A client built from a profile.
pub enum Client {
    Cloud(CloudClient),
    Local(LocalGateway),
}

impl Client {
    pub fn backend(&self) -> BackendKind {
        match self {
            Self::Cloud(_) => BackendKind::Cloud,
            Self::Local(_) => BackendKind::Local,
        }
    }

    pub fn close(&self) {
        match self {
            Self::Cloud(client) => client.close(),
            Self::Local(gateway) => gateway.close(),
        }
    }
}

/// Build the client a profile describes. No network traffic happens here;
/// local logins run on the first request.
pub fn connect(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<Client, ConfigError> {
    let transport = transport_config(profile, defaults);

    if let Some(ref raw) = profile.base_url {
        url::Url::parse(raw).map_err(|e| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL {raw}: {e}"),
        })?;
    }

    match profile.backend {
        BackendKind::Cloud => {
            let token = resolve_token(profile, profile_name)?;
            let mut builder = CloudClient::builder(token).transport(transport);
            if let Some(ref base_url) = profile.base_url {
                builder = builder.base_url(base_url.trim_end_matches('/'));
            }
            if let Some(id) = profile.installation_id {
                builder = builder.installation_id(id);
            }
            debug!(profile = profile_name, "cloud client configured");
            Ok(Client::Cloud(builder.build()))
        }
        BackendKind::Local => {
            let host = match (&profile.host, &profile.base_url) {
                (Some(host), _) => host.clone(),
                (None, Some(_)) => String::new(),
                (None, None) => {
                    return Err(ConfigError::Validation {
                        field: "host".into(),
                        reason: "local profiles need a host or base_url".into(),
                    });
                }
            };
            let credentials = resolve_credentials(profile, profile_name)?;
            let mut builder = LocalGateway::builder(host, credentials).transport(transport);
            if let Some(port) = profile.port {
                builder = builder.port(port);
            }
            if let Some(ref base_url) = profile.base_url {
                builder = builder.base_url(base_url.clone());
            }
            debug!(profile = profile_name, "local gateway configured");
            Ok(Client::Local(builder.build()?))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
timeout = 12

[profiles.home]
backend = "local"
host = "10.0.0.7"
port = 8443
username = "admin"
password = "secret"

[profiles.cloud]
installation_id = 21
token = "cloud-token"
base_url = "https://staging.openmotics.test/api/v1.1/"
"#;

    fn sample_config() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn loads_profiles_from_toml() {
        let cfg = sample_config();
        assert_eq!(cfg.active_profile_name(None), "home");
        assert_eq!(cfg.active_profile_name(Some("cloud")), "cloud");
        assert_eq!(cfg.defaults.timeout, 12);

        let home = cfg.profile("home").unwrap();
        assert_eq!(home.backend, BackendKind::Local);
        assert_eq!(home.port, Some(8443));

        let cloud = cfg.profile("cloud").unwrap();
        assert_eq!(cloud.backend, BackendKind::Cloud);
        assert_eq!(cloud.installation_id, Some(21));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.timeout, 8);
        assert!(!cfg.defaults.insecure);
    }

    #[test]
    fn unknown_profile_lists_available_names() {
        let cfg = sample_config();
        let err = cfg.profile("office").unwrap_err();
        assert_eq!(
            err.to_string(),
            "profile 'office' not found (available: cloud, home)"
        );
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "garage".into(),
            Profile {
                backend: BackendKind::Local,
                host: Some("garage.lan".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile("garage").unwrap().host.as_deref(), Some("garage.lan"));
    }

    #[test]
    fn tls_mode_follows_backend_and_overrides() {
        let defaults = Defaults::default();
        let cloud = Profile::default();
        assert_eq!(transport_config(&cloud, &defaults).tls, TlsMode::System);

        let local = Profile {
            backend: BackendKind::Local,
            ..Profile::default()
        };
        assert_eq!(
            transport_config(&local, &defaults).tls,
            TlsMode::DangerAcceptInvalid
        );

        let pinned = Profile {
            ca_cert: Some(PathBuf::from("/etc/gateway.pem")),
            timeout: Some(3),
            ..Profile::default()
        };
        let transport = transport_config(&pinned, &defaults);
        assert_eq!(transport.tls, TlsMode::CustomCa(PathBuf::from("/etc/gateway.pem")));
        assert_eq!(transport.timeout, Duration::from_secs(3));

        let insecure = Profile {
            insecure: Some(true),
            ..pinned
        };
        assert_eq!(
            transport_config(&insecure, &defaults).tls,
            TlsMode::DangerAcceptInvalid
        );
    }

    #[test]
    fn plaintext_token_is_the_last_resort() {
        let profile = Profile {
            token_env: Some("OPENMOTICS_TEST_TOKEN_THAT_IS_NEVER_SET".into()),
            token: Some("from-file".into()),
            ..Profile::default()
        };
        let token = resolve_token(&profile, "config-test-plaintext").unwrap();
        assert_eq!(token.expose_secret(), "from-file");
    }

    #[test]
    fn local_profile_without_username_has_no_credentials() {
        let profile = Profile {
            backend: BackendKind::Local,
            host: Some("10.0.0.7".into()),
            password: Some("secret".into()),
            ..Profile::default()
        };
        let err = connect(&profile, "config-test-nouser", &Defaults::default()).err();
        assert!(matches!(err, Some(ConfigError::NoCredentials { .. })));
    }

    #[test]
    fn local_profile_needs_an_address() {
        let profile = Profile {
            backend: BackendKind::Local,
            username: Some("admin".into()),
            password: Some("secret".into()),
            ..Profile::default()
        };
        let err = connect(&profile, "config-test-nohost", &Defaults::default()).err();
        assert!(matches!(err, Some(ConfigError::Validation { ref field, .. }) if field == "host"));
    }

    #[test]
    fn connect_builds_the_configured_backend() {
        let cfg = sample_config();

        let Client::Local(gateway) = connect(cfg.profile("home").unwrap(), "home", &cfg.defaults).unwrap() else {
            panic!("expected a local gateway");
        };
        assert_eq!(gateway.base_url().as_str(), "https://10.0.0.7:8443/");
        assert_eq!(gateway.username(), "admin");

        let client = connect(cfg.profile("cloud").unwrap(), "cloud", &cfg.defaults).unwrap();
        assert_eq!(client.backend(), BackendKind::Cloud);
        let Client::Cloud(cloud) = client else {
            panic!("expected a cloud client");
        };
        assert_eq!(cloud.base_url(), "https://staging.openmotics.test/api/v1.1");
        assert_eq!(cloud.installation_id(), Some(21));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let profile = Profile {
            base_url: Some("not a url".into()),
            token: Some("t".into()),
            ..Profile::default()
        };
        let err = connect(&profile, "config-test-badurl", &Defaults::default()).err();
        assert!(matches!(err, Some(ConfigError::Validation { ref field, .. }) if field == "base_url"));
    }
}
