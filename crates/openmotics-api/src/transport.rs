// Shared transport configuration and pooled-session ownership.
//
// Both the cloud client and the local gateway build their `reqwest::Client`
// through this module, and both track whether they own that client so that
// closing never tears down a session the caller handed in.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tracing::debug;

use crate::error::Error;
use crate::retry::RetryPolicy;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the bundled web PKI roots (strict).
    #[default]
    System,
    /// Trust a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed local gateways).
    DangerAcceptInvalid,
}

impl TlsMode {
    /// Map the `verify_ssl` flag used by gateway configs onto a mode.
    pub fn from_verify(verify_ssl: bool) -> Self {
        if verify_ssl {
            Self::System
        } else {
            Self::DangerAcceptInvalid
        }
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl TransportConfig {
    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// The per-request timeout is enforced by the engine, not the client, so
    /// that an externally supplied client gets the same guarantee.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path).map_err(|e| Error::Ssl {
                    message: format!("failed to read CA cert {}: {e}", path.display()),
                })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| Error::Ssl {
                    message: format!("invalid CA cert: {e}"),
                })?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder.build().map_err(|e| Error::Ssl {
            message: format!("failed to build HTTP client: {e}"),
        })
    }
}

// ── Session ownership ────────────────────────────────────────────────

#[derive(Debug)]
enum SessionState {
    /// No session yet; one is created on first use.
    Unopened,
    /// Created by the client, dropped on close.
    Owned(reqwest::Client),
    /// Supplied by the caller, never closed by the client.
    Shared(reqwest::Client),
    /// The owned session was released.
    Closed,
}

/// The pooled HTTP session a client issues all its requests through.
///
/// Lazily created at most once. `reqwest::Client` is reference counted, so
/// handing out clones shares the same connection pool.
#[derive(Debug)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    /// A session the client will create on first use and own.
    pub fn lazy() -> Self {
        Self {
            state: RwLock::new(SessionState::Unopened),
        }
    }

    /// A caller-supplied session the client must never close.
    pub fn shared(http: reqwest::Client) -> Self {
        Self {
            state: RwLock::new(SessionState::Shared(http)),
        }
    }

    /// Get the pooled client, creating it from `transport` if needed.
    pub fn acquire(&self, transport: &TransportConfig) -> Result<reqwest::Client, Error> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            match &*state {
                SessionState::Owned(http) | SessionState::Shared(http) => return Ok(http.clone()),
                SessionState::Closed => return Err(Error::generic("client session is closed")),
                SessionState::Unopened => {}
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have created it between the two locks.
        match &*state {
            SessionState::Owned(http) | SessionState::Shared(http) => Ok(http.clone()),
            SessionState::Closed => Err(Error::generic("client session is closed")),
            SessionState::Unopened => {
                debug!("creating pooled HTTP session");
                let http = transport.build_client()?;
                *state = SessionState::Owned(http.clone());
                Ok(http)
            }
        }
    }

    /// Release the session if this client created it.
    ///
    /// A shared session stays usable, both for the caller and for this client.
    pub fn close(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            SessionState::Owned(_) | SessionState::Unopened => {
                debug!("closing owned HTTP session");
                *state = SessionState::Closed;
            }
            SessionState::Shared(_) | SessionState::Closed => {}
        }
    }

    /// Whether the client created (and therefore owns) its session.
    pub fn is_owned(&self) -> bool {
        matches!(
            *self.state.read().unwrap_or_else(PoisonError::into_inner),
            SessionState::Owned(_)
        )
    }

    /// Whether the session has been released.
    pub fn is_closed(&self) -> bool {
        matches!(
            *self.state.read().unwrap_or_else(PoisonError::into_inner),
            SessionState::Closed
        )
    }
}
