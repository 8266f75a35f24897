use std::time::Duration;

use thiserror::Error;

/// The five failure kinds a caller can observe.
///
/// The taxonomy is flat and rooted at [`ErrorKind::Generic`]:
/// `ConnectionTimeout` is a specialisation of `Connection`, while `Ssl` and
/// `Authentication` are siblings of `Connection` (never subtypes of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Library misuse or an unexpected payload.
    Generic,
    /// Transport failure, or an HTTP error status other than 401/403.
    Connection,
    /// The request exceeded the configured timeout.
    ConnectionTimeout,
    /// TLS negotiation or certificate validation failed.
    Ssl,
    /// The gateway or cloud rejected the credentials (HTTP 401/403, or a
    /// refused login).
    Authentication,
}

/// Top-level error type for the `openmotics-api` crate.
///
/// Every public operation either returns decoded data or exactly one of these.
/// Use [`Error::kind`] to branch on the taxonomy instead of matching variants
/// when only the failure class matters.
#[derive(Debug, Error)]
pub enum Error {
    // ── Generic ─────────────────────────────────────────────────────
    /// Misuse of the client (closed client, missing installation id, ...).
    #[error("{message}")]
    Generic { message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header value could not be built from the supplied token or input.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// JSON decoding into a typed record failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Connection ──────────────────────────────────────────────────
    /// Transport failure (DNS, refused connection, reset) or an HTTP error
    /// status. `status` is `None` for transport-level failures.
    #[error("Error occurred while communicating with OpenMotics API: {message}")]
    Connection {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The request did not complete within the configured timeout.
    #[error("Timeout occurred while connecting to OpenMotics API (after {timeout:?})")]
    ConnectionTimeout { timeout: Duration },

    // ── TLS ─────────────────────────────────────────────────────────
    /// TLS handshake or certificate error (expired, self-signed, wrong host).
    #[error("Error with SSL certificate: {message}")]
    Ssl { message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected (HTTP 401/403) or the gateway refused a login.
    #[error("Authentication failed: {message}")]
    Authentication { message: String, status: Option<u16> },
}

impl Error {
    pub(crate) fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// The taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generic { .. }
            | Self::InvalidUrl(_)
            | Self::InvalidHeader(_)
            | Self::Deserialization { .. } => ErrorKind::Generic,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::ConnectionTimeout { .. } => ErrorKind::ConnectionTimeout,
            Self::Ssl { .. } => ErrorKind::Ssl,
            Self::Authentication { .. } => ErrorKind::Authentication,
        }
    }

    /// Returns `true` for `Connection` and its `ConnectionTimeout` subtype.
    pub fn is_connection(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Connection | ErrorKind::ConnectionTimeout
        )
    }

    /// Returns `true` if the failure happened below HTTP and another
    /// attempt might succeed.
    ///
    /// HTTP error statuses are classified as `Connection` too, but they are
    /// answers from the server and are not retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection { status, .. } => status.is_none(),
            Self::ConnectionTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the credentials were rejected. Callers should treat
    /// this as the signal to force a fresh login before the next attempt.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// The HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Connection { status, .. } | Self::Authentication { status, .. } => *status,
            _ => None,
        }
    }
}
