use std::future::Future;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{self, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// The capability surface shared by the cloud client and the local gateway.
///
/// The websocket stream and other backend-agnostic helpers are written
/// against this trait rather than a concrete client.
pub trait Backend: Send + Sync {
    /// Resolve `path` against the backend's base URL. `scheme` replaces the
    /// URL scheme (e.g. `wss`) without touching the path.
    fn build_url(&self, path: &str, scheme: Option<&str>) -> Result<Url, Error>;

    /// Headers for an authenticated REST call, refreshing the token first
    /// when needed.
    fn build_auth_headers(&self) -> impl Future<Output = Result<HeaderMap, Error>> + Send;

    /// Headers for the websocket upgrade request.
    fn build_ws_headers(&self) -> impl Future<Output = Result<HeaderMap, Error>> + Send;

    /// Path of the event websocket endpoint.
    fn ws_path(&self) -> &'static str;

    /// Transport settings, used for websocket TLS.
    fn transport(&self) -> &TransportConfig;

    /// Forget the cached token after the server rejected it, so the next
    /// call authenticates again.
    fn invalidate_token(&self) {}

    /// Message sent right after the websocket opens, if the backend needs one.
    fn ws_subscription(&self) -> Option<serde_json::Value> {
        None
    }

    /// The websocket URL: `ws_path` with the secure or plain websocket
    /// scheme matching the REST base URL.
    fn ws_url(&self) -> Result<Url, Error> {
        let rest = self.build_url(self.ws_path(), None)?;
        let scheme = if rest.scheme() == "http" { "ws" } else { "wss" };
        self.build_url(self.ws_path(), Some(scheme))
    }
}

/// Replace the scheme of `url`, keeping everything else.
pub(crate) fn with_scheme(mut url: Url, scheme: Option<&str>) -> Result<Url, Error> {
    if let Some(scheme) = scheme {
        if url.scheme() != scheme {
            url.set_scheme(scheme)
                .map_err(|()| Error::generic(format!("cannot switch {url} to scheme {scheme}")))?;
        }
    }
    Ok(url)
}

/// `Authorization: Bearer <token>`, marked sensitive.
pub(crate) fn bearer(token: &SecretString) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// The websocket auth header: the token travels base64-encoded inside the
/// `Sec-WebSocket-Protocol` value.
pub(crate) fn ws_auth_headers(token: &SecretString) -> Result<HeaderMap, Error> {
    let encoded = STANDARD.encode(token.expose_secret());
    let mut value = HeaderValue::from_str(&format!("authorization.bearer.{encoded}"))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(header::SEC_WEBSOCKET_PROTOCOL, value);
    Ok(headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn scheme_override_keeps_path() {
        let url = Url::parse("https://api.openmotics.com/api/v1.1/ws/events").unwrap();
        let wss = with_scheme(url, Some("wss")).unwrap();
        assert_eq!(wss.as_str(), "wss://api.openmotics.com/api/v1.1/ws/events");
    }

    #[test]
    fn no_override_is_identity() {
        let url = Url::parse("https://gw.local:443/login").unwrap();
        assert_eq!(with_scheme(url.clone(), None).unwrap(), url);
    }

    #[test]
    fn ws_header_carries_base64_token() {
        let headers = ws_auth_headers(&SecretString::from("abc")).unwrap();
        let value = headers.get(header::SEC_WEBSOCKET_PROTOCOL).unwrap();
        assert_eq!(value.to_str().unwrap(), "authorization.bearer.YWJj");
        assert!(value.is_sensitive());
    }

    #[test]
    fn bearer_header_is_sensitive() {
        let value = bearer(&SecretString::from("tok")).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer tok");
        assert!(value.is_sensitive());
    }
}
