// Request engine shared by both backends.
//
// Every accessor call ends up here: the engine owns the pooled session,
// enforces the per-request timeout, runs the retry policy, classifies
// failures, and decodes bodies by content type.

use std::error::Error as StdError;
use std::io;

use reqwest::header::{self, HeaderMap};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::{Session, TransportConfig};

const BODY_PREVIEW_LEN: usize = 200;

// ── Request ──────────────────────────────────────────────────────────

/// Outbound request body.
#[derive(Debug, Clone)]
pub enum Body {
    /// Serialized as `application/json`.
    Json(Value),
    /// Serialized as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

/// A fully resolved request: the engine adds nothing but the session.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn query(mut self, query: &[(&str, String)]) -> Self {
        self.query
            .extend(query.iter().map(|(k, v)| ((*k).to_owned(), v.clone())));
        self
    }

    pub fn body(mut self, body: Option<Body>) -> Self {
        self.body = body;
        self
    }
}

// ── Response ─────────────────────────────────────────────────────────

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The response declared `application/json`.
    Json(Value),
    /// Anything else, verbatim.
    Text(String),
}

impl Payload {
    /// The JSON value, parsing text bodies that happen to be JSON.
    pub fn into_json(self) -> Result<Value, Error> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Text(text) => serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: format!("expected a JSON body: {e}"),
                body: text,
            }),
        }
    }

    /// Decode into a typed record.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, Error> {
        let value = self.into_json()?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// Executes requests on one client's pooled session.
#[derive(Debug)]
pub struct RequestEngine {
    transport: TransportConfig,
    session: Session,
}

impl RequestEngine {
    /// `shared` is a caller-owned session; without one the engine creates
    /// (and later closes) its own.
    pub fn new(transport: TransportConfig, shared: Option<reqwest::Client>) -> Self {
        let session = shared.map_or_else(Session::lazy, Session::shared);
        Self { transport, session }
    }

    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// Run `request` under the retry policy and return the decoded body.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Payload, Error> {
        self.transport
            .retry
            .run(|attempt| self.send_once(request, attempt))
            .await
    }

    async fn send_once(&self, request: &ApiRequest, attempt: u32) -> Result<Payload, Error> {
        let http = self.session.acquire(&self.transport)?;
        debug!(method = %request.method, url = %request.url, attempt, "sending request");

        let mut builder = http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::Form(fields)) => builder.form(fields),
            None => builder,
        };

        let exchange = async {
            let resp = builder.send().await.map_err(classify_transport)?;
            read_response(resp).await
        };

        let timeout = self.transport.timeout;
        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| Error::ConnectionTimeout { timeout })?
    }

    /// Release the session if the engine created it.
    pub fn close(&self) {
        self.session.close();
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// Whether the session was created by (and will be closed with) this engine.
    pub fn owns_session(&self) -> bool {
        self.session.is_owned()
    }
}

// ── Classification ───────────────────────────────────────────────────

/// Map an HTTP status onto the error taxonomy. Runs before any decoding.
async fn read_response(resp: reqwest::Response) -> Result<Payload, Error> {
    let status = resp.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("HTTP {status}"),
            status: Some(status.as_u16()),
        });
    }

    if status.is_client_error() || status.is_server_error() {
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(%status, error = %e, "failed to read error response body");
                String::new()
            }
        };
        return Err(Error::Connection {
            message: format!("HTTP {status}: {}", preview(&body)),
            status: Some(status.as_u16()),
            source: None,
        });
    }

    let is_json = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let body = resp.text().await.map_err(classify_transport)?;
    trace!(%status, body = preview(&body), "response body");

    if is_json {
        serde_json::from_str(&body)
            .map(Payload::Json)
            .map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })
    } else {
        Ok(Payload::Text(body))
    }
}

/// Classify a transport-level failure as TLS or plain connection error.
fn classify_transport(err: reqwest::Error) -> Error {
    if is_tls_failure(&err) {
        return Error::Ssl {
            message: error_chain(&err),
        };
    }
    Error::Connection {
        message: error_chain(&err),
        status: None,
        source: Some(err),
    }
}

fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = current {
        if has_rustls_error(e) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Look through nested `io::Error` wrappers for a rustls error. The
/// connector wraps it twice, and `io::Error::source` does not expose the
/// wrapped value, so `get_ref` is followed at every level.
fn has_rustls_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current = err;
    loop {
        if current.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        match current.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
            Some(inner) => current = inner,
            None => return false,
        }
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        message.push_str(": ");
        message.push_str(&e.to_string());
        current = e.source();
    }
    message
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_payload_decodes_into_records() {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<u32>,
        }
        let payload = Payload::Json(json!({"data": [3, 1, 2]}));
        let envelope: Envelope = payload.decode().unwrap();
        assert_eq!(envelope.data, vec![3, 1, 2]);
    }

    #[test]
    fn text_payload_that_is_json_still_decodes() {
        let payload = Payload::Text(r#"{"success": true}"#.into());
        assert_eq!(payload.into_json().unwrap(), json!({"success": true}));
    }

    #[test]
    fn non_json_text_fails_to_decode_as_generic() {
        let err = Payload::Text("OK".into()).into_json().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Generic);
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        assert_eq!(preview(&long).chars().count(), BODY_PREVIEW_LEN);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn request_builder_merges_query_and_headers() {
        let url = Url::parse("https://example.com/x").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "application/json".parse().unwrap());
        let req = ApiRequest::new(Method::GET, url)
            .headers(headers)
            .query(&[("filter", "lights".to_owned())]);
        assert_eq!(req.query, vec![("filter".to_owned(), "lights".to_owned())]);
        assert!(req.headers.contains_key(header::ACCEPT));
        assert!(req.body.is_none());
    }

    #[test]
    fn rustls_error_is_found_through_nested_io_errors() {
        let tls = rustls::Error::InvalidMessage(rustls::InvalidMessage::InvalidContentType);
        let wrapped = io::Error::other(io::Error::new(io::ErrorKind::InvalidData, tls));
        assert!(has_rustls_error(&wrapped));
    }

    #[test]
    fn plain_io_errors_are_not_tls() {
        let refused =
            io::Error::new(io::ErrorKind::ConnectionRefused, "handshake with proxy failed");
        assert!(!has_rustls_error(&refused));
    }
}
