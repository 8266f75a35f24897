// OpenMotics cloud REST client
//
// Bearer-token client for `api.openmotics.com`. Nearly every path is
// scoped to the current installation; the resource accessors in the
// sibling modules build those paths and decode the `{ "data": ... }`
// envelope.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use futures_util::FutureExt;
use reqwest::Method;
use reqwest::header::{self, HeaderMap, HeaderValue};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::auth::{TokenCell, TokenRefresh, TokenState};
use crate::backend::{self, Backend};
use crate::engine::{ApiRequest, Body, Payload, RequestEngine};
use crate::error::Error;
use crate::models::DataEnvelope;
use crate::transport::{self, TransportConfig};

/// Default cloud API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openmotics.com/api/v1.1";

/// Event types the cloud websocket is asked to deliver.
pub const SUBSCRIPTION_TYPES: &[&str] = &[
    "OUTPUT_CHANGE",
    "SENSOR_CHANGE",
    "SHUTTER_CHANGE",
    "THERMOSTAT_CHANGE",
    "THERMOSTAT_GROUP_CHANGE",
    "VENTILATION_CHANGE",
    "INPUT_TRIGGER",
];

/// Client for the OpenMotics cloud API.
///
/// The OAuth2 exchange is the caller's job: pass the resulting access
/// token, and optionally a [`TokenRefresh`] callback which is consulted
/// before every request.
pub struct CloudClient {
    base_url: String,
    engine: RequestEngine,
    token: TokenCell,
    token_refresh: Option<TokenRefresh>,
    installation_id: RwLock<Option<u64>>,
}

/// Builder for [`CloudClient`].
pub struct CloudClientBuilder {
    token: SecretString,
    base_url: String,
    transport: TransportConfig,
    session: Option<reqwest::Client>,
    token_refresh: Option<TokenRefresh>,
    installation_id: Option<u64>,
}

impl CloudClientBuilder {
    /// Override the API root (no trailing slash needed).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Issue requests through a caller-owned session. The client never
    /// closes it.
    pub fn session(mut self, http: reqwest::Client) -> Self {
        self.session = Some(http);
        self
    }

    /// Fetch a fresh token before every request.
    pub fn token_refresh<F, Fut>(mut self, refresh: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SecretString, Error>> + Send + 'static,
    {
        self.token_refresh = Some(Arc::new(move || refresh().boxed()));
        self
    }

    pub fn installation_id(mut self, installation_id: u64) -> Self {
        self.installation_id = Some(installation_id);
        self
    }

    pub fn build(self) -> CloudClient {
        let base_url = self.base_url.trim_end_matches('/').to_owned();
        CloudClient {
            base_url,
            engine: RequestEngine::new(self.transport, self.session),
            token: TokenCell::new(TokenState::non_expiring(self.token)),
            token_refresh: self.token_refresh,
            installation_id: RwLock::new(self.installation_id),
        }
    }
}

impl CloudClient {
    pub fn builder(token: impl Into<SecretString>) -> CloudClientBuilder {
        CloudClientBuilder {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            transport: TransportConfig::default(),
            session: None,
            token_refresh: None,
            installation_id: None,
        }
    }

    /// A client with default transport settings and base URL.
    pub fn new(token: impl Into<SecretString>) -> Self {
        Self::builder(token).build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Installation scope ───────────────────────────────────────────

    /// The installation that scopes resource paths.
    pub fn installation_id(&self) -> Option<u64> {
        *self
            .installation_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_installation_id(&self, installation_id: u64) {
        debug!(installation_id, "switching installation");
        *self
            .installation_id
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(installation_id);
    }

    /// `/base/installations/{id}{suffix}` for the current installation.
    pub(crate) fn installation_path(&self, suffix: &str) -> Result<String, Error> {
        let id = self.installation_id().ok_or_else(|| {
            Error::generic("no installation selected; call set_installation_id first")
        })?;
        Ok(format!("/base/installations/{id}{suffix}"))
    }

    // ── Token ────────────────────────────────────────────────────────

    pub fn token_state(&self) -> TokenState {
        self.token.snapshot()
    }

    /// Replace the cached token, e.g. after an out-of-band OAuth2 refresh.
    pub fn set_token(&self, token: impl Into<SecretString>) {
        self.token.replace(TokenState::non_expiring(token.into()));
    }

    /// A token usable right now.
    ///
    /// With a refresh callback configured, the callback runs on every call
    /// and its result replaces the cached token.
    pub async fn ensure_valid_token(&self) -> Result<SecretString, Error> {
        if let Some(refresh) = &self.token_refresh {
            let token = refresh().await?;
            debug!("cloud token refreshed");
            self.token.replace(TokenState::non_expiring(token.clone()));
            return Ok(token);
        }

        let state = self.token.snapshot();
        match state.token() {
            Some(token) if !state.needs_refresh(Utc::now()) => Ok(token.clone()),
            _ => Err(Error::Authentication {
                message: "no valid cloud token and no refresh callback configured".into(),
                status: None,
            }),
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Authenticated request relative to the API root.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Payload, Error> {
        let headers = self.build_auth_headers().await?;
        let url = self.build_url(path, None)?;
        let request = ApiRequest::new(method, url)
            .headers(headers)
            .query(query)
            .body(body.map(Body::Json));
        self.engine.execute(&request).await
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Payload, Error> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Payload, Error> {
        self.request(Method::POST, path, &[], body).await
    }

    /// GET `path` and unwrap the `data` envelope into `T`.
    pub(crate) async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let envelope: DataEnvelope<T> = self.get(path, query).await?.decode()?;
        Ok(envelope.data)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Release the HTTP session if this client created it. A session
    /// supplied through the builder stays open.
    pub fn close(&self) {
        self.engine.close();
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_closed()
    }

    pub fn owns_session(&self) -> bool {
        self.engine.owns_session()
    }

    /// Run `f` with the client, then close it whether `f` succeeded or not.
    pub async fn scope<F, Fut, T>(self: Arc<Self>, f: F) -> Result<T, Error>
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let result = f(Arc::clone(&self)).await;
        self.close();
        result
    }
}

impl Backend for CloudClient {
    fn build_url(&self, path: &str, scheme: Option<&str>) -> Result<Url, Error> {
        let url = Url::parse(&format!("{}{path}", self.base_url))?;
        backend::with_scheme(url, scheme)
    }

    async fn build_auth_headers(&self) -> Result<HeaderMap, Error> {
        let token = self.ensure_valid_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(transport::USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::AUTHORIZATION, backend::bearer(&token)?);
        Ok(headers)
    }

    async fn build_ws_headers(&self) -> Result<HeaderMap, Error> {
        let token = self.ensure_valid_token().await?;
        backend::ws_auth_headers(&token)
    }

    fn ws_path(&self) -> &'static str {
        "/ws/events"
    }

    fn transport(&self) -> &TransportConfig {
        self.engine.transport()
    }

    fn ws_subscription(&self) -> Option<Value> {
        let installation_id = self.installation_id()?;
        Some(json!({
            "type": "ACTION",
            "data": {
                "action": "set_subscription",
                "types": SUBSCRIPTION_TYPES,
                "installation_ids": installation_id,
            },
        }))
    }
}
