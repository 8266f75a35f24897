// Local gateway REST client
//
// The gateway exposes a flat action namespace: every call is a form-encoded
// `POST https://{host}:{port}/{action}`. Device configurations rarely
// change, so each kind's configuration list is fetched once and cached;
// statuses are fetched on every listing.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::Method;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{Credentials, TokenCell, TokenState};
use crate::backend::{self, Backend};
use crate::engine::{ApiRequest, Body, Payload, RequestEngine};
use crate::error::Error;
use crate::transport::{self, TlsMode, TransportConfig};

/// Default HTTPS port of the gateway.
pub const DEFAULT_PORT: u16 = 443;

pub(crate) const ACCEPT: &str = "application/json, text/plain, */*";

// ── Configuration cache ──────────────────────────────────────────────

/// Configuration list of one device kind, filled on first success.
#[derive(Debug, Default)]
pub(crate) struct ConfigCache(RwLock<Option<Vec<Value>>>);

impl ConfigCache {
    fn get(&self) -> Option<Vec<Value>> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn store(&self, configs: Vec<Value>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(configs);
    }
}

#[derive(Debug, Default)]
pub(crate) struct ConfigCaches {
    pub(crate) outputs: ConfigCache,
    pub(crate) inputs: ConfigCache,
    pub(crate) sensors: ConfigCache,
    pub(crate) shutters: ConfigCache,
    pub(crate) thermostat_groups: ConfigCache,
    pub(crate) thermostat_units: ConfigCache,
    pub(crate) energy_modules: ConfigCache,
}

// ── LocalGateway ─────────────────────────────────────────────────────

/// Client for one on-premises gateway.
///
/// Authentication is a username/password login returning a session token,
/// which is assumed valid for an hour and renewed transparently.
pub struct LocalGateway {
    base_url: Url,
    engine: RequestEngine,
    pub(crate) credentials: Credentials,
    pub(crate) token: TokenCell,
    pub(crate) configs: ConfigCaches,
}

/// Builder for [`LocalGateway`].
pub struct LocalGatewayBuilder {
    host: String,
    port: u16,
    base_url: Option<String>,
    credentials: Credentials,
    transport: TransportConfig,
    session: Option<reqwest::Client>,
}

impl LocalGatewayBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Use `base_url` instead of `https://{host}:{port}/`, e.g. a plain-http
    /// proxy in front of the gateway.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Transport settings. Gateways ship self-signed certificates, so the
    /// default accepts invalid certificates; pass `TlsMode::System` or a
    /// custom CA to verify.
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Issue requests through a caller-owned session. The gateway client
    /// never closes it.
    pub fn session(mut self, http: reqwest::Client) -> Self {
        self.session = Some(http);
        self
    }

    pub fn build(self) -> Result<LocalGateway, Error> {
        let raw = self
            .base_url
            .unwrap_or_else(|| format!("https://{}:{}/", self.host, self.port));
        let base_url = if raw.ends_with('/') {
            Url::parse(&raw)?
        } else {
            Url::parse(&format!("{raw}/"))?
        };

        debug!(base_url = %base_url, "local gateway configured");
        Ok(LocalGateway {
            base_url,
            engine: RequestEngine::new(self.transport, self.session),
            credentials: self.credentials,
            token: TokenCell::default(),
            configs: ConfigCaches::default(),
        })
    }
}

impl LocalGateway {
    pub fn builder(host: impl Into<String>, credentials: Credentials) -> LocalGatewayBuilder {
        LocalGatewayBuilder {
            host: host.into(),
            port: DEFAULT_PORT,
            base_url: None,
            credentials,
            transport: TransportConfig::default().with_tls(TlsMode::DangerAcceptInvalid),
            session: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn token_state(&self) -> TokenState {
        self.token.snapshot()
    }

    /// Replace the cached session token, e.g. one persisted from an earlier
    /// run.
    pub fn set_token_state(&self, state: TokenState) {
        self.token.replace(state);
    }

    pub(crate) fn engine(&self) -> &RequestEngine {
        &self.engine
    }

    /// Run a gateway action with a form body.
    pub async fn exec_action(
        &self,
        action: &str,
        form: &[(&str, String)],
    ) -> Result<Payload, Error> {
        let headers = self.build_auth_headers().await?;
        let url = self.build_url(action, None)?;
        let fields = form
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();
        let request = ApiRequest::new(Method::POST, url)
            .headers(headers)
            .body(Some(Body::Form(fields)));
        self.engine.execute(&request).await.inspect_err(|e| {
            if e.is_auth_failure() {
                debug!(action, "gateway rejected the session token");
                self.invalidate_token();
            }
        })
    }

    /// Run `action` and return the JSON value under `key` (`Null` when the
    /// gateway omits it).
    pub(crate) async fn action_field(&self, action: &str, key: &str) -> Result<Value, Error> {
        let mut reply = self.exec_action(action, &[]).await?.into_json()?;
        Ok(reply.get_mut(key).map(Value::take).unwrap_or_default())
    }

    /// The configuration list behind `action`, from `cache` when present.
    ///
    /// A reply without `"success": true` yields an empty list and leaves
    /// the cache empty so the next call asks again.
    pub(crate) async fn configurations(
        &self,
        action: &str,
        cache: &ConfigCache,
    ) -> Result<Vec<Value>, Error> {
        self.cached_list(action, "config", cache).await
    }

    /// Like [`Self::configurations`], for replies that carry the list under
    /// `key`.
    pub(crate) async fn cached_list(
        &self,
        action: &str,
        key: &str,
        cache: &ConfigCache,
    ) -> Result<Vec<Value>, Error> {
        if let Some(configs) = cache.get() {
            return Ok(configs);
        }

        let reply = self.exec_action(action, &[]).await?.into_json()?;
        if reply.get("success").and_then(Value::as_bool) != Some(true) {
            warn!(action, "gateway did not return configurations");
            return Ok(Vec::new());
        }

        let configs = match reply.get(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        debug!(action, count = configs.len(), "caching configurations");
        cache.store(configs.clone());
        Ok(configs)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Release the HTTP session if this client created it.
    pub fn close(&self) {
        self.engine.close();
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_closed()
    }

    pub fn owns_session(&self) -> bool {
        self.engine.owns_session()
    }

    /// Run `f` with the gateway, then close it whether `f` succeeded or not.
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

impl Backend for LocalGateway {
    fn build_url(&self, path: &str, scheme: Option<&str>) -> Result<Url, Error> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        backend::with_scheme(url, scheme)
    }

    async fn build_auth_headers(&self) -> Result<HeaderMap, Error> {
        let token = self.ensure_valid_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(transport::USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(header::AUTHORIZATION, backend::bearer(&token)?);
        Ok(headers)
    }

    async fn build_ws_headers(&self) -> Result<HeaderMap, Error> {
        let token = self.ensure_valid_token().await?;
        backend::ws_auth_headers(&token)
    }

    fn invalidate_token(&self) {
        self.token.clear();
    }

    fn ws_path(&self) -> &'static str {
        "/ws_events"
    }

    fn transport(&self) -> &TransportConfig {
        self.engine.transport()
    }
}
