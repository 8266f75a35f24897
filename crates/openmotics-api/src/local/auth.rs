// Local gateway authentication
//
// `POST /login` with the credentials as a form body. The gateway answers
// `{ "success": bool, "token": "..." }`; the token carries no expiry, so
// it is kept for `LOCAL_TOKEN_TTL`.

use chrono::Utc;
use reqwest::Method;
use reqwest::header::{self, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::{LOCAL_TOKEN_TTL, TokenState};
use crate::backend::Backend;
use crate::engine::{ApiRequest, Body};
use crate::error::Error;
use crate::local::client::{ACCEPT, LocalGateway};
use crate::transport;

#[derive(Debug, Deserialize)]
struct LoginReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    token: Option<String>,
}

impl LocalGateway {
    /// Log in and store the new session token.
    ///
    /// Any outcome other than `"success": true` with a token clears the
    /// stored token. A refused login fails with `Authentication`; transport
    /// failures are returned as they are.
    pub async fn login(&self) -> Result<SecretString, Error> {
        let url = self.build_url("login", None)?;
        debug!(url = %url, username = %self.credentials.username, "logging in to gateway");

        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(transport::USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        let form = vec![
            ("username".to_owned(), self.credentials.username.clone()),
            (
                "password".to_owned(),
                self.credentials.password.expose_secret().to_owned(),
            ),
        ];
        let request = ApiRequest::new(Method::POST, url)
            .headers(headers)
            .body(Some(Body::Form(form)));

        let reply = match self.engine().execute(&request).await {
            Ok(payload) => payload.decode::<LoginReply>(),
            Err(e) => Err(e),
        };

        match reply {
            Ok(LoginReply {
                success: true,
                token: Some(token),
            }) => {
                let token = SecretString::from(token);
                self.token
                    .replace(TokenState::issued(token.clone(), Utc::now(), LOCAL_TOKEN_TTL));
                info!("gateway login successful");
                Ok(token)
            }
            Ok(_) => {
                self.token.clear();
                warn!("gateway refused the login");
                Err(Error::Authentication {
                    message: "gateway refused the login".into(),
                    status: None,
                })
            }
            Err(e) => {
                self.token.clear();
                Err(e)
            }
        }
    }

    /// A token usable right now, logging in first when the cached one is
    /// missing or about to expire.
    pub async fn ensure_valid_token(&self) -> Result<SecretString, Error> {
        let state = self.token.snapshot();
        match state.token() {
            Some(token) if !state.needs_refresh(Utc::now()) => Ok(token.clone()),
            _ => self.login().await,
        }
    }
}
