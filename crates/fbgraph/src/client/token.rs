//! Access token collaborators.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fbgraph_common::error::{AuthError, ClientError, ConfigError, DecodeError};
use fbgraph_common::http_client::HttpClient;
use fbgraph_common::request::{GraphExt, GraphRequest, Response};
use fbgraph_common::retry::RetryPolicy;
use fbgraph_object::{Application, ObjectError};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tokio::sync::RwLock;
use url::Url;

use crate::config::GraphConfig;

/// Source of the access token attached to Graph calls.
///
/// Implementations cache the token and fetch a new one once it has been
/// [invalidated](AccessToken::invalidate).
#[cfg_attr(not(target_arch = "wasm32"), trait_variant::make(Send))]
pub trait AccessToken {
    /// Current token, fetching one first if needed.
    fn token(&self) -> impl Future<Output = Result<SmolStr, ClientError>>;

    /// Mark the cached token unusable; the next [`token`](AccessToken::token) call replaces it.
    fn invalidate(&self) -> impl Future<Output = ()>;

    /// Whether the next `token()` call has to fetch or will fail.
    fn is_stale(&self) -> impl Future<Output = bool>;
}

#[cfg(not(target_arch = "wasm32"))]
impl<T: AccessToken + Sync + Send> AccessToken for Arc<T> {
    fn token(&self) -> impl Future<Output = Result<SmolStr, ClientError>> + Send {
        self.as_ref().token()
    }

    fn invalidate(&self) -> impl Future<Output = ()> + Send {
        self.as_ref().invalidate()
    }

    fn is_stale(&self) -> impl Future<Output = bool> + Send {
        self.as_ref().is_stale()
    }
}

#[cfg(target_arch = "wasm32")]
impl<T: AccessToken> AccessToken for Arc<T> {
    fn token(&self) -> impl Future<Output = Result<SmolStr, ClientError>> {
        self.as_ref().token()
    }

    fn invalidate(&self) -> impl Future<Output = ()> {
        self.as_ref().invalidate()
    }

    fn is_stale(&self) -> impl Future<Output = bool> {
        self.as_ref().is_stale()
    }
}

/// No credential at all; only public fields can be read.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl AccessToken for NoToken {
    async fn token(&self) -> Result<SmolStr, ClientError> {
        Err(AuthError::NotAuthenticated.into())
    }

    async fn invalidate(&self) {}

    async fn is_stale(&self) -> bool {
        false
    }
}

/// A token issued elsewhere, typically through the login dialog.
///
/// Once invalidated it stays unusable until [`replace`](UserAccessToken::replace)
/// installs a fresh one.
#[derive(Debug)]
pub struct UserAccessToken {
    token: RwLock<Option<SmolStr>>,
}

impl UserAccessToken {
    /// Wrap a pre-issued token
    pub fn new(token: impl Into<SmolStr>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Install a new token
    pub async fn replace(&self, token: impl Into<SmolStr>) {
        *self.token.write().await = Some(token.into());
    }
}

impl AccessToken for UserAccessToken {
    async fn token(&self) -> Result<SmolStr, ClientError> {
        self.token
            .read()
            .await
            .clone()
            .ok_or_else(|| AuthError::TokenExpired.into())
    }

    async fn invalidate(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("user access token invalidated");
        *self.token.write().await = None;
    }

    async fn is_stale(&self) -> bool {
        self.token.read().await.is_none()
    }
}

/// What `debug_token` reports about a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Application the token was issued for
    #[serde(default)]
    pub app_id: Option<SmolStr>,
    /// Name of that application
    #[serde(default)]
    pub application: Option<SmolStr>,
    /// User the token acts for; absent for app tokens
    #[serde(default)]
    pub user_id: Option<SmolStr>,
    /// Whether the token can still be used
    #[serde(default)]
    pub is_valid: bool,
    /// Expiry; `None` or the epoch when the token does not expire
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Issue time, if reported
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub issued_at: Option<DateTime<Utc>>,
    /// Granted permissions
    #[serde(default)]
    pub scopes: Vec<SmolStr>,
}

impl TokenInfo {
    /// Whether the token has a real expiry that lies at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .filter(|at| at.timestamp() != 0)
            .is_some_and(|at| at <= now)
    }

    /// Whether `scope` was granted
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

#[derive(Debug, Default)]
struct TokenState {
    token: Option<SmolStr>,
    stale: bool,
    info: Option<TokenInfo>,
}

#[derive(Deserialize)]
struct TokenGrant {
    #[serde(default)]
    access_token: SmolStr,
}

#[derive(Deserialize)]
struct DebugEnvelope {
    data: TokenInfo,
}

/// An application access token obtained with the client credentials grant.
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use fbgraph::client::{AccessToken, AppAccessToken};
///
/// let token = AppAccessToken::new(reqwest::Client::new(), "2439131959", "s3cr3t");
/// let bearer = token.token().await?;
/// # Ok(())
/// # }
/// ```
pub struct AppAccessToken<C> {
    client: C,
    base: Url,
    retry: RetryPolicy,
    app_id: SmolStr,
    secret: SmolStr,
    state: RwLock<TokenState>,
}

impl<C: HttpClient> AppAccessToken<C> {
    /// Token source for the given app id and secret, using the default endpoint.
    pub fn new(client: C, app_id: impl Into<SmolStr>, secret: impl Into<SmolStr>) -> Self {
        let config = GraphConfig::default();
        Self {
            client,
            base: config.base_url,
            retry: config.retry,
            app_id: app_id.into(),
            secret: secret.into(),
            state: RwLock::new(TokenState::default()),
        }
    }

    /// Token source for an application that carries both its id and secret.
    pub fn for_application(client: C, app: &Application) -> Result<Self, ObjectError> {
        let (id, secret) = app.credentials()?;
        Ok(Self::new(client, id, secret))
    }

    /// Use the endpoint and retry policy of `config`.
    pub fn with_config(mut self, config: &GraphConfig) -> Result<Self, ConfigError> {
        self.base = config.base()?;
        self.retry = config.retry;
        Ok(self)
    }

    /// Start from a token obtained earlier instead of fetching one.
    pub fn with_token(self, token: impl Into<SmolStr>) -> Self {
        Self {
            state: RwLock::new(TokenState {
                token: Some(token.into()),
                ..TokenState::default()
            }),
            ..self
        }
    }

    /// The application id
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Introspection result of the last [`check`](Self::check), if any
    pub async fn last_info(&self) -> Option<TokenInfo> {
        self.state.read().await.info.clone()
    }
}

impl<C: HttpClient + Sync> AppAccessToken<C> {
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self), fields(app_id = %self.app_id)))]
    async fn fetch(&self) -> Result<SmolStr, ClientError> {
        let request = GraphRequest::get("oauth")
            .path("access_token")
            .param("client_id", self.app_id.clone())
            .param("client_secret", self.secret.clone())
            .param("grant_type", "client_credentials");
        let response = self
            .client
            .graph(self.base.clone())
            .retry(self.retry)
            .send(&request)
            .await?;
        parse_grant(&response)
    }

    /// Ask `debug_token` about `input_token`, authenticating with this app's token.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, input_token), fields(app_id = %self.app_id)))]
    pub async fn token_info(&self, input_token: &str) -> Result<TokenInfo, ClientError> {
        let request = GraphRequest::get("debug_token").param("input_token", input_token);
        let response = self
            .client
            .graph(self.base.clone())
            .retry(self.retry)
            .auth(self.token().await?)
            .send(&request)
            .await?;
        Ok(response.json::<DebugEnvelope>()?.data)
    }

    /// Introspect the current token, invalidating it if the server says it is unusable.
    pub async fn check(&self) -> Result<bool, ClientError> {
        let token = self.token().await?;
        let info = self.token_info(&token).await?;
        let usable = info.is_valid && !info.is_expired_at(Utc::now());
        let mut state = self.state.write().await;
        if !usable && state.token.as_ref() == Some(&token) {
            state.stale = true;
        }
        state.info = Some(info);
        Ok(usable)
    }
}

fn parse_grant(response: &Response) -> Result<SmolStr, ClientError> {
    // older endpoints answer `access_token=...` instead of JSON
    let grant = match response.json::<TokenGrant>() {
        Ok(grant) => grant,
        Err(_) => serde_html_form::from_bytes::<TokenGrant>(response.buffer())
            .map_err(DecodeError::from)?,
    };
    if grant.access_token.is_empty() {
        return Err(DecodeError::Missing("access_token").into());
    }
    Ok(grant.access_token)
}

impl<C: HttpClient + Sync> AccessToken for AppAccessToken<C> {
    async fn token(&self) -> Result<SmolStr, ClientError> {
        {
            let state = self.state.read().await;
            if let (Some(token), false) = (&state.token, state.stale) {
                return Ok(token.clone());
            }
        }

        let mut state = self.state.write().await;
        // someone else may have fetched while we waited for the lock
        if let (Some(token), false) = (&state.token, state.stale) {
            return Ok(token.clone());
        }
        let token = self.fetch().await?;
        state.token = Some(token.clone());
        state.stale = false;
        state.info = None;
        Ok(token)
    }

    async fn invalidate(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(app_id = %self.app_id, "app access token invalidated");
        self.state.write().await.stale = true;
    }

    async fn is_stale(&self) -> bool {
        let state = self.state.read().await;
        state.token.is_none() || state.stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;

    #[test]
    fn grant_bodies() {
        let json = Response::new(
            Bytes::from_static(br#"{"access_token":"123|abc","token_type":"bearer"}"#),
            StatusCode::OK,
        );
        assert_eq!(parse_grant(&json).unwrap(), "123|abc");

        let form = Response::new(Bytes::from_static(b"access_token=123%7Cabc"), StatusCode::OK);
        assert_eq!(parse_grant(&form).unwrap(), "123|abc");

        let empty = Response::new(Bytes::from_static(b"{}"), StatusCode::OK);
        assert!(matches!(
            parse_grant(&empty),
            Err(ClientError::Decode(DecodeError::Missing("access_token")))
        ));
    }

    #[test]
    fn token_info_expiry() {
        let info: TokenInfo = serde_json::from_value(serde_json::json!({
            "app_id": "138483919580948",
            "application": "Social Cafe",
            "expires_at": 0,
            "is_valid": true,
            "scopes": ["email", "user_likes"]
        }))
        .unwrap();
        assert!(!info.is_expired_at(Utc::now()));
        assert!(info.has_scope("email"));
        assert_eq!(info.user_id, None);

        let expired = TokenInfo {
            expires_at: DateTime::from_timestamp(1_000, 0),
            ..info
        };
        assert!(expired.is_expired_at(Utc::now()));
    }

    #[tokio::test]
    async fn user_token_stays_dead_until_replaced() {
        let token = UserAccessToken::new("EAAB");
        assert_eq!(token.token().await.unwrap(), "EAAB");
        token.invalidate().await;
        assert!(token.is_stale().await);
        assert!(matches!(
            token.token().await,
            Err(ClientError::Auth(AuthError::TokenExpired))
        ));
        token.replace("EAAC").await;
        assert_eq!(token.token().await.unwrap(), "EAAC");
    }

    #[tokio::test]
    async fn no_token_is_never_authenticated() {
        assert!(matches!(
            NoToken.token().await,
            Err(ClientError::Auth(AuthError::NotAuthenticated))
        ));
    }
}
