//! # Stateless Graph API requests and response mapping
//!
//! Mapping overview:
//! - Success (2xx): the body is handed back untouched in a [`Response`].
//! - Graph error envelope with code 190 (or a bare 401): `AuthError::TokenExpired`
//!   (`InvalidToken` for the subcodes that mean the token can never work again).
//! - 403, code 10 or codes 200..=299: `AuthError::InsufficientPermissions`.
//! - Other `OAuthException`s on a 400: `AuthError::Rejected`.
//! - Any other envelope: `ClientError::Api`; no envelope at all: `ClientError::Http`.
//!
//! Transient transport failures are retried according to the call's [`RetryPolicy`];
//! invalid requests and HTTP responses never are.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, Request, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use smol_str::SmolStr;
use url::Url;

use crate::error::{
    AuthError, ClientError, DecodeError, EncodeError, GraphApiError, HttpError, Result,
    TransportError,
};
use crate::http_client::HttpClient;
use crate::retry::RetryPolicy;
use crate::value::FieldValue;

/// A single Graph API call: a node, an optional edge path, and query parameters.
///
/// ```
/// use fbgraph_common::request::GraphRequest;
///
/// let req = GraphRequest::get("2439131959")
///     .path("/subscriptions/")
///     .fields(["object", "callback_url"])
///     .unwrap();
/// assert_eq!(req.endpoint(), "2439131959/subscriptions");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRequest {
    method: Method,
    node: SmolStr,
    path: Option<SmolStr>,
    fields: Vec<SmolStr>,
    params: Vec<(SmolStr, SmolStr)>,
}

impl GraphRequest {
    fn with_method(method: Method, node: impl Into<SmolStr>) -> Self {
        Self {
            method,
            node: node.into(),
            path: None,
            fields: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Read a node.
    pub fn get(node: impl Into<SmolStr>) -> Self {
        Self::with_method(Method::GET, node)
    }

    /// Publish to a node.
    pub fn post(node: impl Into<SmolStr>) -> Self {
        Self::with_method(Method::POST, node)
    }

    /// Delete a node or edge.
    pub fn delete(node: impl Into<SmolStr>) -> Self {
        Self::with_method(Method::DELETE, node)
    }

    /// Address an edge below the node. Surrounding slashes are dropped.
    pub fn path(mut self, path: &str) -> Self {
        let trimmed = path.trim_matches('/');
        self.path = (!trimmed.is_empty()).then(|| SmolStr::new(trimmed));
        self
    }

    /// Restrict the response to the named fields.
    pub fn fields<I, S>(mut self, fields: I) -> core::result::Result<Self, EncodeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for field in fields {
            let field = field.as_ref();
            if field.is_empty()
                || !field
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_')
            {
                return Err(EncodeError::InvalidFieldName(field.into()));
            }
            self.fields.push(field.into());
        }
        Ok(self)
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Node id
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Requested fields, in request order
    pub fn requested_fields(&self) -> &[SmolStr] {
        &self.fields
    }

    /// `node` or `node/path`
    pub fn endpoint(&self) -> String {
        match &self.path {
            Some(path) => format!("{}/{}", self.node, path),
            None => self.node.to_string(),
        }
    }

    fn query_pairs(&self) -> Vec<(&str, String)> {
        let mut pairs: Vec<(&str, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.to_string()))
            .collect();
        if !self.fields.is_empty() {
            pairs.push(("fields", self.fields.join(",")));
        }
        pairs
    }
}

/// Per-request options for Graph calls.
#[derive(Debug, Default, Clone)]
pub struct CallOptions {
    /// Access token sent as `Authorization: Bearer ...`
    pub access_token: Option<SmolStr>,
    /// Extra headers to attach to this request.
    pub extra_headers: Vec<(HeaderName, HeaderValue)>,
}

/// Extension for stateless Graph calls on any `HttpClient`.
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use fbgraph_common::request::{GraphExt, GraphRequest};
///
/// let http = reqwest::Client::new();
/// let base = url::Url::parse("https://graph.facebook.com")?;
/// let resp = http.graph(base).send(&GraphRequest::get("me")).await?;
/// # Ok(())
/// # }
/// ```
pub trait GraphExt: HttpClient {
    /// Start building a Graph call for the given base URL.
    fn graph<'a>(&'a self, base: Url) -> GraphCall<'a, Self>
    where
        Self: Sized,
    {
        GraphCall {
            client: self,
            base,
            opts: CallOptions::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl<T: HttpClient> GraphExt for T {}

/// Stateless Graph call builder.
pub struct GraphCall<'a, C: HttpClient> {
    pub(crate) client: &'a C,
    pub(crate) base: Url,
    pub(crate) opts: CallOptions,
    pub(crate) retry: RetryPolicy,
}

impl<'a, C: HttpClient> GraphCall<'a, C> {
    /// Apply an access token to this call.
    pub fn auth(mut self, token: impl Into<SmolStr>) -> Self {
        self.opts.access_token = Some(token.into());
        self
    }
    /// Add an extra header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.opts.extra_headers.push((name, value));
        self
    }
    /// Use the given retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Send the request, retrying transient transport failures, and classify the response.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, request), fields(method = %request.method, endpoint = %request.endpoint())))]
    pub async fn send(self, request: &GraphRequest) -> Result<Response> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let http_request = build_http_request(&self.base, request, &self.opts)?;
            let failure: TransportError =
                match tokio::time::timeout(self.retry.timeout, self.client.send_http(http_request))
                    .await
                {
                    Ok(Ok(http_response)) => return process_response(http_response),
                    Ok(Err(e)) => e.into(),
                    Err(_) => TransportError::Timeout,
                };

            if !failure.is_transient() {
                return Err(failure.into());
            }
            if attempt >= max_attempts {
                return Err(TransportError::Exhausted {
                    attempts: attempt,
                    last: Box::new(failure),
                }
                .into());
            }

            let delay = self.retry.delay_after(attempt);
            #[cfg(feature = "tracing")]
            tracing::warn!(attempt, ?delay, error = %failure, "graph request failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Build an HTTP request for a Graph call given base URL and options
pub fn build_http_request(
    base: &Url,
    req: &GraphRequest,
    opts: &CallOptions,
) -> core::result::Result<Request<Vec<u8>>, ClientError> {
    let node = req.node.trim_matches('/');
    if node.is_empty() {
        return Err(EncodeError::EmptyNode.into());
    }

    let mut url = base.clone();
    let mut path = url.path().trim_end_matches('/').to_owned();
    path.push('/');
    path.push_str(node);
    if let Some(edge) = &req.path {
        path.push('/');
        path.push_str(edge);
    }
    url.set_path(&path);

    let pairs = req.query_pairs();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        let qs = serde_html_form::to_string(&pairs).map_err(EncodeError::from)?;
        url.set_query(Some(&qs));
    }

    let mut builder = Request::builder()
        .method(req.method.clone())
        .uri(url.as_str())
        .header(header::ACCEPT, "application/json");

    if let Some(token) = &opts.access_token {
        let hv = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            TransportError::InvalidRequest(format!("Invalid access token: {}", e))
        })?;
        builder = builder.header(header::AUTHORIZATION, hv);
    }
    for (name, value) in &opts.extra_headers {
        builder = builder.header(name, value);
    }

    builder
        .body(Vec::new())
        .map_err(|e| TransportError::InvalidRequest(e.to_string()).into())
}

/// Turn a raw HTTP response into a classified [`Response`].
///
/// Exposed to make things more easily pluggable
#[inline]
pub fn process_response(http_response: http::Response<Vec<u8>>) -> Result<Response> {
    let status = http_response.status();
    let buffer = Bytes::from(http_response.into_body());
    Response::new(buffer, status).into_result()
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: GraphApiError,
}

// Subcodes meaning the token cannot be refreshed by simply fetching again.
const DEAD_TOKEN_SUBCODES: [i64; 5] = [458, 459, 460, 464, 467];

/// Graph response wrapper that owns the response buffer
#[derive(Debug, Clone)]
pub struct Response {
    buffer: Bytes,
    status: StatusCode,
}

impl Response {
    /// Wrap a response body and status
    pub fn new(buffer: Bytes, status: StatusCode) -> Self {
        Self { buffer, status }
    }

    /// HTTP status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Raw body
    pub fn buffer(&self) -> &Bytes {
        &self.buffer
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> core::result::Result<T, DecodeError> {
        Ok(serde_json::from_slice(&self.buffer)?)
    }

    /// Deserialize the body as a top-level JSON object.
    pub fn object(&self) -> core::result::Result<BTreeMap<SmolStr, FieldValue>, DecodeError> {
        match self.json::<FieldValue>()? {
            FieldValue::Object(map) => Ok(map),
            other => Err(DecodeError::NotAnObject(other.kind().as_str())),
        }
    }

    /// The Graph error envelope carried by the body, if any.
    pub fn api_error(&self) -> Option<GraphApiError> {
        let envelope: ErrorEnvelope = serde_json::from_slice(&self.buffer).ok()?;
        Some(GraphApiError {
            status: self.status.as_u16(),
            ..envelope.error
        })
    }

    /// Keep successful responses, classify everything else.
    pub fn into_result(self) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        let Some(api) = self.api_error() else {
            return Err(match self.status {
                StatusCode::UNAUTHORIZED => AuthError::TokenExpired.into(),
                StatusCode::FORBIDDEN => AuthError::InsufficientPermissions {
                    message: String::from_utf8_lossy(&self.buffer).into_owned(),
                }
                .into(),
                status => HttpError {
                    status,
                    body: Some(self.buffer),
                }
                .into(),
            });
        };

        if api.is_token_error() || self.status == StatusCode::UNAUTHORIZED {
            return Err(match api.error_subcode {
                Some(sub) if DEAD_TOKEN_SUBCODES.contains(&sub) => AuthError::InvalidToken,
                _ => AuthError::TokenExpired,
            }
            .into());
        }
        if self.status == StatusCode::FORBIDDEN || api.is_permission_error() {
            return Err(AuthError::InsufficientPermissions {
                message: api.message,
            }
            .into());
        }
        if self.status == StatusCode::BAD_REQUEST && api.is_oauth() && !api.is_missing_object() {
            return Err(AuthError::Rejected {
                message: api.message,
            }
            .into());
        }
        Err(ClientError::Api(api))
    }
}
