//! Error types for Graph API client operations

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Client error type wrapping all possible error conditions
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ClientError {
    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Transport(
        #[from]
        #[diagnostic_source]
        TransportError,
    ),

    /// Request construction failed
    #[error("{0}")]
    Encode(
        #[from]
        #[diagnostic_source]
        EncodeError,
    ),

    /// Response deserialization failed
    #[error("{0}")]
    Decode(
        #[from]
        #[diagnostic_source]
        DecodeError,
    ),

    /// HTTP error response without a Graph error envelope
    #[error("HTTP {0}")]
    Http(
        #[from]
        #[diagnostic_source]
        HttpError,
    ),

    /// Authentication or authorization error
    #[error("Authentication error: {0}")]
    Auth(
        #[from]
        #[diagnostic_source]
        AuthError,
    ),

    /// The Graph API answered with an error envelope that is not an auth problem
    #[error("{0}")]
    Api(
        #[from]
        #[diagnostic_source]
        GraphApiError,
    ),
}

impl ClientError {
    /// Whether a later attempt could succeed without changing the request.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_transient())
    }
}

/// Transport-level errors that occur during HTTP communication
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TransportError {
    /// Failed to establish connection to server
    #[error("Connection error: {0}")]
    Connect(String),

    /// Request timed out
    #[error("Request timeout")]
    Timeout,

    /// Request construction failed (malformed URI, headers, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Every attempt allowed by the retry policy failed
    #[error("Giving up after {attempts} attempt(s): {last}")]
    #[diagnostic(
        code(fbgraph_common::transport::exhausted),
        help("check connectivity, or raise `max_attempts`/`timeout` in the retry policy")
    )]
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// The failure of the final attempt
        #[source]
        last: Box<TransportError>,
    },

    /// Other transport error
    #[error("Transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Request-building failures are deterministic; everything else may go away on retry.
    ///
    /// An exhausted retry budget is as transient as its last failure.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::InvalidRequest(_) => false,
            TransportError::Exhausted { last, .. } => last.is_transient(),
            _ => true,
        }
    }
}

impl From<std::convert::Infallible> for TransportError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Request encoding errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EncodeError {
    /// Failed to serialize query parameters
    #[error("Failed to serialize query: {0}")]
    Query(
        #[from]
        #[source]
        serde_html_form::ser::Error,
    ),
    /// A requested field name contains characters the Graph API does not accept
    #[error("Invalid field name `{0}`")]
    #[diagnostic(
        code(fbgraph_common::encode::field_name),
        help("field names may only contain ASCII letters, digits and `_`")
    )]
    InvalidFieldName(SmolStr),
    /// The request does not name a node
    #[error("Request has no node id")]
    #[diagnostic(code(fbgraph_common::encode::empty_node))]
    EmptyNode,
}

/// Response deserialization errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DecodeError {
    /// JSON deserialization failed
    #[error("Failed to deserialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
    /// Form-encoded body could not be parsed
    #[error("Failed to deserialize form body: {0}")]
    Form(
        #[from]
        #[source]
        serde_html_form::de::Error,
    ),
    /// The body was valid JSON but not a JSON object
    #[error("Expected a JSON object, got {0}")]
    #[diagnostic(code(fbgraph_common::decode::not_an_object))]
    NotAnObject(&'static str),
    /// A required member was missing from the body
    #[error("Response is missing `{0}`")]
    #[diagnostic(code(fbgraph_common::decode::missing_member))]
    Missing(&'static str),
}

/// HTTP error response (non-2xx status codes without a Graph error body)
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub struct HttpError {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response body if available
    pub body: Option<Bytes>,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(body) = &self.body {
            if let Ok(s) = std::str::from_utf8(body) {
                write!(f, ":\n{}", s)?;
            }
        }
        Ok(())
    }
}

/// The `error` object the Graph API returns on failure.
///
/// ```json
/// {"error": {"message": "...", "type": "OAuthException", "code": 190, "error_subcode": 463, "fbtrace_id": "..."}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error, miette::Diagnostic)]
#[error("Graph API error {code} ({kind}): {message}")]
#[diagnostic(code(fbgraph_common::api))]
pub struct GraphApiError {
    /// Human readable message
    #[serde(default)]
    pub message: String,
    /// Error family, e.g. `OAuthException`, `GraphMethodException`
    #[serde(rename = "type", default)]
    pub kind: SmolStr,
    /// Numeric error code
    #[serde(default)]
    pub code: i64,
    /// Finer grained error code, if given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_subcode: Option<i64>,
    /// Trace id for support requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fbtrace_id: Option<SmolStr>,
    /// HTTP status the envelope arrived with
    #[serde(skip, default = "default_status")]
    pub status: u16,
}

fn default_status() -> u16 {
    400
}

impl GraphApiError {
    /// Whether this envelope reports an expired or revoked access token.
    pub fn is_token_error(&self) -> bool {
        self.code == 190 || self.code == 102
    }

    /// Whether this envelope reports a missing permission or scope.
    pub fn is_permission_error(&self) -> bool {
        self.code == 10 || (200..=299).contains(&self.code)
    }

    /// Whether the addressed node or alias does not exist.
    pub fn is_missing_object(&self) -> bool {
        self.code == 100 || self.code == 803
    }

    /// Whether this is an OAuth-family rejection.
    pub fn is_oauth(&self) -> bool {
        self.kind == "OAuthException"
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(feature = "reqwest-client")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Other(Box::new(e))
        }
    }
}

/// Authentication and authorization errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AuthError {
    /// Access token has expired or was revoked
    #[error("Access token expired")]
    #[diagnostic(
        code(fbgraph_common::auth::token_expired),
        help("invalidate the cached token and fetch a new one")
    )]
    TokenExpired,

    /// Access token is invalid or malformed
    #[error("Invalid access token")]
    InvalidToken,

    /// The credential is valid but lacks the scope the request needs
    #[error("Insufficient permissions: {message}")]
    #[diagnostic(
        code(fbgraph_common::auth::insufficient_permissions),
        help("request the missing permission from the user, then retry")
    )]
    InsufficientPermissions {
        /// Message reported by the server
        message: String,
    },

    /// Request requires authentication but none was provided
    #[error("No authentication provided, but endpoint requires auth")]
    NotAuthenticated,

    /// The server rejected the credential or the OAuth request
    #[error("Request rejected: {message}")]
    #[diagnostic(code(fbgraph_common::auth::rejected))]
    Rejected {
        /// Message reported by the server
        message: String,
    },

}

/// Invalid configuration values
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    /// A numeric setting is outside its accepted range
    #[error("`{name}` must be within {min}..={max}, got {value}")]
    #[diagnostic(code(fbgraph_common::config::out_of_range))]
    OutOfRange {
        /// Setting name
        name: &'static str,
        /// Offending value, rendered
        value: String,
        /// Lower bound, rendered
        min: String,
        /// Upper bound, rendered
        max: String,
    },
    /// A setting has the right type but an unusable value
    #[error("`{name}` is invalid: {reason}")]
    #[diagnostic(code(fbgraph_common::config::invalid))]
    Invalid {
        /// Setting name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
    /// The base URL could not be parsed
    #[error("Invalid base URL: {0}")]
    #[diagnostic(code(fbgraph_common::config::url))]
    Url(#[from] url::ParseError),
    /// The configuration document could not be parsed
    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(fbgraph_common::config::parse))]
    Parse(#[from] serde_json::Error),
}
