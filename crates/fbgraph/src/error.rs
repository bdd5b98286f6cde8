//! Top-level error type.

use fbgraph_common::error::{AuthError, ClientError, ConfigError};
use fbgraph_object::ObjectError;
use http::StatusCode;
use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

/// Everything a Graph client operation can fail with.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// Transport, encoding or authentication failure
    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] ClientError),

    /// Schema or record validation failure
    #[error(transparent)]
    #[diagnostic(transparent)]
    Object(#[from] ObjectError),

    /// The Graph API did not return a usable object for the node
    #[error("invalid node `{id}` (HTTP {status}): {message}")]
    #[diagnostic(
        code(fbgraph::invalid_node),
        help("check that the id exists and is of the requested type")
    )]
    InvalidNode {
        /// Requested node id
        id: SmolStr,
        /// HTTP status of the response
        status: StatusCode,
        /// What came back instead of an object
        message: String,
    },

    /// The record has no `id` to address it by
    #[error("{entity} record has no id")]
    #[diagnostic(code(fbgraph::missing_id), help("set `id` or obtain the record through a load"))]
    MissingId {
        /// Entity type of the record
        entity: &'static str,
    },

    /// A notification is incomplete or too long
    #[error("invalid notification: {reason}")]
    #[diagnostic(code(fbgraph::invalid_notification))]
    InvalidNotification {
        /// What is wrong with it
        reason: String,
    },

    /// Configuration was rejected
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the same call might succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Client(e) if e.is_transient())
    }

    /// Whether the failure is about credentials or permissions.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Client(ClientError::Auth(_)))
    }

    /// The authentication failure, if that is what this is
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Error::Client(ClientError::Auth(e)) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn invalid_node(id: &str, status: StatusCode, message: impl Into<String>) -> Self {
        Error::InvalidNode {
            id: id.into(),
            status,
            message: message.into(),
        }
    }
}

/// Result alias for client operations
pub type Result<T> = std::result::Result<T, Error>;
