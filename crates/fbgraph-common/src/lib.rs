//! Common types for the fbgraph Graph API client
//!
//! - [`value::FieldValue`]: the JSON-shaped value every entity field holds.
//! - [`http_client::HttpClient`]: the pluggable transport.
//! - [`request`]: building Graph calls, retrying transport failures, and
//!   classifying responses into [`error::ClientError`]s.

#![warn(missing_docs)]
pub use smol_str;
pub use url;

pub mod error;
/// HTTP client abstraction used by fbgraph crates.
pub mod http_client;
pub mod request;
pub mod retry;
pub mod value;

pub use error::{AuthError, ClientError, ConfigError, TransportError};
pub use value::FieldValue;
