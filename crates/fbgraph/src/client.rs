//! Talking to the Graph API: credentials and the record loader.

mod loader;
mod token;

pub use loader::RemoteLoader;
pub(crate) use loader::node_error;
pub use token::{AccessToken, AppAccessToken, NoToken, TokenInfo, UserAccessToken};
