//! A schema-driven client for the Facebook Graph API.
//!
//! Graph nodes come back as [`EntityRecord`]s bound to a static schema, so every
//! field is checked by name and type before it is stored. Typed wrappers such as
//! [`Application`] give compile-checked accessors over the same records.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> miette::Result<()> {
//! use fbgraph::{AppAccessToken, Application, RemoteLoader};
//!
//! let http = reqwest::Client::new();
//! let token = AppAccessToken::new(http.clone(), "2439131959", "s3cr3t");
//! let loader = RemoteLoader::new(http).with_token(token);
//!
//! let mut app: Application = loader.load_typed("2439131959", &["name", "namespace"]).await?;
//! loader.fetch_subscriptions(&mut app).await?;
//! println!("{} has {} subscriptions", app.name().unwrap_or("?"), app.subscriptions().len());
//! # Ok(())
//! # }
//! ```
//!
//! - [`fbgraph_common`] holds the transport and request plumbing.
//! - [`fbgraph_object`] holds schemas, records and the built-in entity types.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod notification;

pub use fbgraph_common;
pub use fbgraph_object;

pub use client::{AccessToken, AppAccessToken, NoToken, RemoteLoader, TokenInfo, UserAccessToken};
pub use config::{GraphConfig, IngestPolicy};
pub use error::{Error, Result};
pub use fbgraph_common::FieldValue;
pub use fbgraph_object::{
    Application, Entity, EntityFactory, EntityRecord, EntityType, Payment, Subscription,
    SubscriptionList, User,
};
pub use notification::AppNotification;
