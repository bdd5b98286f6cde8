//! Schema-driven entity records for the Facebook Graph API.
//!
//! Every Graph node type is described by a static [`EntitySchema`]: its fields,
//! their value types, the credential needed to read them, and its connections.
//! An [`EntityRecord`] binds to one schema and refuses anything the schema does
//! not declare, coercing assigned values to the declared type and remembering
//! what each overwritten field held before.
//!
//! ```
//! use fbgraph_object::{Application, EntityFactory, EntityType};
//!
//! let factory = EntityFactory::default();
//! let mut record = factory.create("application").unwrap();
//! record.set_field_value("daily_active_users", 1200).unwrap();
//! assert!(record.set_field_value("colour", "red").is_err());
//!
//! let app = Application::try_from(record).unwrap();
//! assert_eq!(app.daily_active_users(), Some("1200"));
//! # let _ = EntityType::ALL;
//! ```
//!
//! This crate does no I/O; fetching records lives in `fbgraph`.

#![warn(missing_docs)]

pub mod accessor;
pub mod coerce;
pub mod entities;
pub mod error;
pub mod factory;
pub mod realtime;
pub mod record;
pub mod schema;
pub mod subscription;

pub use entities::{Application, Entity, Payment, User};
pub use error::{ErrorKind, ObjectError};
pub use factory::{EntityFactory, EntityType};
pub use realtime::{RealtimeUpdate, UpdateEntry};
pub use record::{EntityRecord, FieldChange, FieldDetails};
pub use schema::{ConnectionDefinition, EntitySchema, FieldDefinition, FieldType, Permission};
pub use subscription::{Subscription, SubscriptionList};
