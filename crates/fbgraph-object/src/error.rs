//! Errors raised by the schema and record engine.

use fbgraph_common::value::ValueKind;
use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::schema::FieldType;

/// Everything that can go wrong while describing, building or validating entities.
///
/// None of these are worth retrying: they all point at a caller bug or at input
/// that will never become valid. Use [`ObjectError::kind`] for the coarse category.
#[derive(Debug, Error, Diagnostic)]
pub enum ObjectError {
    /// The field name is not part of the entity's schema
    #[error("invalid field `{field}` for {entity}")]
    #[diagnostic(
        code(fbgraph_object::unknown_field),
        help("see `EntitySchema::fields` for the fields this entity declares")
    )]
    UnknownField {
        /// Entity the lookup ran against
        entity: &'static str,
        /// Offending name
        field: SmolStr,
    },

    /// A dynamic accessor name could not be resolved
    #[error("invalid accessor `{method}`: {reason}")]
    #[diagnostic(
        code(fbgraph_object::invalid_accessor),
        help("accessors look like `getIconUrl` or `setName`")
    )]
    InvalidAccessor {
        /// Method name as given
        method: SmolStr,
        /// What was wrong with it
        reason: &'static str,
    },

    /// The value cannot be coerced to the field's declared type
    #[error("{entity}.{field} expects {expected}, got {found}")]
    #[diagnostic(code(fbgraph_object::invalid_type))]
    InvalidType {
        /// Entity name
        entity: &'static str,
        /// Field name
        field: &'static str,
        /// Declared type
        expected: FieldType,
        /// Shape of the rejected value
        found: ValueKind,
    },

    /// No schema is registered for the type tag
    #[error("unsupported object `{tag}`, no entity type registered under that name")]
    #[diagnostic(
        code(fbgraph_object::unsupported_object),
        help("register the schema with `EntityFactory::register` first")
    )]
    UnsupportedObject {
        /// Normalized tag
        tag: SmolStr,
    },

    /// Subscription data is incomplete or malformed
    #[error("invalid subscription: {reason}")]
    #[diagnostic(
        code(fbgraph_object::invalid_subscription),
        help("a subscription needs `object`, `callback_url`, `fields` and `active`")
    )]
    InvalidSubscription {
        /// What was wrong with it
        reason: String,
    },

    /// A record of one entity type was used where another was expected
    #[error("expected a {expected} record, got {found}")]
    #[diagnostic(code(fbgraph_object::wrong_entity))]
    WrongEntity {
        /// Entity type wanted
        expected: &'static str,
        /// Entity type given
        found: &'static str,
    },

    /// A subscription for the same object already exists
    #[error("duplicate subscription for `{object}`")]
    #[diagnostic(code(fbgraph_object::duplicate_subscription))]
    DuplicateSubscription {
        /// Subscribed object type
        object: SmolStr,
    },

    /// A realtime update payload is malformed
    #[error("invalid realtime update: {reason}")]
    #[diagnostic(code(fbgraph_object::invalid_update))]
    InvalidUpdate {
        /// What was wrong with it
        reason: String,
    },

    /// Credentials needed for the operation are not set
    #[error("missing {what}")]
    #[diagnostic(
        code(fbgraph_object::missing_credentials),
        help("set both the application id and its secret")
    )]
    MissingCredentials {
        /// The missing piece
        what: &'static str,
    },

    /// Input text was not valid JSON
    #[error("invalid JSON: {0}")]
    #[diagnostic(code(fbgraph_object::json))]
    Json(#[from] serde_json::Error),
}

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller passed a name or structure that does not exist or is malformed
    InvalidArgument,
    /// A value does not fit the declared field type
    InvalidType,
    /// The type tag has no registered schema
    UnsupportedObject,
    /// The item already exists
    Duplicate,
}

impl ObjectError {
    /// Coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ObjectError::InvalidType { .. } => ErrorKind::InvalidType,
            ObjectError::UnsupportedObject { .. } => ErrorKind::UnsupportedObject,
            ObjectError::DuplicateSubscription { .. } => ErrorKind::Duplicate,
            ObjectError::UnknownField { .. }
            | ObjectError::InvalidAccessor { .. }
            | ObjectError::WrongEntity { .. }
            | ObjectError::InvalidSubscription { .. }
            | ObjectError::InvalidUpdate { .. }
            | ObjectError::MissingCredentials { .. }
            | ObjectError::Json(_) => ErrorKind::InvalidArgument,
        }
    }

    pub(crate) fn subscription(reason: impl Into<String>) -> Self {
        ObjectError::InvalidSubscription {
            reason: reason.into(),
        }
    }

    pub(crate) fn update(reason: impl Into<String>) -> Self {
        ObjectError::InvalidUpdate {
            reason: reason.into(),
        }
    }
}
