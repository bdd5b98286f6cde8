//! Creating records from entity type tags.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

use crate::entities::{application::APPLICATION, payment::PAYMENT, user::USER};
use crate::error::ObjectError;
use crate::record::EntityRecord;
use crate::schema::EntitySchema;

/// The built-in entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// `application`
    Application,
    /// `user`
    User,
    /// `payment`
    Payment,
}

impl EntityType {
    /// Every built-in type
    pub const ALL: [EntityType; 3] = [EntityType::Application, EntityType::User, EntityType::Payment];

    /// Normalized type tag
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityType::Application => "application",
            EntityType::User => "user",
            EntityType::Payment => "payment",
        }
    }

    /// Schema records of this type are bound to
    pub fn schema(&self) -> &'static EntitySchema {
        match self {
            EntityType::Application => &APPLICATION,
            EntityType::User => &USER,
            EntityType::Payment => &PAYMENT,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for EntityType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for EntityType {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = normalize_tag(s);
        EntityType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or(ObjectError::UnsupportedObject { tag })
    }
}

/// Canonical form of a type tag: trimmed, lowercase, `payments` folded to `payment`.
pub fn normalize_tag(tag: &str) -> SmolStr {
    let lower = tag.trim().to_lowercase();
    match lower.as_str() {
        "payments" => SmolStr::new_static("payment"),
        _ => lower.into(),
    }
}

/// Registry mapping type tags to schemas.
///
/// ```
/// use fbgraph_object::EntityFactory;
///
/// let factory = EntityFactory::default();
/// let record = factory.create(" Payments ").unwrap();
/// assert_eq!(record.name(), "Payment");
/// assert!(factory.create("Photo").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct EntityFactory {
    schemas: HashMap<SmolStr, &'static EntitySchema>,
}

impl EntityFactory {
    /// A factory with nothing registered.
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Map `tag` (normalized) to `schema`, replacing any earlier registration.
    pub fn register(&mut self, tag: &str, schema: &'static EntitySchema) -> &mut Self {
        self.schemas.insert(normalize_tag(tag), schema);
        self
    }

    /// Schema registered under `tag`.
    pub fn schema(&self, tag: &str) -> Result<&'static EntitySchema, ObjectError> {
        let tag = normalize_tag(tag);
        self.schemas
            .get(&tag)
            .copied()
            .ok_or(ObjectError::UnsupportedObject { tag })
    }

    /// Whether anything is registered under `tag`
    pub fn supports(&self, tag: &str) -> bool {
        self.schemas.contains_key(&normalize_tag(tag))
    }

    /// A blank record for `tag`.
    pub fn create(&self, tag: &str) -> Result<EntityRecord, ObjectError> {
        self.schema(tag).map(EntityRecord::new)
    }

    /// A blank record of a built-in type.
    pub fn create_typed(&self, kind: EntityType) -> EntityRecord {
        EntityRecord::new(kind.schema())
    }

    /// A blank handle to the remote node `id`, not yet fetched.
    ///
    /// The record stays new and unmodified; only `id` is filled in.
    pub fn load(&self, kind: EntityType, id: &str) -> EntityRecord {
        let mut record = self.create_typed(kind);
        record.seed_id(id);
        record
    }
}

impl Default for EntityFactory {
    fn default() -> Self {
        let mut factory = Self::new();
        for kind in EntityType::ALL {
            factory.register(kind.as_str(), kind.schema());
        }
        factory
    }
}
