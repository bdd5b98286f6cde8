//! Static field tables describing each entity type.

use std::fmt;
use std::str::FromStr;

use fbgraph_common::value::FieldValue;
use serde::{Serialize, Serializer};
use smol_str::SmolStr;

use crate::error::ObjectError;

/// The type contract of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// text
    String,
    /// whole number
    Integer,
    /// floating point number
    Float,
    /// `true`/`false`
    Boolean,
    /// list (or keyed collection)
    Array,
    /// keyed structure
    Object,
}

impl FieldType {
    /// Lower-case name, as used on the wire
    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type name that is not one of the known [`FieldType`]s
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("unknown field type `{0}`")]
#[diagnostic(
    code(fbgraph_object::unknown_field_type),
    help("expected one of: string, integer, float, boolean, array, object")
)]
pub struct ParseFieldTypeError(pub SmolStr);

impl FromStr for FieldType {
    type Err = ParseFieldTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(FieldType::String),
            "integer" | "int" => Ok(FieldType::Integer),
            "float" | "double" => Ok(FieldType::Float),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "array" => Ok(FieldType::Array),
            "object" => Ok(FieldType::Object),
            _ => Err(ParseFieldTypeError(s.into())),
        }
    }
}

/// Credential scope needed to read or write a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Always readable
    None,
    /// Needs an application access token
    App,
    /// Needs a user access token
    User,
    /// Needs one of the named permissions (comma separated), e.g. `user_likes,friends_likes`
    Named(&'static str),
}

impl Permission {
    /// Whether any credential is needed at all
    pub const fn is_required(&self) -> bool {
        !matches!(self, Permission::None)
    }

    /// Named scopes, empty unless this is [`Permission::Named`]
    pub fn scopes(&self) -> impl Iterator<Item = &'static str> {
        let named = match self {
            Permission::Named(list) => *list,
            _ => "",
        };
        named.split(',').map(str::trim).filter(|s| !s.is_empty())
    }

    /// Ordering used to pick the strongest of several requirements
    pub const fn rank(&self) -> u8 {
        match self {
            Permission::None => 0,
            Permission::Named(_) => 1,
            Permission::User => 2,
            Permission::App => 3,
        }
    }

    /// Value form, as reported by field details
    pub fn to_value(&self) -> FieldValue {
        match self {
            Permission::None => FieldValue::Boolean(false),
            Permission::App => FieldValue::from("app"),
            Permission::User => FieldValue::from("user"),
            Permission::Named(list) => FieldValue::from(*list),
        }
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Permission::None => serializer.serialize_bool(false),
            Permission::App => serializer.serialize_str("app"),
            Permission::User => serializer.serialize_str("user"),
            Permission::Named(list) => serializer.serialize_str(list),
        }
    }
}

/// Static description of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    #[serde(skip)]
    name: &'static str,
    description: &'static str,
    #[serde(rename = "permissions")]
    permission: Permission,
    #[serde(rename = "returns")]
    field_type: FieldType,
    editable: bool,
    must_ask: bool,
}

impl FieldDefinition {
    /// A readable, non-editable field needing no permission.
    pub const fn new(name: &'static str, field_type: FieldType, description: &'static str) -> Self {
        Self {
            name,
            description,
            permission: Permission::None,
            field_type,
            editable: false,
            must_ask: false,
        }
    }

    /// Require a credential scope.
    pub const fn permission(self, permission: Permission) -> Self {
        Self { permission, ..self }
    }

    /// Mark as writable back to the remote system.
    pub const fn editable(self) -> Self {
        Self {
            editable: true,
            ..self
        }
    }

    /// Mark as omitted from default fetches.
    pub const fn must_ask(self) -> Self {
        Self {
            must_ask: true,
            ..self
        }
    }

    /// Field name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Human readable description
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Required credential scope
    pub const fn required_permission(&self) -> Permission {
        self.permission
    }

    /// Declared type
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Whether the remote system accepts writes to it
    pub const fn is_editable(&self) -> bool {
        self.editable
    }

    /// Whether the field has to be asked for by name
    pub const fn must_ask_explicitly(&self) -> bool {
        self.must_ask
    }
}

/// Static description of an edge hanging off a node, e.g. `/{app-id}/subscriptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionDefinition {
    name: &'static str,
    description: &'static str,
    #[serde(rename = "permissions")]
    permission: Permission,
}

impl ConnectionDefinition {
    /// Describe an edge.
    pub const fn new(name: &'static str, description: &'static str, permission: Permission) -> Self {
        Self {
            name,
            description,
            permission,
        }
    }

    /// Edge name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Human readable description
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Required credential scope
    pub const fn required_permission(&self) -> Permission {
        self.permission
    }
}

/// The complete, immutable field table for one entity type.
///
/// Every schema starts with the universal `id` field (string, not editable, no
/// permission); the entity's own fields follow in declaration order.
#[derive(Debug)]
pub struct EntitySchema {
    name: &'static str,
    id: FieldDefinition,
    fields: &'static [FieldDefinition],
    connections: &'static [ConnectionDefinition],
}

impl EntitySchema {
    /// Declare a schema. `id_description` documents the entity's `id` field.
    pub const fn new(
        name: &'static str,
        id_description: &'static str,
        fields: &'static [FieldDefinition],
        connections: &'static [ConnectionDefinition],
    ) -> Self {
        Self {
            name,
            id: FieldDefinition::new("id", FieldType::String, id_description),
            fields,
            connections,
        }
    }

    /// Simple entity name, e.g. `Application`
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The universal `id` field
    pub const fn id(&self) -> &FieldDefinition {
        &self.id
    }

    /// All fields, `id` first
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        std::iter::once(&self.id).chain(self.fields.iter())
    }

    /// Number of fields including `id`
    pub fn len(&self) -> usize {
        self.fields.len() + 1
    }

    /// Always false; every schema has `id`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `name` is a field of this schema
    pub fn contains(&self, name: &str) -> bool {
        self.fields().any(|f| f.name == name)
    }

    /// Look up a field definition.
    pub fn field(&self, name: &str) -> Result<&FieldDefinition, ObjectError> {
        self.fields()
            .find(|f| f.name == name)
            .ok_or_else(|| ObjectError::UnknownField {
                entity: self.name,
                field: name.into(),
            })
    }

    /// Names of the fields returned when none are requested explicitly
    pub fn default_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields().filter(|f| !f.must_ask).map(|f| f.name)
    }

    /// Strongest credential requirement among the named fields.
    pub fn required_permission<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Result<Permission, ObjectError> {
        let mut strongest = Permission::None;
        for name in names {
            let permission = self.field(name)?.permission;
            if permission.rank() > strongest.rank() {
                strongest = permission;
            }
        }
        Ok(strongest)
    }

    /// Edges hanging off this entity
    pub fn connections(&self) -> &[ConnectionDefinition] {
        self.connections
    }

    /// Look up an edge definition.
    pub fn connection(&self, name: &str) -> Result<&ConnectionDefinition, ObjectError> {
        self.connections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ObjectError::UnknownField {
                entity: self.name,
                field: name.into(),
            })
    }
}

impl fmt::Display for EntitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
