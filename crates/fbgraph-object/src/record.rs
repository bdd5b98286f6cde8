//! Schema-bound entity records with validated get/set and change tracking.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use fbgraph_common::value::FieldValue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::accessor::{Accessor, AccessorKind};
use crate::coerce::coerce;
use crate::error::ObjectError;
use crate::schema::{EntitySchema, FieldDefinition};

/// Prior value of a field that has been overwritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    /// Value held before the first overwrite
    pub previous: FieldValue,
    /// Time of the latest overwrite
    pub modified_at: DateTime<Utc>,
}

/// A field's static definition together with its current value.
///
/// Serializes as `{"description", "permissions", "returns", "editable", "must_ask", "value"?}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDetails<'a> {
    /// Static definition
    #[serde(flatten)]
    pub definition: &'static FieldDefinition,
    /// Current value, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a FieldValue>,
}

/// The named attributes of a [`FieldDefinition`] that can be read one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldElement {
    /// `description`
    Description,
    /// `permissions`
    Permissions,
    /// `returns`
    Returns,
    /// `editable`
    Editable,
    /// `must_ask`
    MustAsk,
    /// `value`
    Value,
}

impl FromStr for FieldElement {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "description" => FieldElement::Description,
            "permissions" => FieldElement::Permissions,
            "returns" => FieldElement::Returns,
            "editable" => FieldElement::Editable,
            "must_ask" => FieldElement::MustAsk,
            "value" => FieldElement::Value,
            _ => return Err(()),
        })
    }
}

/// A live instance of one entity type.
///
/// Holds only the fields that have been set or loaded. Every access goes through
/// the schema: unknown names are rejected, and values are coerced to the declared
/// type or refused (see [`crate::coerce`]).
///
/// ```
/// use fbgraph_object::{EntityFactory, EntityType};
///
/// let mut app = EntityFactory::default().create_typed(EntityType::Application);
/// app.set_field_value("name", "Graffiti").unwrap();
/// app.set_field_value("name", "Graffiti Wall").unwrap();
///
/// assert_eq!(app.get_field_value("name").unwrap().unwrap().as_str(), Some("Graffiti Wall"));
/// assert_eq!(app.modified_fields()["name"].previous.as_str(), Some("Graffiti"));
///
/// app.reset_values();
/// assert_eq!(app.get_field_value("name").unwrap().unwrap().as_str(), Some("Graffiti"));
/// ```
#[derive(Debug, Clone)]
pub struct EntityRecord {
    schema: &'static EntitySchema,
    values: BTreeMap<&'static str, FieldValue>,
    changes: BTreeMap<&'static str, FieldChange>,
    modified: bool,
    new: bool,
}

impl EntityRecord {
    /// An empty record bound to `schema`.
    pub fn new(schema: &'static EntitySchema) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
            changes: BTreeMap::new(),
            modified: false,
            new: true,
        }
    }

    /// Schema this record is bound to
    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    /// Simple entity name
    pub fn name(&self) -> &'static str {
        self.schema.name()
    }

    /// True until a remote load has populated the record
    pub fn is_new(&self) -> bool {
        self.new
    }

    /// True once any field has been set since construction, load or reset
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Definition of `name` merged with its current value.
    pub fn get_field_details(&self, name: &str) -> Result<FieldDetails<'_>, ObjectError> {
        let definition = self.schema.field(name)?;
        Ok(FieldDetails {
            definition,
            value: self.values.get(definition.name()),
        })
    }

    /// Details for every field, `id` first.
    pub fn field_list(&self) -> impl Iterator<Item = FieldDetails<'_>> {
        self.schema.fields().map(|definition| FieldDetails {
            definition,
            value: self.values.get(definition.name()),
        })
    }

    /// One attribute of a field's definition, e.g. just its `description`.
    ///
    /// An unknown `element` yields `None`; an unknown field is an error.
    pub fn get_field_element_value(
        &self,
        name: &str,
        element: &str,
    ) -> Result<Option<FieldValue>, ObjectError> {
        let details = self.get_field_details(name)?;
        let def = details.definition;
        let Ok(element) = element.parse::<FieldElement>() else {
            return Ok(None);
        };
        Ok(match element {
            FieldElement::Description => Some(def.description().into()),
            FieldElement::Permissions => Some(def.required_permission().to_value()),
            FieldElement::Returns => Some(def.field_type().as_str().into()),
            FieldElement::Editable => Some(def.is_editable().into()),
            FieldElement::MustAsk => Some(def.must_ask_explicitly().into()),
            FieldElement::Value => details.value.cloned(),
        })
    }

    /// Current value of `name`, `None` if never set.
    pub fn get_field_value(&self, name: &str) -> Result<Option<&FieldValue>, ObjectError> {
        let definition = self.schema.field(name)?;
        Ok(self.values.get(definition.name()))
    }

    /// Validate, coerce and store a value.
    ///
    /// The first overwrite of an existing value logs it in [`Self::modified_fields`];
    /// later overwrites only refresh the timestamp. A `Null` value clears the field.
    /// On error the stored value is left untouched.
    pub fn set_field_value(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), ObjectError> {
        let entity = self.schema.name();
        let definition = self.schema.field(name)?;
        let key = definition.name();
        let value = value.into();

        if value.is_null() {
            self.log_change(key);
            self.values.remove(key);
            self.modified = true;
            return Ok(());
        }

        let value = coerce(value, definition.field_type()).map_err(|rejected| {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                entity,
                field = key,
                found = %rejected.kind(),
                "rejected field value"
            );
            ObjectError::InvalidType {
                entity,
                field: key,
                expected: definition.field_type(),
                found: rejected.kind(),
            }
        })?;

        self.log_change(key);
        self.values.insert(key, value);
        self.modified = true;
        Ok(())
    }

    fn log_change(&mut self, key: &'static str) {
        let Some(current) = self.values.get(key) else {
            return;
        };
        let now = Utc::now();
        self.changes
            .entry(key)
            .and_modify(|change| change.modified_at = now)
            .or_insert_with(|| FieldChange {
                previous: current.clone(),
                modified_at: now,
            });
    }

    /// Fields overwritten since construction, load or reset.
    pub fn modified_fields(&self) -> &BTreeMap<&'static str, FieldChange> {
        &self.changes
    }

    /// Restore every overwritten field to its logged value.
    pub fn reset_values(&mut self) {
        for (key, change) in std::mem::take(&mut self.changes) {
            self.values.insert(key, change.previous);
        }
        self.modified = false;
    }

    /// Set values in schema order.
    pub fn values(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.schema
            .fields()
            .filter_map(|def| self.values.get(def.name()).map(|v| (def.name(), v)))
    }

    /// Set values as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values()
                .map(|(k, v)| (k.to_owned(), v.to_json()))
                .collect(),
        )
    }

    /// Resolve a `get<Field>`/`set<Field>` method name and run it.
    ///
    /// Getters return the current value; setters need `arg` and return `None`.
    pub fn invoke(
        &mut self,
        method: &str,
        arg: Option<FieldValue>,
    ) -> Result<Option<FieldValue>, ObjectError> {
        let accessor = Accessor::parse(method)?;
        match (accessor.kind, arg) {
            (AccessorKind::Get, _) => Ok(self.get_field_value(&accessor.field)?.cloned()),
            (AccessorKind::Set, Some(value)) => {
                self.set_field_value(&accessor.field, value)?;
                Ok(None)
            }
            (AccessorKind::Set, None) => Err(ObjectError::InvalidAccessor {
                method: method.into(),
                reason: "setter called without a value",
            }),
        }
    }

    /// Record that the remote state has been ingested.
    pub fn mark_loaded(&mut self) {
        self.new = false;
        self.modified = false;
        self.changes.clear();
    }

    /// Drop every value, keeping the record bound and new.
    pub fn clear(&mut self) {
        self.values.clear();
        self.changes.clear();
        self.modified = false;
    }

    /// Set `id` without counting it as a modification.
    pub(crate) fn seed_id(&mut self, id: &str) {
        self.values.insert("id", FieldValue::from(id));
    }

    /// Infallible lookup for names known to be in the schema.
    pub(crate) fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }
}

impl Serialize for EntityRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in self.values() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl fmt::Display for EntityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema.name())
    }
}
