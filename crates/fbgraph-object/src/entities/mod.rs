//! Built-in entity types: their schemas and strongly typed wrappers.

use crate::error::ObjectError;
use crate::factory::EntityType;
use crate::record::EntityRecord;

/// Typed getters/setters over an `EntityRecord` field.
///
/// `"field" => getter, setter: kind;` where kind is one of
/// `str`, `int`, `float`, `bool`, `array`, `object`.
macro_rules! typed_accessors {
    ($($field:literal => $getter:ident, $setter:ident: $kind:tt;)*) => {
        #[cfg(test)]
        pub(crate) const TYPED_FIELDS: &'static [(&'static str, $crate::schema::FieldType)] = &[
            $(($field, typed_accessors!(@type $kind)),)*
        ];

        $(
            #[doc = concat!("`", $field, "`, if set")]
            pub fn $getter(&self) -> typed_accessors!(@ret $kind) {
                self.record.value($field).and_then(typed_accessors!(@conv $kind))
            }

            #[doc = concat!("Validate and set `", $field, "`")]
            pub fn $setter(
                &mut self,
                value: impl Into<fbgraph_common::value::FieldValue>,
            ) -> Result<(), $crate::error::ObjectError> {
                self.record.set_field_value($field, value)
            }
        )*
    };
    (@ret str) => { Option<&str> };
    (@ret int) => { Option<i64> };
    (@ret float) => { Option<f64> };
    (@ret bool) => { Option<bool> };
    (@ret array) => { Option<&[fbgraph_common::value::FieldValue]> };
    (@ret object) => {
        Option<&std::collections::BTreeMap<smol_str::SmolStr, fbgraph_common::value::FieldValue>>
    };
    (@type str) => { $crate::schema::FieldType::String };
    (@type int) => { $crate::schema::FieldType::Integer };
    (@type float) => { $crate::schema::FieldType::Float };
    (@type bool) => { $crate::schema::FieldType::Boolean };
    (@type array) => { $crate::schema::FieldType::Array };
    (@type object) => { $crate::schema::FieldType::Object };
    (@conv str) => { fbgraph_common::value::FieldValue::as_str };
    (@conv int) => { fbgraph_common::value::FieldValue::as_integer };
    (@conv float) => { fbgraph_common::value::FieldValue::as_float };
    (@conv bool) => { fbgraph_common::value::FieldValue::as_bool };
    (@conv array) => { fbgraph_common::value::FieldValue::as_array };
    (@conv object) => { fbgraph_common::value::FieldValue::as_object };
}

/// Record plumbing shared by every typed entity.
macro_rules! entity_record {
    ($name:ident, $schema:ident, $kind:expr) => {
        impl $crate::entities::Entity for $name {
            const TYPE: $crate::factory::EntityType = $kind;

            fn record(&self) -> &$crate::record::EntityRecord {
                &self.record
            }

            fn record_mut(&mut self) -> &mut $crate::record::EntityRecord {
                &mut self.record
            }

            fn into_record(self) -> $crate::record::EntityRecord {
                self.record
            }
        }

        impl TryFrom<$crate::record::EntityRecord> for $name {
            type Error = $crate::error::ObjectError;

            fn try_from(record: $crate::record::EntityRecord) -> Result<Self, Self::Error> {
                $crate::entities::check_schema(&record, &$schema)?;
                Ok(Self::from_record(record))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.record, f)
            }
        }
    };
}

pub mod application;
pub mod payment;
pub mod user;

pub use application::Application;
pub use payment::Payment;
pub use user::User;

/// A typed view over an [`EntityRecord`] of a known entity type.
pub trait Entity: TryFrom<EntityRecord, Error = ObjectError> {
    /// Which entity type this is
    const TYPE: EntityType;

    /// Underlying record
    fn record(&self) -> &EntityRecord;

    /// Underlying record, mutably
    fn record_mut(&mut self) -> &mut EntityRecord;

    /// Give up the typed view
    fn into_record(self) -> EntityRecord;
}

pub(crate) fn check_schema(
    record: &EntityRecord,
    schema: &'static crate::schema::EntitySchema,
) -> Result<(), ObjectError> {
    if std::ptr::eq(record.schema(), schema) {
        Ok(())
    } else {
        Err(ObjectError::WrongEntity {
            expected: schema.name(),
            found: record.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntitySchema, FieldType};

    fn assert_accessors_match(schema: &EntitySchema, typed: &[(&str, FieldType)]) {
        for (name, kind) in typed {
            let def = schema.field(name).unwrap();
            assert_eq!(def.field_type(), *kind, "{schema}.{name}");
        }
        for def in schema.fields() {
            assert!(
                typed.iter().any(|(name, _)| *name == def.name()),
                "{schema}.{} has no typed accessor",
                def.name()
            );
        }
        assert_eq!(typed.len(), schema.len());
    }

    #[test]
    fn typed_getters_return_the_declared_type() {
        assert_accessors_match(&application::APPLICATION, Application::TYPED_FIELDS);
        assert_accessors_match(&user::USER, User::TYPED_FIELDS);
        assert_accessors_match(&payment::PAYMENT, Payment::TYPED_FIELDS);
    }
}
