//! Realtime update subscriptions: a fixed-shape record with its own validation.

use std::collections::{BTreeMap, BTreeSet};

use fbgraph_common::value::FieldValue;
use serde::Serialize;
use smol_str::SmolStr;

use crate::coerce::coerce;
use crate::error::ObjectError;
use crate::schema::FieldType;

type Map = BTreeMap<SmolStr, FieldValue>;

/// One realtime update subscription of an application.
///
/// Built from a map or from its JSON text; both paths run the same checks, so
/// `Subscription::from_json(&json)` and `Subscription::from_map(&map)` agree
/// whenever `json` encodes `map`.
///
/// ```
/// use fbgraph_object::Subscription;
///
/// let sub = Subscription::from_json(
///     r#"{"object":"user","callback_url":"https://example.com/cb","fields":"name,email","active":true}"#,
/// ).unwrap();
/// assert!(sub.valid());
/// assert!(sub.fields().contains("email"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    object: SmolStr,
    callback_url: SmolStr,
    fields: BTreeSet<SmolStr>,
    active: bool,
}

impl Subscription {
    /// Assemble a subscription from its parts.
    pub fn new(
        object: impl Into<SmolStr>,
        callback_url: impl Into<SmolStr>,
        fields: impl IntoIterator<Item = impl Into<SmolStr>>,
        active: bool,
    ) -> Self {
        Self {
            object: object.into(),
            callback_url: callback_url.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            active,
        }
    }

    /// Populate from a map holding `object`, `callback_url`, `fields` and `active`.
    pub fn from_map(map: &Map) -> Result<Self, ObjectError> {
        let text = |key: &str| -> Result<SmolStr, ObjectError> {
            match map.get(key) {
                Some(FieldValue::String(s)) if !s.is_empty() => Ok(s.clone()),
                Some(FieldValue::String(_)) => {
                    Err(ObjectError::subscription(format!("`{key}` is empty")))
                }
                Some(other) => Err(ObjectError::subscription(format!(
                    "`{key}` must be a string, got {}",
                    other.kind()
                ))),
                None => Err(ObjectError::subscription(format!("missing `{key}`"))),
            }
        };
        let object = text("object")?;
        let callback_url = text("callback_url")?;
        let fields = parse_fields(
            map.get("fields")
                .ok_or_else(|| ObjectError::subscription("missing `fields`"))?,
        )?;
        let active = match map.get("active").cloned() {
            None => return Err(ObjectError::subscription("missing `active`")),
            Some(value) => match coerce(value, FieldType::Boolean) {
                Ok(FieldValue::Boolean(b)) => b,
                Ok(_) | Err(_) => {
                    return Err(ObjectError::subscription("`active` must be a boolean"));
                }
            },
        };

        let sub = Self {
            object,
            callback_url,
            fields,
            active,
        };
        if !sub.valid() {
            return Err(ObjectError::subscription("incomplete subscription"));
        }
        Ok(sub)
    }

    /// Populate from the JSON encoding of the map accepted by [`Self::from_map`].
    pub fn from_json(json: &str) -> Result<Self, ObjectError> {
        let value: FieldValue = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Whether every member is present.
    pub fn valid(&self) -> bool {
        !self.object.is_empty() && !self.callback_url.is_empty()
    }

    /// Subscribed object type, e.g. `user`
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Endpoint receiving the updates
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Watched fields
    pub fn fields(&self) -> &BTreeSet<SmolStr> {
        &self.fields
    }

    /// Whether updates are currently delivered
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Same shape as the input accepted by [`Self::from_map`].
    pub fn to_map(&self) -> Map {
        Map::from([
            ("object".into(), self.object.clone().into()),
            ("callback_url".into(), self.callback_url.clone().into()),
            (
                "fields".into(),
                FieldValue::Array(self.fields.iter().cloned().map(FieldValue::String).collect()),
            ),
            ("active".into(), self.active.into()),
        ])
    }
}

impl TryFrom<FieldValue> for Subscription {
    type Error = ObjectError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Object(map) => Self::from_map(&map),
            other => Err(ObjectError::subscription(format!(
                "expected an object, got {}",
                other.kind()
            ))),
        }
    }
}

/// `["a", "b"]`, `[{"name": "a"}, ...]` or `"a,b"`.
fn parse_fields(value: &FieldValue) -> Result<BTreeSet<SmolStr>, ObjectError> {
    match value {
        FieldValue::String(list) => Ok(list
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(SmolStr::from)
            .collect()),
        FieldValue::Array(items) => items
            .iter()
            .map(|item| match item {
                FieldValue::String(name) => Ok(name.clone()),
                FieldValue::Object(entry) => entry
                    .get("name")
                    .and_then(FieldValue::as_str)
                    .map(SmolStr::from)
                    .ok_or_else(|| ObjectError::subscription("field entry without a `name`")),
                other => Err(ObjectError::subscription(format!(
                    "field names must be strings, got {}",
                    other.kind()
                ))),
            })
            .collect(),
        other => Err(ObjectError::subscription(format!(
            "`fields` must be a list, got {}",
            other.kind()
        ))),
    }
}

/// The subscriptions of one application, at most one per object type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionList {
    by_object: BTreeMap<SmolStr, Subscription>,
}

impl SubscriptionList {
    /// An empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription, refusing a second one for the same object.
    pub fn insert(&mut self, sub: Subscription) -> Result<(), ObjectError> {
        if self.by_object.contains_key(&sub.object) {
            return Err(ObjectError::DuplicateSubscription { object: sub.object });
        }
        self.by_object.insert(sub.object.clone(), sub);
        Ok(())
    }

    /// Build a list from maps; stops at the first invalid or duplicate entry.
    pub fn from_maps<'a>(maps: impl IntoIterator<Item = &'a Map>) -> Result<Self, ObjectError> {
        let mut list = Self::new();
        for map in maps {
            list.insert(Subscription::from_map(map)?)?;
        }
        Ok(list)
    }

    /// Build a list from a JSON array, or from a `{"data": [...]}` page.
    pub fn from_json(json: &str) -> Result<Self, ObjectError> {
        let value: FieldValue = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Subscription for `object`, if any
    pub fn get(&self, object: &str) -> Option<&Subscription> {
        self.by_object.get(object)
    }

    /// Drop the subscription for `object`
    pub fn remove(&mut self, object: &str) -> Option<Subscription> {
        self.by_object.remove(object)
    }

    /// Number of subscriptions
    pub fn len(&self) -> usize {
        self.by_object.len()
    }

    /// No subscriptions at all
    pub fn is_empty(&self) -> bool {
        self.by_object.is_empty()
    }

    /// Subscriptions ordered by object type
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.by_object.values()
    }
}

impl TryFrom<FieldValue> for SubscriptionList {
    type Error = ObjectError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        let items = match value {
            FieldValue::Array(items) => items,
            FieldValue::Object(mut page) => match page.remove("data") {
                Some(FieldValue::Array(items)) => items,
                _ => return Err(ObjectError::subscription("expected a `data` list")),
            },
            other => {
                return Err(ObjectError::subscription(format!(
                    "expected a list of subscriptions, got {}",
                    other.kind()
                )));
            }
        };
        let mut list = Self::new();
        for item in items {
            list.insert(Subscription::try_from(item)?)?;
        }
        Ok(list)
    }
}

impl Serialize for SubscriptionList {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.by_object.values())
    }
}

impl<'a> IntoIterator for &'a SubscriptionList {
    type Item = &'a Subscription;
    type IntoIter = std::collections::btree_map::Values<'a, SmolStr, Subscription>;

    fn into_iter(self) -> Self::IntoIter {
        self.by_object.values()
    }
}
