//! Change notifications pushed to a subscription's callback URL.

use chrono::{DateTime, Utc};
use fbgraph_common::value::FieldValue;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, ToSmolStr};

use crate::error::ObjectError;

/// One changed object from a realtime update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateEntry {
    /// Object type the subscription watches, e.g. `user`
    pub object: SmolStr,
    /// ID of the object that changed
    pub uid: SmolStr,
    /// Names of the fields that changed
    pub changed_fields: Vec<SmolStr>,
    /// When the change happened
    pub time: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawUpdate {
    object: Option<SmolStr>,
    #[serde(default)]
    entry: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    uid: Option<FieldValue>,
    id: Option<FieldValue>,
    time: Option<i64>,
    #[serde(default)]
    changed_fields: Vec<SmolStr>,
}

/// Parser for realtime update payloads.
pub struct RealtimeUpdate;

impl RealtimeUpdate {
    /// Flatten a `{"object", "entry": [...]}` payload into its entries.
    ///
    /// ```
    /// use fbgraph_object::realtime::RealtimeUpdate;
    ///
    /// let entries = RealtimeUpdate::from_json(
    ///     r#"{"object":"user","entry":[{"uid":1335845740,"time":232323,"changed_fields":["friends"]}]}"#,
    /// ).unwrap();
    /// assert_eq!(entries[0].uid, "1335845740");
    /// ```
    pub fn from_json(payload: &str) -> Result<Vec<UpdateEntry>, ObjectError> {
        let raw: RawUpdate = serde_json::from_str(payload)?;
        let object = raw
            .object
            .filter(|o| !o.is_empty())
            .ok_or_else(|| ObjectError::update("missing `object`"))?;

        raw.entry
            .into_iter()
            .map(|entry| {
                let uid = match entry.uid.or(entry.id) {
                    Some(FieldValue::String(s)) if !s.is_empty() => s,
                    Some(FieldValue::Integer(i)) => i.to_smolstr(),
                    _ => return Err(ObjectError::update("entry without a `uid`")),
                };
                let time = entry
                    .time
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .ok_or_else(|| ObjectError::update(format!("entry `{uid}` has no valid `time`")))?;
                Ok(UpdateEntry {
                    object: object.clone(),
                    uid,
                    changed_fields: entry.changed_fields,
                    time,
                })
            })
            .collect()
    }
}
