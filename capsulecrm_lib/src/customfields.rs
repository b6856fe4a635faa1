//! Decoding of the flat, heterogeneous custom-field list.
//!
//! The API returns every custom field of a record as one list. Entries with
//! a `date` key are "date tags"; the rest are plain fields whose value sits
//! under exactly one of `text`, `boolean` or `number`.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::date;
use crate::error::CapsuleError;

/// Typed value of a plain custom field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Boolean(bool),
    Number(Decimal),
    /// The type key is present but holds `null`.
    Null,
}

impl FieldValue {
    /// JSON rendering used by attribute lookups. Numbers stay strings so
    /// no precision is lost.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Number(n) => Value::String(n.to_string()),
            FieldValue::Null => Value::Null,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Null => Ok(()),
        }
    }
}

/// Date tags in ascending date order.
///
/// Keys are unique; iteration follows date order, not the order the API
/// listed the entries in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateTags {
    entries: Vec<(String, NaiveDate)>,
}

impl DateTags {
    pub fn get(&self, tag: &str) -> Option<NaiveDate> {
        self.entries
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, d)| *d)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NaiveDate)> {
        self.entries.iter().map(|(name, d)| (name.as_str(), *d))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object of tag to `YYYY-MM-DD`. Use [`DateTags::iter`] for date order.
    pub fn to_json(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(name, d)| (name.clone(), Value::String(d.to_string())))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }
}

/// Both halves of a decoded custom-field list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomFieldSet {
    pub fields: BTreeMap<String, FieldValue>,
    pub date_tags: DateTags,
}

/// True if the entry is a date tag rather than a plain field.
pub fn is_date_entry(entry: &Value) -> bool {
    entry.get("date").is_some()
}

/// Splits a raw custom-field list into plain fields and date tags.
pub fn from_entries(entries: &[Value]) -> Result<CustomFieldSet, CapsuleError> {
    let (dates, plain): (Vec<Value>, Vec<Value>) =
        entries.iter().cloned().partition(is_date_entry);
    Ok(CustomFieldSet {
        fields: plain_fields(&plain)?,
        date_tags: date_tags(&dates)?,
    })
}

/// Decodes plain entries into label → value.
///
/// `boolean` is true only for the literal string `"true"`. A type key holding
/// `null` decodes to [`FieldValue::Null`]. An entry with none of `text`,
/// `boolean`, `number` is a format error.
pub fn plain_fields(entries: &[Value]) -> Result<BTreeMap<String, FieldValue>, CapsuleError> {
    entries
        .iter()
        .map(|entry| -> Result<(String, FieldValue), CapsuleError> {
            let label = label_of(entry)?;
            let value = if ["text", "boolean", "number"]
                .iter()
                .find_map(|key| entry.get(*key))
                .is_some_and(Value::is_null)
            {
                FieldValue::Null
            } else if let Some(text) = entry.get("text") {
                FieldValue::Text(scalar_string(text))
            } else if let Some(flag) = entry.get("boolean") {
                FieldValue::Boolean(flag.as_str() == Some("true"))
            } else if let Some(number) = entry.get("number") {
                let raw = scalar_string(number);
                let parsed = Decimal::from_str(&raw)
                    .or_else(|_| Decimal::from_scientific(&raw))
                    .map_err(|_| {
                        CapsuleError::Format(format!(
                            "custom field `{}` has non-numeric number `{}`",
                            label, raw
                        ))
                    })?;
                FieldValue::Number(parsed)
            } else {
                return Err(CapsuleError::Format(format!(
                    "custom field `{}` has no text, boolean or number value",
                    label
                )));
            };
            Ok((label, value))
        })
        .collect()
}

/// Decodes date entries into tag (or label) → date, sorted by the full
/// date-time before the time of day is dropped.
pub fn date_tags(entries: &[Value]) -> Result<DateTags, CapsuleError> {
    let mut decoded = entries
        .iter()
        .map(|entry| -> Result<(String, DateTime<Utc>), CapsuleError> {
            let name = match entry.get("tag").and_then(Value::as_str) {
                Some(tag) if !tag.is_empty() => tag.to_string(),
                _ => label_of(entry)?,
            };
            let raw = entry.get("date").map(scalar_string).unwrap_or_default();
            Ok((name, date::parse(&raw)?))
        })
        .collect::<Result<Vec<_>, CapsuleError>>()?;
    decoded.sort_by_key(|(_, dt)| *dt);

    let mut tags = DateTags::default();
    for (name, dt) in decoded {
        let d = dt.date_naive();
        match tags.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = d,
            None => tags.entries.push((name, d)),
        }
    }
    Ok(tags)
}

fn label_of(entry: &Value) -> Result<String, CapsuleError> {
    entry
        .get("label")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CapsuleError::Format(format!("custom field without label: {}", entry)))
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
