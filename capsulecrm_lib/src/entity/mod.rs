//! Entity model: typed views over raw API records.
//!
//! Every entity owns the JSON object it was built from. Accessors derive
//! typed values from it on each call; enrichment writes back into the same
//! object under `raw_*` keys and never reaches the server.

use std::collections::BTreeMap;
use std::str::FromStr;

use capsulecrm_api::shape;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::customfields::{self, DateTags, FieldValue};
use crate::error::CapsuleError;

mod opportunity;
pub use self::opportunity::Opportunity;

mod party;
pub use self::party::{Email, Organisation, Party, PartyDetails, Person, Phone};

mod task;
pub use self::task::Task;

/// One resource instance as the API returned it.
pub type RawRecord = Map<String, Value>;

/// Key holding plain custom-field entries after enrichment.
pub const RAW_CUSTOMFIELDS: &str = "raw_customfields";
/// Key holding date-tag entries after enrichment.
pub const RAW_DATATAGS: &str = "raw_datatags";
/// Key holding tag records after enrichment.
pub const TAGS_ID: &str = "tags_id";
/// Pre-`raw_customfields` key, still read when nothing newer is present.
const LEGACY_CUSTOMFIELDS: &str = "customfields";

/// Where an attribute lookup found its answer.
///
/// Lookups try the raw record first, then the entity's named derived
/// accessors, then its plain custom fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Raw(&'a Value),
    Derived(Value),
    CustomField(FieldValue),
    NotFound,
}

impl Lookup<'_> {
    pub fn is_found(&self) -> bool {
        !matches!(self, Lookup::NotFound)
    }

    /// Collapses the lookup into a JSON value, turning `NotFound` into
    /// [`CapsuleError::AttributeNotFound`].
    pub fn into_value(self, name: &str) -> Result<Value, CapsuleError> {
        match self {
            Lookup::Raw(v) => Ok(v.clone()),
            Lookup::Derived(v) => Ok(v),
            Lookup::CustomField(f) => Ok(f.to_json()),
            Lookup::NotFound => Err(CapsuleError::not_found(name)),
        }
    }
}

/// Custom fields, date tags and tags shared by opportunities and parties.
///
/// Implementors only expose their backing record; everything else is
/// provided.
pub trait CustomFieldHolder {
    /// Numeric id of the resource, used to address its sub-resources.
    fn resource_id(&self) -> u64;

    fn record(&self) -> &RawRecord;

    fn record_mut(&mut self) -> &mut RawRecord;

    /// Plain custom fields by label.
    ///
    /// Reads `raw_customfields`, falling back to the legacy `customfields`
    /// key. Neither present means the fields were never loaded.
    fn customfields(&self) -> Result<BTreeMap<String, FieldValue>, CapsuleError> {
        let record = self.record();
        let raw = record
            .get(RAW_CUSTOMFIELDS)
            .or_else(|| record.get(LEGACY_CUSTOMFIELDS))
            .ok_or_else(|| CapsuleError::not_found("customfields"))?;
        customfields::plain_fields(&shape::to_list(Some(raw.clone())))
    }

    /// Date tags, ascending by date.
    fn datatags(&self) -> Result<DateTags, CapsuleError> {
        let raw = self
            .record()
            .get(RAW_DATATAGS)
            .ok_or_else(|| CapsuleError::not_found("datatags"))?;
        customfields::date_tags(&shape::to_list(Some(raw.clone())))
    }

    /// Tag names.
    fn tags(&self) -> Result<Vec<String>, CapsuleError> {
        let raw = self
            .record()
            .get(TAGS_ID)
            .ok_or_else(|| CapsuleError::not_found("tags"))?;
        shape::to_list(Some(raw.clone()))
            .iter()
            .map(|tag| {
                tag.get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| CapsuleError::Format(format!("tag without name: {}", tag)))
            })
            .collect()
    }

    /// A single plain custom field. Not-loaded and not-present both give
    /// [`CapsuleError::AttributeNotFound`].
    fn custom_field(&self, label: &str) -> Result<FieldValue, CapsuleError> {
        self.customfields()?
            .remove(label)
            .ok_or_else(|| CapsuleError::not_found(label))
    }

    /// Stores fetched custom-field entries, split into plain fields and
    /// date tags by the presence of a `date` key.
    fn load_customfields_from_api(&mut self, entries: Vec<Value>) {
        let (dates, plain): (Vec<Value>, Vec<Value>) =
            entries.into_iter().partition(customfields::is_date_entry);
        let record = self.record_mut();
        record.insert(RAW_CUSTOMFIELDS.to_string(), Value::Array(plain));
        record.insert(RAW_DATATAGS.to_string(), Value::Array(dates));
    }

    /// Stores fetched tag records.
    fn load_tags_from_api(&mut self, tags: Vec<Value>) {
        self.record_mut()
            .insert(TAGS_ID.to_string(), Value::Array(tags));
    }
}

/// Resolves `name` against the plain custom fields. Unloaded fields are a
/// miss, not an error; malformed entries still fail.
pub(crate) fn lookup_custom_field<'a, T: CustomFieldHolder + ?Sized>(
    entity: &T,
    name: &str,
) -> Result<Lookup<'a>, CapsuleError> {
    match entity.customfields() {
        Ok(mut fields) => Ok(fields
            .remove(name)
            .map(Lookup::CustomField)
            .unwrap_or(Lookup::NotFound)),
        Err(e) if e.is_not_found() => Ok(Lookup::NotFound),
        Err(e) => Err(e),
    }
}

/// Derived value of `customfields` itself. It never goes through the
/// custom-field layer, which would recurse into the same derivation.
pub(crate) fn lookup_customfields_mapping<'a, T: CustomFieldHolder + ?Sized>(
    entity: &T,
) -> Result<Lookup<'a>, CapsuleError> {
    match entity.customfields() {
        Ok(fields) => Ok(Lookup::Derived(Value::Object(
            fields
                .into_iter()
                .map(|(label, value)| (label, value.to_json()))
                .collect(),
        ))),
        Err(e) if e.is_not_found() => Ok(Lookup::NotFound),
        Err(e) => Err(e),
    }
}

/// Turns an accessor result into an optional derived value; "not found"
/// lets the lookup move on to the next layer.
pub(crate) fn derived_value<T>(
    result: Result<T, CapsuleError>,
    to_json: impl FnOnce(T) -> Value,
) -> Result<Option<Value>, CapsuleError> {
    match result {
        Ok(v) => Ok(Some(to_json(v))),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

pub(crate) fn into_record(value: Value, kind: &str) -> Result<RawRecord, CapsuleError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CapsuleError::Format(format!(
            "{} record is not an object: {}",
            kind, other
        ))),
    }
}

pub(crate) fn check_required(
    record: &RawRecord,
    keys: &[&str],
    kind: &str,
) -> Result<(), CapsuleError> {
    match keys.iter().find(|key| !record.contains_key(**key)) {
        Some(missing) => Err(CapsuleError::Format(format!(
            "{} record is missing `{}`",
            kind, missing
        ))),
        None => Ok(()),
    }
}

pub(crate) fn get<'a>(record: &'a RawRecord, key: &str) -> Result<&'a Value, CapsuleError> {
    record.get(key).ok_or_else(|| CapsuleError::not_found(key))
}

pub(crate) fn get_str<'a>(record: &'a RawRecord, key: &str) -> Result<&'a str, CapsuleError> {
    get(record, key)?
        .as_str()
        .ok_or_else(|| CapsuleError::Format(format!("`{}` is not a string", key)))
}

pub(crate) fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ids arrive as numbers or numeric strings depending on the endpoint.
pub(crate) fn parse_u64(value: &Value, key: &str) -> Result<u64, CapsuleError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CapsuleError::Format(format!("`{}` is not a numeric id: {}", key, value)))
}

pub(crate) fn parse_i64(value: &Value, key: &str) -> Result<i64, CapsuleError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CapsuleError::Format(format!("`{}` is not an integer: {}", key, value)))
}

pub(crate) fn parse_decimal(value: &Value, key: &str) -> Result<Decimal, CapsuleError> {
    let raw = scalar_string(value);
    Decimal::from_str(raw.trim())
        .map_err(|_| CapsuleError::Format(format!("`{}` is not a decimal: {}", key, raw)))
}
