use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use super::{
    check_required, derived_value, get, into_record, lookup_custom_field, lookup_customfields_mapping,
    parse_decimal, parse_i64, parse_u64, CustomFieldHolder, Lookup, RawRecord, Task,
};
use crate::date;
use crate::error::CapsuleError;

const REQUIRED: [&str; 5] = ["id", "createdOn", "updatedOn", "milestoneId", "probability"];
const RAW_TASKS: &str = "raw_tasks";

/// A sales opportunity.
///
/// An opportunity is open until it has an `actualCloseDate`. A closed
/// opportunity at probability 100 was won, at probability 0 lost.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    id: u64,
    record: RawRecord,
}

impl Opportunity {
    /// Wraps a raw opportunity object, checking its required keys.
    pub fn from_value(value: Value) -> Result<Self, CapsuleError> {
        Self::from_record(into_record(value, "opportunity")?)
    }

    pub fn from_record(record: RawRecord) -> Result<Self, CapsuleError> {
        check_required(&record, &REQUIRED, "opportunity")?;
        let id = parse_u64(&record["id"], "id")?;
        Ok(Self { id, record })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Raw key pass-through.
    pub fn get(&self, key: &str) -> Result<&Value, CapsuleError> {
        get(&self.record, key)
    }

    pub fn into_record(self) -> RawRecord {
        self.record
    }

    pub fn name(&self) -> Result<&str, CapsuleError> {
        super::get_str(&self.record, "name")
    }

    pub fn created_on(&self) -> Result<DateTime<Utc>, CapsuleError> {
        self.date_field("createdOn")
    }

    pub fn updated_on(&self) -> Result<DateTime<Utc>, CapsuleError> {
        self.date_field("updatedOn")
    }

    pub fn expected_close_date(&self) -> Result<DateTime<Utc>, CapsuleError> {
        self.date_field("expectedCloseDate")
    }

    pub fn actual_close_date(&self) -> Result<DateTime<Utc>, CapsuleError> {
        self.date_field("actualCloseDate")
    }

    pub fn open(&self) -> bool {
        !self.record.contains_key("actualCloseDate")
    }

    pub fn probability(&self) -> Result<i64, CapsuleError> {
        parse_i64(get(&self.record, "probability")?, "probability")
    }

    pub fn milestone_id(&self) -> Result<u64, CapsuleError> {
        parse_u64(get(&self.record, "milestoneId")?, "milestoneId")
    }

    /// Deal value; zero when the opportunity has none.
    pub fn value(&self) -> Result<Decimal, CapsuleError> {
        match self.record.get("value") {
            Some(value) => parse_decimal(value, "value"),
            None => Ok(Decimal::ZERO),
        }
    }

    /// `value * probability / 100`. A product outside the `Decimal` range is
    /// a format error.
    pub fn weighted_value(&self) -> Result<Decimal, CapsuleError> {
        let value = self.value()?;
        let probability = self.probability()?;
        value
            .checked_mul(Decimal::from(probability))
            .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| {
                CapsuleError::Format(format!(
                    "weighted value of {} at probability {} is out of range",
                    value, probability
                ))
            })
    }

    pub fn positive_outcome(&self) -> Result<bool, CapsuleError> {
        Ok(!self.open() && self.probability()? == 100)
    }

    pub fn negative_outcome(&self) -> Result<bool, CapsuleError> {
        Ok(!self.open() && self.probability()? == 0)
    }

    /// Tasks attached by [`Opportunity::load_tasks_from_api`].
    pub fn tasks(&self) -> Result<Vec<Task>, CapsuleError> {
        let raw = get(&self.record, RAW_TASKS).map_err(|_| CapsuleError::not_found("tasks"))?;
        capsulecrm_api::shape::to_list(Some(raw.clone()))
            .into_iter()
            .map(Task::from_value)
            .collect()
    }

    /// Attaches tasks fetched for this opportunity. Every task must belong
    /// to it; a stray task rejects the whole batch.
    pub fn load_tasks_from_api(&mut self, tasks: Vec<Task>) -> Result<(), CapsuleError> {
        if let Some(stray) = tasks
            .iter()
            .find(|task| task.opportunity_id() != Some(self.id))
        {
            return Err(CapsuleError::Validation(format!(
                "task {} does not belong to opportunity {}",
                stray.id(),
                self.id
            )));
        }
        let raw = tasks
            .into_iter()
            .map(|task| Value::Object(task.into_record()))
            .collect();
        self.record.insert(RAW_TASKS.to_string(), Value::Array(raw));
        Ok(())
    }

    /// Resolves an attribute: raw key, then derived accessor, then custom field.
    pub fn lookup(&self, name: &str) -> Result<Lookup<'_>, CapsuleError> {
        if name == "customfields" {
            return lookup_customfields_mapping(self);
        }
        if let Some(value) = self.record.get(name) {
            return Ok(Lookup::Raw(value));
        }
        if let Some(value) = self.derived(name)? {
            return Ok(Lookup::Derived(value));
        }
        lookup_custom_field(self, name)
    }

    /// [`Opportunity::lookup`], failing with `AttributeNotFound` on a miss.
    pub fn attr(&self, name: &str) -> Result<Value, CapsuleError> {
        self.lookup(name)?.into_value(name)
    }

    fn derived(&self, name: &str) -> Result<Option<Value>, CapsuleError> {
        let datetime = |dt: DateTime<Utc>| Value::String(dt.to_rfc3339());
        let decimal = |d: Decimal| Value::String(d.to_string());
        match name {
            "open" => Ok(Some(Value::Bool(self.open()))),
            "probability" => derived_value(self.probability(), Value::from),
            "milestone_id" => derived_value(self.milestone_id(), Value::from),
            "value" => derived_value(self.value(), decimal),
            "weighted_value" => derived_value(self.weighted_value(), decimal),
            "positive_outcome" => derived_value(self.positive_outcome(), Value::Bool),
            "negative_outcome" => derived_value(self.negative_outcome(), Value::Bool),
            "created_on" => derived_value(self.created_on(), datetime),
            "updated_on" => derived_value(self.updated_on(), datetime),
            "expected_close_date" => derived_value(self.expected_close_date(), datetime),
            "actual_close_date" => derived_value(self.actual_close_date(), datetime),
            "tags" => derived_value(self.tags(), Value::from),
            "datatags" => derived_value(self.datatags(), |tags| tags.to_json()),
            _ => Ok(None),
        }
    }

    fn date_field(&self, key: &str) -> Result<DateTime<Utc>, CapsuleError> {
        let raw = get(&self.record, key)?;
        let raw = raw
            .as_str()
            .ok_or_else(|| CapsuleError::Format(format!("`{}` is not a date string", key)))?;
        date::parse(raw)
    }
}

impl CustomFieldHolder for Opportunity {
    fn resource_id(&self) -> u64 {
        self.id
    }

    fn record(&self) -> &RawRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut RawRecord {
        &mut self.record
    }
}
