use serde_json::Value;

use super::{check_required, get, into_record, parse_u64, scalar_string, RawRecord};
use crate::error::CapsuleError;

const REQUIRED: [&str; 4] = ["id", "description", "details", "owner"];

/// A to-do item. Keys beyond the required four pass through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: u64,
    record: RawRecord,
}

impl Task {
    pub fn from_value(value: Value) -> Result<Self, CapsuleError> {
        Self::from_record(into_record(value, "task")?)
    }

    pub fn from_record(record: RawRecord) -> Result<Self, CapsuleError> {
        check_required(&record, &REQUIRED, "task")?;
        let id = parse_u64(&record["id"], "id")?;
        Ok(Self { id, record })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn description(&self) -> String {
        self.text("description")
    }

    pub fn details(&self) -> String {
        self.text("details")
    }

    /// User name of the task owner.
    pub fn owner(&self) -> String {
        self.text("owner")
    }

    /// Opportunity the task is attached to, if any.
    pub fn opportunity_id(&self) -> Option<u64> {
        self.record
            .get("opportunityId")
            .and_then(|v| parse_u64(v, "opportunityId").ok())
    }

    /// Raw key pass-through.
    pub fn get(&self, key: &str) -> Result<&Value, CapsuleError> {
        get(&self.record, key)
    }

    pub fn record(&self) -> &RawRecord {
        &self.record
    }

    pub fn into_record(self) -> RawRecord {
        self.record
    }

    // Required keys are checked at construction; null reads as empty.
    fn text(&self, key: &str) -> String {
        match &self.record[key] {
            Value::Null => String::new(),
            other => scalar_string(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_accessors() {
        let task = Task::from_value(json!({
            "id": "100",
            "description": "Follow up",
            "details": null,
            "owner": "ada",
            "category": "Call",
            "opportunityId": "7"
        }))
        .unwrap();
        assert_eq!(task.id(), 100);
        assert_eq!(task.description(), "Follow up");
        assert_eq!(task.details(), "");
        assert_eq!(task.owner(), "ada");
        assert_eq!(task.opportunity_id(), Some(7));
        assert_eq!(task.get("category").unwrap(), "Call");
        assert!(task.get("dueDate").unwrap_err().is_not_found());
    }

    #[test]
    fn task_requires_owner() {
        let result = Task::from_value(json!({"id": 1, "description": "x", "details": "y"}));
        assert!(matches!(result, Err(CapsuleError::Format(_))));
    }

    #[test]
    fn task_must_be_object() {
        let result = Task::from_value(json!("task"));
        assert!(matches!(result, Err(CapsuleError::Format(_))));
    }
}
