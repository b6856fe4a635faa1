//! Request bodies for the create endpoints.
//!
//! Each payload serializes to the camelCase object the API expects inside its
//! singular envelope (`{"person": {...}}` and so on). Fields the API accepts
//! but these types do not name go in `extra` and are sent through as given.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A person to create.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    /// Name of an organisation to attach the person to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewPerson {
    pub fn with_first_name(mut self, first_name: &str) -> Self {
        self.first_name = Some(first_name.to_string());
        self
    }

    pub fn with_last_name(mut self, last_name: &str) -> Self {
        self.last_name = Some(last_name.to_string());
        self
    }

    pub fn with_job_title(mut self, job_title: &str) -> Self {
        self.job_title = Some(job_title.to_string());
        self
    }

    pub fn with_organisation_name(mut self, organisation_name: &str) -> Self {
        self.organisation_name = Some(organisation_name.to_string());
        self
    }

    /// True when at least one of first or last name is set.
    pub fn has_name(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }
}

/// An organisation to create.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganisation {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewOrganisation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// An opportunity to create against a party.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewOpportunity {
    pub name: String,

    pub milestone_id: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Decimal amount, as a string (e.g. `"1500.00"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<u8>,

    /// Close date in the API date-time format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewOpportunity {
    pub fn new(name: &str, milestone_id: u64) -> Self {
        Self {
            name: name.to_string(),
            milestone_id,
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: &str, currency: &str) -> Self {
        self.value = Some(value.to_string());
        self.currency = Some(currency.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A note to add to an opportunity's or party's history.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryItem {
    pub note: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Entry date in the API date-time format; the server uses "now" when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewHistoryItem {
    pub fn new(note: &str) -> Self {
        Self {
            note: note.to_string(),
            ..Default::default()
        }
    }
}
