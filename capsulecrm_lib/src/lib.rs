//! Library layer for Capsule CRM: typed entities over raw API records and an
//! orchestrating client.
//!
//! Wraps the `capsulecrm_api` transport with shape normalization, the
//! opportunity/party/task entity model, custom-field decoding, and the
//! "full" fetches that enrich an entity with its sub-resources.

pub mod client;
pub mod config;
pub mod customfields;
pub mod date;
pub mod entity;
pub mod error;

pub use capsulecrm_api;
pub use capsulecrm_api::types;
pub use capsulecrm_api::{OpportunityQuery, PartyQuery, Query, TaskQuery};

pub use client::{CapsuleClient, Parties};
pub use config::CapsuleConfig;
pub use customfields::{CustomFieldSet, DateTags, FieldValue};
pub use entity::{
    CustomFieldHolder, Email, Lookup, Opportunity, Organisation, Party, PartyDetails, Person,
    Phone, RawRecord, Task,
};
pub use error::CapsuleError;
