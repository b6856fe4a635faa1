use capsulecrm_api::shape;
use serde_json::Value;

use super::{
    check_required, derived_value, get, get_str, into_record, lookup_custom_field,
    lookup_customfields_mapping, parse_u64, CustomFieldHolder, Lookup, RawRecord,
};
use crate::error::CapsuleError;

/// An email address from a party's contact details.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    record: RawRecord,
}

impl Email {
    pub fn id(&self) -> Result<u64, CapsuleError> {
        parse_u64(get(&self.record, "id")?, "id")
    }

    pub fn email_address(&self) -> Result<&str, CapsuleError> {
        get_str(&self.record, "emailAddress")
    }

    pub fn record(&self) -> &RawRecord {
        &self.record
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.email_address().unwrap_or_default())
    }
}

/// A phone number from a party's contact details.
#[derive(Debug, Clone, PartialEq)]
pub struct Phone {
    record: RawRecord,
}

impl Phone {
    pub fn id(&self) -> Result<u64, CapsuleError> {
        parse_u64(get(&self.record, "id")?, "id")
    }

    pub fn phone_number(&self) -> Result<&str, CapsuleError> {
        get_str(&self.record, "phoneNumber")
    }

    pub fn record(&self) -> &RawRecord {
        &self.record
    }
}

impl std::fmt::Display for Phone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.phone_number().unwrap_or_default())
    }
}

/// Behaviour shared by people and organisations.
pub trait PartyDetails: CustomFieldHolder {
    /// Display name. How it is built depends on the kind of party.
    fn name(&self) -> Result<String, CapsuleError>;

    fn about(&self) -> Result<&str, CapsuleError> {
        get_str(self.record(), "about")
    }

    /// Contact details. The API sends an empty string when there are none,
    /// which reads as an empty mapping here.
    fn contacts(&self) -> RawRecord {
        match self.record().get("contacts") {
            Some(Value::Object(map)) => map.clone(),
            _ => RawRecord::new(),
        }
    }

    fn emails(&self) -> Result<Vec<Email>, CapsuleError> {
        let records = contact_records(self.contacts(), "email", "emails")?;
        Ok(records.into_iter().map(|record| Email { record }).collect())
    }

    fn phone_numbers(&self) -> Result<Vec<Phone>, CapsuleError> {
        let records = contact_records(self.contacts(), "phone", "phone_numbers")?;
        Ok(records.into_iter().map(|record| Phone { record }).collect())
    }
}

fn contact_records(
    mut contacts: RawRecord,
    key: &str,
    attribute: &str,
) -> Result<Vec<RawRecord>, CapsuleError> {
    let items = shape::to_list(contacts.remove(key));
    if items.is_empty() {
        return Err(CapsuleError::not_found(attribute));
    }
    items
        .into_iter()
        .map(|item| into_record(item, attribute))
        .collect()
}

/// Derived values common to every party, for attribute lookups.
fn party_derived<P: PartyDetails + ?Sized>(
    party: &P,
    name: &str,
) -> Result<Option<Value>, CapsuleError> {
    match name {
        "name" => derived_value(party.name(), Value::String),
        "about" => derived_value(party.about(), Value::from),
        "emails" => derived_value(party.emails(), |emails| {
            Value::Array(
                emails
                    .into_iter()
                    .map(|e| Value::Object(e.record))
                    .collect(),
            )
        }),
        "phone_numbers" => derived_value(party.phone_numbers(), |phones| {
            Value::Array(
                phones
                    .into_iter()
                    .map(|p| Value::Object(p.record))
                    .collect(),
            )
        }),
        "tags" => derived_value(party.tags(), Value::from),
        "datatags" => derived_value(party.datatags(), |tags| tags.to_json()),
        _ => Ok(None),
    }
}

fn party_lookup<'a, P: PartyDetails + ?Sized>(
    party: &'a P,
    name: &str,
    extra: impl FnOnce(&str) -> Result<Option<Value>, CapsuleError>,
) -> Result<Lookup<'a>, CapsuleError> {
    if name == "customfields" {
        return lookup_customfields_mapping(party);
    }
    if let Some(value) = party.record().get(name) {
        return Ok(Lookup::Raw(value));
    }
    if let Some(value) = party_derived(party, name)? {
        return Ok(Lookup::Derived(value));
    }
    if let Some(value) = extra(name)? {
        return Ok(Lookup::Derived(value));
    }
    lookup_custom_field(party, name)
}

/// An individual.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    id: u64,
    record: RawRecord,
}

impl Person {
    pub fn from_value(value: Value) -> Result<Self, CapsuleError> {
        Self::from_record(into_record(value, "person")?)
    }

    pub fn from_record(record: RawRecord) -> Result<Self, CapsuleError> {
        check_required(&record, &["id"], "person")?;
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

    pub fn first_name(&self) -> Result<&str, CapsuleError> {
        get_str(&self.record, "firstName").map_err(|e| rename_not_found(e, "first_name"))
    }

    pub fn last_name(&self) -> Result<&str, CapsuleError> {
        get_str(&self.record, "lastName").map_err(|e| rename_not_found(e, "last_name"))
    }

    pub fn title(&self) -> Result<&str, CapsuleError> {
        get_str(&self.record, "title")
    }

    pub fn job_title(&self) -> Result<&str, CapsuleError> {
        get_str(&self.record, "jobTitle").map_err(|e| rename_not_found(e, "job_title"))
    }

    /// Resolves an attribute: raw key, then derived accessor, then custom field.
    pub fn lookup(&self, name: &str) -> Result<Lookup<'_>, CapsuleError> {
        party_lookup(self, name, |name| match name {
            "first_name" => derived_value(self.first_name(), Value::from),
            "last_name" => derived_value(self.last_name(), Value::from),
            "job_title" => derived_value(self.job_title(), Value::from),
            _ => Ok(None),
        })
    }

    pub fn attr(&self, name: &str) -> Result<Value, CapsuleError> {
        self.lookup(name)?.into_value(name)
    }
}

impl CustomFieldHolder for Person {
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

impl PartyDetails for Person {
    /// First and last name joined by a space. A person with neither is
    /// rejected rather than given an empty name.
    fn name(&self) -> Result<String, CapsuleError> {
        let parts: Vec<&str> = [self.first_name(), self.last_name()]
            .into_iter()
            .filter_map(Result::ok)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            return Err(CapsuleError::Validation(format!(
                "{}: party doesn't have first or last name",
                self.id
            )));
        }
        Ok(parts.join(" "))
    }
}

/// A company or other organisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Organisation {
    id: u64,
    record: RawRecord,
}

impl Organisation {
    pub fn from_value(value: Value) -> Result<Self, CapsuleError> {
        Self::from_record(into_record(value, "organisation")?)
    }

    pub fn from_record(record: RawRecord) -> Result<Self, CapsuleError> {
        check_required(&record, &["id", "name"], "organisation")?;
        let id = parse_u64(&record["id"], "id")?;
        Ok(Self { id, record })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn get(&self, key: &str) -> Result<&Value, CapsuleError> {
        get(&self.record, key)
    }

    pub fn into_record(self) -> RawRecord {
        self.record
    }

    pub fn lookup(&self, name: &str) -> Result<Lookup<'_>, CapsuleError> {
        party_lookup(self, name, |_| Ok(None))
    }

    pub fn attr(&self, name: &str) -> Result<Value, CapsuleError> {
        self.lookup(name)?.into_value(name)
    }
}

impl CustomFieldHolder for Organisation {
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

impl PartyDetails for Organisation {
    fn name(&self) -> Result<String, CapsuleError> {
        get_str(&self.record, "name").map(str::to_string)
    }
}

/// A party is either a person or an organisation; which one is decided by
/// the wrapper key the API used.
#[derive(Debug, Clone, PartialEq)]
pub enum Party {
    Person(Person),
    Organisation(Organisation),
}

impl Party {
    /// Picks the variant from a `{"person": ...}` or `{"organisation": ...}`
    /// response. `person` is tried first.
    pub fn from_response(mut resp: Value) -> Result<Self, CapsuleError> {
        if let Some(person) = resp.get_mut("person").map(Value::take) {
            return Person::from_value(person).map(Party::Person);
        }
        if let Some(organisation) = resp.get_mut("organisation").map(Value::take) {
            return Organisation::from_value(organisation).map(Party::Organisation);
        }
        Err(CapsuleError::Format(
            "party response has neither `person` nor `organisation`".to_string(),
        ))
    }

    pub fn id(&self) -> u64 {
        self.resource_id()
    }

    /// `"person"` or `"organisation"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Party::Person(_) => "person",
            Party::Organisation(_) => "organisation",
        }
    }

    pub fn as_person(&self) -> Option<&Person> {
        match self {
            Party::Person(p) => Some(p),
            Party::Organisation(_) => None,
        }
    }

    pub fn as_organisation(&self) -> Option<&Organisation> {
        match self {
            Party::Organisation(o) => Some(o),
            Party::Person(_) => None,
        }
    }

    pub fn get(&self, key: &str) -> Result<&Value, CapsuleError> {
        get(self.record(), key)
    }

    pub fn lookup(&self, name: &str) -> Result<Lookup<'_>, CapsuleError> {
        match self {
            Party::Person(p) => p.lookup(name),
            Party::Organisation(o) => o.lookup(name),
        }
    }

    pub fn attr(&self, name: &str) -> Result<Value, CapsuleError> {
        self.lookup(name)?.into_value(name)
    }
}

impl CustomFieldHolder for Party {
    fn resource_id(&self) -> u64 {
        match self {
            Party::Person(p) => p.id,
            Party::Organisation(o) => o.id,
        }
    }

    fn record(&self) -> &RawRecord {
        match self {
            Party::Person(p) => &p.record,
            Party::Organisation(o) => &o.record,
        }
    }

    fn record_mut(&mut self) -> &mut RawRecord {
        match self {
            Party::Person(p) => &mut p.record,
            Party::Organisation(o) => &mut o.record,
        }
    }
}

impl PartyDetails for Party {
    fn name(&self) -> Result<String, CapsuleError> {
        match self {
            Party::Person(p) => p.name(),
            Party::Organisation(o) => o.name(),
        }
    }
}

fn rename_not_found(err: CapsuleError, attribute: &str) -> CapsuleError {
    if err.is_not_found() {
        CapsuleError::not_found(attribute)
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customfields::FieldValue;
    use serde_json::json;

    fn person(value: Value) -> Person {
        Person::from_value(value).unwrap()
    }

    #[test]
    fn person_with_empty_contacts() {
        let party = Party::from_response(json!({"person": {"id": 42, "contacts": ""}})).unwrap();
        assert_eq!(party.kind(), "person");
        assert_eq!(party.id(), 42);
        assert!(party.emails().unwrap_err().is_not_found());
        assert!(party.phone_numbers().unwrap_err().is_not_found());
    }

    #[test]
    fn organisation_selected_when_person_absent() {
        let party =
            Party::from_response(json!({"organisation": {"id": "9", "name": "Acme Ltd"}})).unwrap();
        assert_eq!(party.kind(), "organisation");
        assert_eq!(party.name().unwrap(), "Acme Ltd");
        assert!(party.as_person().is_none());
    }

    #[test]
    fn organisation_requires_name() {
        let result = Party::from_response(json!({"organisation": {"id": "9"}}));
        assert!(matches!(result, Err(CapsuleError::Format(_))));
    }

    #[test]
    fn unknown_party_wrapper_is_format_error() {
        let result = Party::from_response(json!({"user": {"id": 1}}));
        assert!(matches!(result, Err(CapsuleError::Format(_))));
    }

    #[test]
    fn single_email_and_phone_list() {
        let p = person(json!({
            "id": 1,
            "firstName": "Ada",
            "contacts": {
                "email": {"id": "10", "emailAddress": "ada@example.com"},
                "phone": [
                    {"id": "11", "phoneNumber": "+44 1"},
                    {"id": "12", "phoneNumber": "+44 2"}
                ]
            }
        }));
        let emails = p.emails().unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].id().unwrap(), 10);
        assert_eq!(emails[0].to_string(), "ada@example.com");

        let phones = p.phone_numbers().unwrap();
        assert_eq!(phones.len(), 2);
        assert_eq!(phones[1].phone_number().unwrap(), "+44 2");
    }

    #[test]
    fn contacts_without_email_key() {
        let p = person(json!({"id": 1, "contacts": {"phone": {"id": "1", "phoneNumber": "5"}}}));
        assert!(p.emails().unwrap_err().is_not_found());
        assert_eq!(p.phone_numbers().unwrap().len(), 1);
    }

    #[test]
    fn person_name_variants() {
        assert_eq!(
            person(json!({"id": 1, "firstName": "Ada", "lastName": "Lovelace"}))
                .name()
                .unwrap(),
            "Ada Lovelace"
        );
        assert_eq!(person(json!({"id": 1, "lastName": "Lovelace"})).name().unwrap(), "Lovelace");
        assert_eq!(
            person(json!({"id": 1, "firstName": "", "lastName": "Lovelace"}))
                .name()
                .unwrap(),
            "Lovelace"
        );
    }

    #[test]
    fn person_without_names_is_validation_error() {
        let p = person(json!({"id": 5}));
        assert!(matches!(p.name(), Err(CapsuleError::Validation(_))));
        assert!(matches!(p.lookup("name"), Err(CapsuleError::Validation(_))));
    }

    #[test]
    fn optional_person_fields() {
        let p = person(json!({"id": 5, "jobTitle": "Engineer"}));
        assert_eq!(p.job_title().unwrap(), "Engineer");
        assert_eq!(
            p.first_name().unwrap_err().to_string(),
            "Attribute not found: first_name"
        );
        assert!(p.title().unwrap_err().is_not_found());
        assert!(p.about().unwrap_err().is_not_found());
    }

    #[test]
    fn party_lookup_reaches_custom_fields() {
        let mut party =
            Party::from_response(json!({"person": {"id": 1, "firstName": "Ada"}})).unwrap();
        party.load_customfields_from_api(vec![
            json!({"label": "VIP", "boolean": "true"}),
            json!({"label": "Date", "tag": "met", "date": "2020-05-05T00:00:00Z"}),
        ]);
        assert_eq!(party.attr("firstName").unwrap(), json!("Ada"));
        assert_eq!(party.attr("first_name").unwrap(), json!("Ada"));
        assert_eq!(party.attr("name").unwrap(), json!("Ada"));
        assert_eq!(
            party.lookup("VIP").unwrap(),
            Lookup::CustomField(FieldValue::Boolean(true))
        );
        assert_eq!(party.attr("datatags").unwrap(), json!({"met": "2020-05-05"}));
        assert!(party.attr("missing").unwrap_err().is_not_found());
    }
}
