//! Orchestrating client: typed calls in, entities out.

use capsulecrm_api::shape::envelope_list;
use capsulecrm_api::types::{NewHistoryItem, NewOpportunity, NewOrganisation, NewPerson};
use capsulecrm_api::{Client, OpportunityQuery, PartyQuery, Query, TaskQuery};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::CapsuleConfig;
use crate::date;
use crate::entity::{
    CustomFieldHolder, Opportunity, Organisation, Party, Person, RawRecord, Task,
};
use crate::error::CapsuleError;

/// People and organisations from a party listing, each in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parties {
    pub people: Vec<Person>,
    pub organisations: Vec<Organisation>,
}

impl Parties {
    pub fn len(&self) -> usize {
        self.people.len() + self.organisations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// People first, then organisations.
    pub fn into_parties(self) -> Vec<Party> {
        self.people
            .into_iter()
            .map(Party::Person)
            .chain(self.organisations.into_iter().map(Party::Organisation))
            .collect()
    }
}

/// Capsule CRM client that decodes responses into entities.
///
/// Every call builds fresh entities; nothing is cached between calls. The
/// `full_*` variants fetch sub-resources one entity at a time, in listing
/// order, and fail as a whole if any sub-fetch fails.
pub struct CapsuleClient {
    inner: Client,
}

impl CapsuleClient {
    /// Client for the production API of `account`.
    pub fn new(account: &str, api_key: &str) -> Result<Self, CapsuleError> {
        Ok(Self {
            inner: Client::new(account, api_key)?,
        })
    }

    /// Client against a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, account: &str, api_key: &str) -> Result<Self, CapsuleError> {
        Ok(Self {
            inner: Client::with_base_url(base_url, account, api_key)?,
        })
    }

    pub fn from_config(config: &CapsuleConfig) -> Result<Self, CapsuleError> {
        match &config.base_url {
            Some(base_url) => Self::with_base_url(base_url, &config.account, &config.api_key),
            None => Self::new(&config.account, &config.api_key),
        }
    }

    /// The underlying transport, for endpoints without a typed wrapper.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    async fn list<Q: Query>(
        &self,
        path: &str,
        query: Option<&Q>,
        outer: &str,
        inner: &str,
    ) -> Result<Vec<Value>, CapsuleError> {
        let resp = self.inner.get(path, query).await?;
        Ok(envelope_list(resp, outer, inner)?)
    }

    async fn list_path(
        &self,
        path: &str,
        outer: &str,
        inner: &str,
    ) -> Result<Vec<Value>, CapsuleError> {
        self.list::<PartyQuery>(path, None, outer, inner).await
    }

    async fn single(&self, path: &str, key: &str) -> Result<Value, CapsuleError> {
        let resp = self.inner.get_path(path).await?;
        take_key(resp, key)
    }

    // -- Opportunities --

    pub async fn opportunities(
        &self,
        query: &OpportunityQuery,
    ) -> Result<Vec<Opportunity>, CapsuleError> {
        self.list("opportunity", Some(query), "opportunities", "opportunity")
            .await?
            .into_iter()
            .map(Opportunity::from_value)
            .collect()
    }

    pub async fn opportunity(&self, opportunity_id: u64) -> Result<Opportunity, CapsuleError> {
        let raw = self
            .single(&format!("opportunity/{}", opportunity_id), "opportunity")
            .await?;
        Opportunity::from_value(raw)
    }

    /// The opportunity with its custom fields and tags loaded.
    pub async fn full_opportunity(&self, opportunity_id: u64) -> Result<Opportunity, CapsuleError> {
        let mut opportunity = self.opportunity(opportunity_id).await?;
        self.inject_opportunity_customfields(&mut opportunity).await?;
        self.inject_opportunity_tags(&mut opportunity).await?;
        Ok(opportunity)
    }

    /// Opportunities with custom fields and tags loaded, two extra requests
    /// per opportunity.
    pub async fn full_opportunities(
        &self,
        query: &OpportunityQuery,
    ) -> Result<Vec<Opportunity>, CapsuleError> {
        let mut opportunities = self.opportunities(query).await?;
        for opportunity in opportunities.iter_mut() {
            self.inject_opportunity_customfields(opportunity).await?;
            self.inject_opportunity_tags(opportunity).await?;
        }
        Ok(opportunities)
    }

    pub async fn opportunities_by_party(
        &self,
        party_id: u64,
    ) -> Result<Vec<Opportunity>, CapsuleError> {
        self.list_path(
            &format!("party/{}/opportunity", party_id),
            "opportunities",
            "opportunity",
        )
        .await?
        .into_iter()
        .map(Opportunity::from_value)
        .collect()
    }

    pub async fn opportunity_customfields(
        &self,
        opportunity_id: u64,
    ) -> Result<Vec<Value>, CapsuleError> {
        self.list_path(
            &format!("opportunity/{}/customfields", opportunity_id),
            "customFields",
            "customField",
        )
        .await
    }

    pub async fn opportunity_tags(&self, opportunity_id: u64) -> Result<Vec<Value>, CapsuleError> {
        self.list_path(&format!("opportunity/{}/tag", opportunity_id), "tags", "tag")
            .await
    }

    pub async fn opportunity_tasks(&self, opportunity_id: u64) -> Result<Vec<Task>, CapsuleError> {
        self.list_path(&format!("opportunity/{}/tasks", opportunity_id), "tasks", "task")
            .await?
            .into_iter()
            .map(Task::from_value)
            .collect()
    }

    pub async fn inject_opportunity_customfields(
        &self,
        opportunity: &mut Opportunity,
    ) -> Result<(), CapsuleError> {
        tracing::debug!("Loading custom fields for opportunity {}", opportunity.id());
        let entries = self.opportunity_customfields(opportunity.id()).await?;
        opportunity.load_customfields_from_api(entries);
        Ok(())
    }

    pub async fn inject_opportunity_tags(
        &self,
        opportunity: &mut Opportunity,
    ) -> Result<(), CapsuleError> {
        tracing::debug!("Loading tags for opportunity {}", opportunity.id());
        let tags = self.opportunity_tags(opportunity.id()).await?;
        opportunity.load_tags_from_api(tags);
        Ok(())
    }

    pub async fn inject_opportunity_tasks(
        &self,
        opportunity: &mut Opportunity,
    ) -> Result<(), CapsuleError> {
        tracing::debug!("Loading tasks for opportunity {}", opportunity.id());
        let tasks = self.opportunity_tasks(opportunity.id()).await?;
        opportunity.load_tasks_from_api(tasks)
    }

    pub async fn delete_opportunity(&self, opportunity_id: u64) -> Result<(), CapsuleError> {
        self.inner
            .delete(&format!("opportunity/{}", opportunity_id), &json!({}))
            .await?;
        Ok(())
    }

    /// Creates an opportunity against a party and returns its id.
    pub async fn post_opportunity(
        &self,
        party_id: u64,
        opportunity: &NewOpportunity,
    ) -> Result<u64, CapsuleError> {
        let body = envelope("opportunity", opportunity)?;
        let resp = self
            .inner
            .post(&format!("party/{}/opportunity", party_id), &body)
            .await?;
        Ok(resp.created_id()?)
    }

    pub async fn put_opportunity(
        &self,
        opportunity_id: u64,
        fields: RawRecord,
    ) -> Result<(), CapsuleError> {
        let body = json!({ "opportunity": fields });
        self.inner
            .put(&format!("opportunity/{}", opportunity_id), &body)
            .await?;
        Ok(())
    }

    pub async fn put_opportunity_customfields(
        &self,
        opportunity_id: u64,
        entries: Vec<Value>,
    ) -> Result<(), CapsuleError> {
        let body = json!({ "customFields": { "customField": entries } });
        self.inner
            .put(&format!("opportunity/{}/customfields", opportunity_id), &body)
            .await?;
        Ok(())
    }

    /// Sets a date tag on an opportunity; `date` defaults to today (UTC).
    pub async fn put_datatag(
        &self,
        opportunity_id: u64,
        name: &str,
        date: Option<NaiveDate>,
    ) -> Result<(), CapsuleError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let entry = json!({ "tag": name, "label": "Date", "date": date::format(date) });
        self.put_opportunity_customfields(opportunity_id, vec![entry])
            .await
    }

    pub async fn add_party_to_opportunity(
        &self,
        opportunity_id: u64,
        party_id: u64,
    ) -> Result<(), CapsuleError> {
        self.inner
            .post(
                &format!("opportunity/{}/party/{}", opportunity_id, party_id),
                &json!({}),
            )
            .await?;
        Ok(())
    }

    /// Adds a history note to an opportunity and returns the note's id.
    pub async fn post_opportunity_history(
        &self,
        opportunity_id: u64,
        item: &NewHistoryItem,
    ) -> Result<u64, CapsuleError> {
        let body = envelope("historyItem", item)?;
        let resp = self
            .inner
            .post(&format!("opportunity/{}/history", opportunity_id), &body)
            .await?;
        Ok(resp.created_id()?)
    }

    pub async fn opportunity_history(
        &self,
        opportunity_id: u64,
    ) -> Result<Vec<RawRecord>, CapsuleError> {
        let items = self
            .list_path(
                &format!("opportunity/{}/history", opportunity_id),
                "history",
                "historyItem",
            )
            .await?;
        records(items, "history item")
    }

    pub async fn milestones(&self) -> Result<Vec<RawRecord>, CapsuleError> {
        let items = self
            .list_path("opportunity/milestones", "milestones", "milestone")
            .await?;
        records(items, "milestone")
    }

    // -- Parties --

    pub async fn parties(&self, query: &PartyQuery) -> Result<Parties, CapsuleError> {
        let resp = self.inner.get("party", Some(query)).await?;
        split_parties(resp)
    }

    /// A single party, as a person if the response carries `person`,
    /// otherwise as an organisation.
    pub async fn party(&self, party_id: u64) -> Result<Party, CapsuleError> {
        let resp = self.inner.get_path(&format!("party/{}", party_id)).await?;
        Party::from_response(resp)
    }

    pub async fn full_party(&self, party_id: u64) -> Result<Party, CapsuleError> {
        let mut party = self.party(party_id).await?;
        self.inject_party_customfields(&mut party).await?;
        Ok(party)
    }

    pub async fn full_parties(&self, query: &PartyQuery) -> Result<Parties, CapsuleError> {
        let mut parties = self.parties(query).await?;
        self.inject_all_party_customfields(&mut parties).await?;
        Ok(parties)
    }

    pub async fn parties_from_opportunity(
        &self,
        opportunity_id: u64,
    ) -> Result<Parties, CapsuleError> {
        let resp = self
            .inner
            .get_path(&format!("opportunity/{}/party", opportunity_id))
            .await?;
        split_parties(resp)
    }

    pub async fn full_parties_from_opportunity(
        &self,
        opportunity_id: u64,
    ) -> Result<Parties, CapsuleError> {
        let mut parties = self.parties_from_opportunity(opportunity_id).await?;
        self.inject_all_party_customfields(&mut parties).await?;
        Ok(parties)
    }

    /// People attached to an organisation.
    pub async fn people(&self, party_id: u64) -> Result<Vec<Person>, CapsuleError> {
        self.list_path(&format!("party/{}/people", party_id), "parties", "person")
            .await?
            .into_iter()
            .map(Person::from_value)
            .collect()
    }

    pub async fn full_people(&self, party_id: u64) -> Result<Vec<Person>, CapsuleError> {
        let mut people = self.people(party_id).await?;
        for person in people.iter_mut() {
            self.inject_party_customfields(person).await?;
        }
        Ok(people)
    }

    pub async fn party_customfields(&self, party_id: u64) -> Result<Vec<Value>, CapsuleError> {
        self.list_path(
            &format!("party/{}/customfields", party_id),
            "customFields",
            "customField",
        )
        .await
    }

    /// Loads custom fields into any party-like entity.
    pub async fn inject_party_customfields<P: CustomFieldHolder>(
        &self,
        party: &mut P,
    ) -> Result<(), CapsuleError> {
        tracing::debug!("Loading custom fields for party {}", party.resource_id());
        let entries = self.party_customfields(party.resource_id()).await?;
        party.load_customfields_from_api(entries);
        Ok(())
    }

    async fn inject_all_party_customfields(
        &self,
        parties: &mut Parties,
    ) -> Result<(), CapsuleError> {
        for person in parties.people.iter_mut() {
            self.inject_party_customfields(person).await?;
        }
        for organisation in parties.organisations.iter_mut() {
            self.inject_party_customfields(organisation).await?;
        }
        Ok(())
    }

    pub async fn party_history(&self, party_id: u64) -> Result<Vec<RawRecord>, CapsuleError> {
        let items = self
            .list_path(&format!("party/{}/history", party_id), "history", "historyItem")
            .await?;
        records(items, "history item")
    }

    /// Creates a person and returns the new party id. At least one of first
    /// or last name is required; without one nothing is sent.
    pub async fn post_person(&self, person: &NewPerson) -> Result<u64, CapsuleError> {
        if !person.has_name() {
            return Err(CapsuleError::Validation(
                "first_name or last_name must be provided".to_string(),
            ));
        }
        let body = envelope("person", person)?;
        let resp = self.inner.post("person", &body).await?;
        Ok(resp.created_id()?)
    }

    pub async fn put_person(&self, person_id: u64, fields: RawRecord) -> Result<(), CapsuleError> {
        let body = json!({ "person": fields });
        self.inner
            .put(&format!("person/{}", person_id), &body)
            .await?;
        Ok(())
    }

    /// Creates an organisation and returns the new party id.
    pub async fn post_organisation(
        &self,
        organisation: &NewOrganisation,
    ) -> Result<u64, CapsuleError> {
        let body = envelope("organisation", organisation)?;
        let resp = self.inner.post("organisation", &body).await?;
        Ok(resp.created_id()?)
    }

    /// Updates an organisation and returns it as the server now has it.
    pub async fn put_organisation(
        &self,
        party_id: u64,
        fields: RawRecord,
    ) -> Result<Organisation, CapsuleError> {
        let body = json!({ "organisation": fields });
        let resp = self
            .inner
            .put(&format!("organisation/{}", party_id), &body)
            .await?;
        Organisation::from_value(take_key(resp.json()?, "organisation")?)
    }

    // -- Tasks and users --

    pub async fn task(&self, task_id: u64) -> Result<Task, CapsuleError> {
        let raw = self.single(&format!("task/{}", task_id), "task").await?;
        Task::from_value(raw)
    }

    pub async fn tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, CapsuleError> {
        self.list("tasks", Some(query), "tasks", "task")
            .await?
            .into_iter()
            .map(Task::from_value)
            .collect()
    }

    pub async fn complete_task(&self, task_id: u64) -> Result<(), CapsuleError> {
        self.inner
            .post(&format!("task/{}/complete", task_id), &json!({}))
            .await?;
        Ok(())
    }

    /// Updates a task and returns it as the server now has it.
    pub async fn put_task(&self, task_id: u64, fields: RawRecord) -> Result<Task, CapsuleError> {
        let body = json!({ "task": fields });
        let resp = self.inner.put(&format!("task/{}", task_id), &body).await?;
        Task::from_value(take_key(resp.json()?, "task")?)
    }

    pub async fn users(&self) -> Result<Vec<RawRecord>, CapsuleError> {
        let items = self.list_path("users", "users", "user").await?;
        records(items, "user")
    }
}

fn envelope<T: Serialize>(key: &str, payload: &T) -> Result<Value, CapsuleError> {
    let mut body = serde_json::Map::new();
    body.insert(key.to_string(), serde_json::to_value(payload)?);
    Ok(Value::Object(body))
}

fn take_key(mut resp: Value, key: &str) -> Result<Value, CapsuleError> {
    resp.get_mut(key)
        .map(Value::take)
        .ok_or_else(|| CapsuleError::Format(format!("response has no `{}` key", key)))
}

fn records(items: Vec<Value>, kind: &str) -> Result<Vec<RawRecord>, CapsuleError> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            other => Err(CapsuleError::Format(format!(
                "{} is not an object: {}",
                kind, other
            ))),
        })
        .collect()
}

fn split_parties(resp: Value) -> Result<Parties, CapsuleError> {
    let people = envelope_list(resp.clone(), "parties", "person")?;
    let organisations = envelope_list(resp, "parties", "organisation")?;
    Ok(Parties {
        people: people
            .into_iter()
            .map(Person::from_value)
            .collect::<Result<_, _>>()?,
        organisations: organisations
            .into_iter()
            .map(Organisation::from_value)
            .collect::<Result<_, _>>()?,
    })
}
