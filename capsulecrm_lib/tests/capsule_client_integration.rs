use capsulecrm_lib::capsulecrm_api::Error as ApiError;
use capsulecrm_lib::types::{NewOpportunity, NewPerson};
use capsulecrm_lib::{
    date, CapsuleClient, CapsuleError, CustomFieldHolder, FieldValue, Opportunity,
    OpportunityQuery, PartyDetails, PartyQuery, Query, RawRecord, TaskQuery,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CapsuleClient {
    CapsuleClient::with_base_url(&format!("{}/api", server.uri()), "acme", "secret-key").unwrap()
}

fn record(value: serde_json::Value) -> RawRecord {
    value.as_object().cloned().unwrap()
}

fn fixture(name: &str) -> serde_json::Value {
    let raw = match name {
        "opportunities" => include_str!("fixtures/opportunities.json"),
        "opportunity_customfields" => include_str!("fixtures/opportunity_customfields.json"),
        other => panic!("unknown fixture {}", other),
    };
    serde_json::from_str(raw).unwrap()
}

// ============================================================================
// Opportunities
// ============================================================================

#[tokio::test]
async fn opportunities_listing_decodes_entities() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("opportunities")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let query = OpportunityQuery::default().with_limit(2);
    let opportunities = client.opportunities(&query).await.unwrap();

    assert_eq!(opportunities.len(), 2);
    let consulting = &opportunities[0];
    assert_eq!(consulting.id(), 43);
    assert!(consulting.open());
    assert_eq!(consulting.value().unwrap(), Decimal::new(500, 0));
    assert_eq!(consulting.weighted_value().unwrap(), Decimal::new(250, 0));

    let training = &opportunities[1];
    assert!(!training.open());
    assert!(training.positive_outcome().unwrap());
    assert_eq!(training.value().unwrap(), Decimal::ZERO);
}

#[tokio::test]
async fn full_opportunities_fetch_sub_resources_per_entity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("opportunities")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/43/customfields"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(fixture("opportunity_customfields")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/44/customfields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customFields": ""})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/43/tag"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"tags": {"tag": {"name": "vip"}}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/44/tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tags": {"tag": [{"name": "training"}, {"name": "repeat"}]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let opportunities = client
        .full_opportunities(&OpportunityQuery::default())
        .await
        .unwrap();

    let consulting = &opportunities[0];
    assert_eq!(consulting.tags().unwrap(), vec!["vip".to_string()]);
    assert_eq!(
        consulting.custom_field("Region").unwrap(),
        FieldValue::Text("EMEA".to_string())
    );
    assert_eq!(
        consulting.attr("Renewal").unwrap(),
        json!(true),
        "custom fields resolve through attribute lookup"
    );
    let datatags = consulting.datatags().unwrap();
    assert_eq!(datatags.keys().collect::<Vec<_>>(), vec!["kickoff", "signed"]);
    assert_eq!(
        datatags.get("signed"),
        NaiveDate::from_ymd_opt(2024, 2, 1)
    );

    let training = &opportunities[1];
    assert!(training.customfields().unwrap().is_empty());
    assert!(training.datatags().unwrap().is_empty());
    assert_eq!(training.tags().unwrap(), vec!["training", "repeat"]);
}

#[tokio::test]
async fn full_opportunity_fails_when_a_sub_fetch_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/43"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "opportunity": {
                "id": "43",
                "milestoneId": "2",
                "probability": "50",
                "createdOn": "2024-01-10T09:30:00Z",
                "updatedOn": "2024-01-12T16:45:10Z"
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/43/customfields"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    match client.full_opportunity(43).await {
        Err(CapsuleError::Api(ApiError::HttpStatus { status, body })) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected HttpStatus, got {:?}", other.map(|o| o.id())),
    }
}

#[tokio::test]
async fn opportunity_missing_required_key_is_format_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"opportunity": {"id": "5"}})),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.opportunity(5).await;
    assert!(matches!(result, Err(CapsuleError::Format(_))));
}

#[tokio::test]
async fn inject_tasks_attaches_owned_tasks() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/43/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": {"task": {
                "id": "100",
                "description": "Send proposal",
                "details": "",
                "owner": "ada",
                "opportunityId": "43"
            }}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let raw = fixture("opportunities")["opportunities"]["opportunity"][0].clone();
    let mut opportunity = Opportunity::from_value(raw).unwrap();
    client.inject_opportunity_tasks(&mut opportunity).await.unwrap();

    let tasks = opportunity.tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].description(), "Send proposal");
}

#[tokio::test]
async fn post_opportunity_returns_created_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/party/7/opportunity"))
        .and(body_json(json!({
            "opportunity": {
                "name": "Licences",
                "milestoneId": 2,
                "currency": "GBP",
                "value": "1500.00"
            }
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", "https://acme.capsulecrm.com/api/opportunity/321"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let new = NewOpportunity::new("Licences", 2).with_value("1500.00", "GBP");
    assert_eq!(client.post_opportunity(7, &new).await.unwrap(), 321);
}

#[tokio::test]
async fn put_datatag_sends_date_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/opportunity/43/customfields"))
        .and(body_json(json!({
            "customFields": {"customField": [
                {"tag": "signed", "label": "Date", "date": "2024-02-01T00:00:00Z"}
            ]}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .put_datatag(43, "signed", NaiveDate::from_ymd_opt(2024, 2, 1))
        .await
        .unwrap();
}

#[tokio::test]
async fn put_datatag_defaults_to_today() {
    let mock_server = MockServer::start().await;
    let today = date::format(Utc::now().date_naive());

    Mock::given(method("PUT"))
        .and(path("/api/opportunity/43/customfields"))
        .and(body_json(json!({
            "customFields": {"customField": [
                {"tag": "signed", "label": "Date", "date": today}
            ]}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.put_datatag(43, "signed", None).await.unwrap();
}

#[tokio::test]
async fn parties_from_opportunity_split_by_kind() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/43/party"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parties": {
                "person": [
                    {"id": "1", "firstName": "Ada", "lastName": "Lovelace"},
                    {"id": "3", "lastName": "Babbage"}
                ],
                "organisation": {"id": "2", "name": "Acme Ltd"}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let parties = client.parties_from_opportunity(43).await.unwrap();

    assert_eq!(parties.len(), 3);
    let people: Vec<String> = parties.people.iter().map(|p| p.name().unwrap()).collect();
    assert_eq!(people, vec!["Ada Lovelace", "Babbage"]);
    assert_eq!(parties.organisations[0].id(), 2);
    assert_eq!(parties.organisations[0].name().unwrap(), "Acme Ltd");
}

#[tokio::test]
async fn milestones_listing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/opportunity/milestones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "milestones": {"milestone": [
                {"id": "1", "name": "New", "probability": "10"},
                {"id": "4", "name": "Won", "probability": "100"}
            ]}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let milestones = client.milestones().await.unwrap();
    assert_eq!(milestones.len(), 2);
    assert_eq!(milestones[1]["name"], "Won");
}

// ============================================================================
// Parties
// ============================================================================

#[tokio::test]
async fn party_falls_back_to_organisation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/party/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organisation": {"id": "9", "name": "Acme Ltd", "contacts": ""}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let party = client.party(9).await.unwrap();
    assert_eq!(party.kind(), "organisation");
    assert_eq!(party.name().unwrap(), "Acme Ltd");
    assert!(party.emails().unwrap_err().is_not_found());
}

#[tokio::test]
async fn full_parties_load_custom_fields_for_each_party() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/party"))
        .and(query_param("q", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parties": {
                "person": {"id": "1", "firstName": "Ada", "lastName": "Lovelace"},
                "organisation": {"id": "2", "name": "Acme Ltd"}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/party/1/customfields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customFields": {"customField": {"label": "Score", "number": "7.5"}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/party/2/customfields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customFields": ""})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let parties = client
        .full_parties(&PartyQuery::default().with_search("acme"))
        .await
        .unwrap();

    assert_eq!(parties.people.len(), 1);
    assert_eq!(parties.organisations.len(), 1);
    assert_eq!(parties.people[0].name().unwrap(), "Ada Lovelace");
    assert_eq!(
        parties.people[0].custom_field("Score").unwrap(),
        FieldValue::Number(Decimal::new(75, 1))
    );
    assert!(parties.organisations[0].customfields().unwrap().is_empty());
}

#[tokio::test]
async fn people_of_an_organisation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/party/2/people"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parties": {"person": {"id": "1", "firstName": "Ada", "jobTitle": "Analyst"}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let people = client.people(2).await.unwrap();

    assert_eq!(people.len(), 1);
    assert_eq!(people[0].id(), 1);
    assert_eq!(people[0].job_title().unwrap(), "Analyst");
    assert!(people[0].customfields().is_err());
}

#[tokio::test]
async fn full_people_load_custom_fields_per_person() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/party/2/people"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parties": {"person": [
                {"id": "1", "firstName": "Ada"},
                {"id": "3", "firstName": "Charles"}
            ]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/party/1/customfields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customFields": {"customField": {"label": "VIP", "boolean": "true"}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/party/3/customfields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customFields": ""})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let people = client.full_people(2).await.unwrap();

    assert_eq!(people.len(), 2);
    assert_eq!(
        people[0].custom_field("VIP").unwrap(),
        FieldValue::Boolean(true)
    );
    assert!(people[1].customfields().unwrap().is_empty());
}

#[tokio::test]
async fn put_organisation_returns_updated_entity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/organisation/2"))
        .and(body_json(json!({"organisation": {"name": "Acme Holdings"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organisation": {"id": "2", "name": "Acme Holdings", "about": "Widgets"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let organisation = client
        .put_organisation(2, record(json!({"name": "Acme Holdings"})))
        .await
        .unwrap();

    assert_eq!(organisation.id(), 2);
    assert_eq!(organisation.name().unwrap(), "Acme Holdings");
    assert_eq!(organisation.get("about").unwrap(), "Widgets");
}

#[tokio::test]
async fn post_person_without_name_never_calls_api() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/person"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let person = NewPerson::default().with_job_title("Engineer");
    let result = client.post_person(&person).await;
    assert!(matches!(result, Err(CapsuleError::Validation(_))));
}

#[tokio::test]
async fn post_person_returns_created_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/person"))
        .and(body_json(json!({"person": {"firstName": "Ada"}})))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", "https://acme.capsulecrm.com/api/party/99"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let person = NewPerson::default().with_first_name("Ada");
    assert_eq!(client.post_person(&person).await.unwrap(), 99);
}

// ============================================================================
// Tasks
// ============================================================================

#[tokio::test]
async fn complete_task_posts_empty_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/task/100/complete"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.complete_task(100).await.unwrap();
}

#[tokio::test]
async fn tasks_listing_applies_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(query_param("category", "Call"))
        .and(query_param("user", "ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": {"task": {
                "id": "100",
                "description": "Call back",
                "details": "",
                "owner": "ada",
                "opportunityId": "43"
            }}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let query = TaskQuery::default().with_category("Call").with_user("ada");
    let tasks = client.tasks(&query).await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id(), 100);
    assert_eq!(tasks[0].owner(), "ada");
    assert_eq!(tasks[0].opportunity_id(), Some(43));
}

#[tokio::test]
async fn put_task_returns_updated_entity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/task/100"))
        .and(body_json(json!({"task": {"details": "Ask about renewal"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task": {
                "id": "100",
                "description": "Call back",
                "details": "Ask about renewal",
                "owner": "ada"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let task = client
        .put_task(100, record(json!({"details": "Ask about renewal"})))
        .await
        .unwrap();

    assert_eq!(task.id(), 100);
    assert_eq!(task.details(), "Ask about renewal");
    assert_eq!(task.opportunity_id(), None);
}

#[tokio::test]
async fn put_task_response_without_task_is_format_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/task/100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"other": {}})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.put_task(100, RawRecord::new()).await;
    assert!(matches!(result, Err(CapsuleError::Format(_))));
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn users_listing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": {"user": {"id": "5", "username": "ada", "name": "Ada Lovelace"}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let users = client.users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "ada");
}
