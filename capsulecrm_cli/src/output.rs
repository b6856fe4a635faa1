use capsulecrm_lib::{
    CustomFieldHolder, FieldValue, Opportunity, Party, PartyDetails, Person, RawRecord, Task,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct OpportunityRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Milestone")]
    #[serde(rename = "Milestone")]
    milestone: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
    #[tabled(rename = "Prob.")]
    #[serde(rename = "Prob.")]
    probability: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
    #[tabled(rename = "Weighted")]
    #[serde(rename = "Weighted")]
    weighted: String,
    #[tabled(rename = "Tags")]
    #[serde(rename = "Tags")]
    tags: String,
}

#[derive(Tabled, Serialize)]
struct PartyRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: u64,
    #[tabled(rename = "Kind")]
    #[serde(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    #[serde(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    #[serde(rename = "Phone")]
    phone: String,
}

#[derive(Tabled, Serialize)]
struct TaskRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: u64,
    #[tabled(rename = "Description")]
    #[serde(rename = "Description")]
    description: String,
    #[tabled(rename = "Owner")]
    #[serde(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Due")]
    #[serde(rename = "Due")]
    due: String,
    #[tabled(rename = "Opportunity")]
    #[serde(rename = "Opportunity")]
    opportunity: String,
}

#[derive(Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Field")]
    #[serde(rename = "Field")]
    label: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

/// Generic row for listings without a dedicated entity (milestones, users,
/// history items): picks the given keys out of each record.
#[derive(Tabled, Serialize)]
struct RecordRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Summary")]
    #[serde(rename = "Summary")]
    summary: String,
}

// -- Row builders --

fn build_opportunity_rows(opportunities: &[Opportunity]) -> Vec<OpportunityRow> {
    opportunities
        .iter()
        .map(|o| OpportunityRow {
            id: o.id(),
            name: o.name().unwrap_or_default().to_string(),
            milestone: o
                .get("milestone")
                .map(text)
                .unwrap_or_else(|_| o.milestone_id().map(|m| m.to_string()).unwrap_or_default()),
            status: opportunity_status(o).to_string(),
            probability: o
                .probability()
                .map(|p| format!("{}%", p))
                .unwrap_or_default(),
            value: o.value().map(format_money).unwrap_or_default(),
            weighted: o.weighted_value().map(format_money).unwrap_or_default(),
            tags: o.tags().map(|t| t.join(", ")).unwrap_or_default(),
        })
        .collect()
}

fn opportunity_status(o: &Opportunity) -> &'static str {
    if o.open() {
        "open"
    } else if o.positive_outcome().unwrap_or(false) {
        "won"
    } else if o.negative_outcome().unwrap_or(false) {
        "lost"
    } else {
        "closed"
    }
}

fn build_party_rows(parties: &[Party]) -> Vec<PartyRow> {
    parties
        .iter()
        .map(|p| PartyRow {
            id: p.id(),
            kind: p.kind().to_string(),
            name: p.name().unwrap_or_default(),
            email: first_contact(p.emails().map(|e| e.iter().map(|e| e.to_string()).collect())),
            phone: first_contact(
                p.phone_numbers()
                    .map(|ps| ps.iter().map(|p| p.to_string()).collect()),
            ),
        })
        .collect()
}

fn first_contact(values: Result<Vec<String>, capsulecrm_lib::CapsuleError>) -> String {
    values
        .ok()
        .and_then(|v| v.into_iter().next())
        .unwrap_or_default()
}

fn build_task_rows(tasks: &[Task]) -> Vec<TaskRow> {
    tasks
        .iter()
        .map(|t| TaskRow {
            id: t.id(),
            description: t.description(),
            owner: t.owner(),
            due: t.get("dueDate").map(text).unwrap_or_default(),
            opportunity: t.opportunity_id().map(|id| id.to_string()).unwrap_or_default(),
        })
        .collect()
}

fn build_field_rows<E: CustomFieldHolder>(entity: &E) -> Vec<FieldRow> {
    let mut rows: Vec<FieldRow> = entity
        .customfields()
        .map(|fields| {
            fields
                .into_iter()
                .map(|(label, value)| FieldRow {
                    label,
                    value: format_field(&value),
                })
                .collect()
        })
        .unwrap_or_default();
    if let Ok(tags) = entity.datatags() {
        rows.extend(tags.iter().map(|(tag, date)| FieldRow {
            label: format!("{} (date)", tag),
            value: date.to_string(),
        }));
    }
    rows
}

fn build_record_rows(records: &[RawRecord], summary_keys: &[&str]) -> Vec<RecordRow> {
    records
        .iter()
        .map(|r| RecordRow {
            id: r.get("id").map(text).unwrap_or_default(),
            summary: summary_keys
                .iter()
                .filter_map(|key| r.get(*key).map(text))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" | "),
        })
        .collect()
}

// -- Rendering --

fn render<T: Tabled>(rows: Vec<T>, format: &OutputFormat) -> String {
    let mut table = Table::new(rows);
    if let OutputFormat::Markdown = format {
        table.with(Style::markdown());
    }
    table.to_string()
}

pub fn print_opportunities(opportunities: &[Opportunity], format: &OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&opportunities.iter().map(|o| o.record()).collect::<Vec<_>>()),
        _ => println!("{}", render(build_opportunity_rows(opportunities), format)),
    }
}

pub fn print_parties(parties: &[Party], format: &OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&parties.iter().map(|p| p.record()).collect::<Vec<_>>()),
        _ => println!("{}", render(build_party_rows(parties), format)),
    }
}

pub fn print_people(people: &[Person], format: &OutputFormat) {
    let parties: Vec<Party> = people.iter().cloned().map(Party::Person).collect();
    print_parties(&parties, format);
}

pub fn print_tasks(tasks: &[Task], format: &OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&tasks.iter().map(|t| t.record()).collect::<Vec<_>>()),
        _ => println!("{}", render(build_task_rows(tasks), format)),
    }
}

/// Custom fields and date tags of one entity. Nothing is printed in JSON
/// mode, where the entity's own record already carries them.
pub fn print_custom_fields<E: CustomFieldHolder>(entity: &E, format: &OutputFormat) {
    let rows = build_field_rows(entity);
    if rows.is_empty() || matches!(format, OutputFormat::Json) {
        return;
    }
    println!("{}", render(rows, format));
}

pub fn print_records(records: &[RawRecord], summary_keys: &[&str], format: &OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&records),
        _ => println!("{}", render(build_record_rows(records, summary_keys), format)),
    }
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn format_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Boolean(true) => "yes".to_string(),
        FieldValue::Boolean(false) => "no".to_string(),
        other => other.to_string(),
    }
}

fn format_money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}
