use anyhow::Result;
use capsulecrm_lib::{CapsuleClient, PartyQuery, Query};
use clap::Args;

use crate::output::{print_custom_fields, print_parties, print_people, OutputFormat};

#[derive(Args)]
pub struct PartiesArgs {
    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,

    /// Filter by email address
    #[arg(long)]
    pub email: Option<String>,

    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Offset of the first result
    #[arg(long)]
    pub start: Option<u32>,

    /// Maximum number of results
    #[arg(long, default_value = "20")]
    pub limit: u32,

    /// Also load custom fields (one extra request per party)
    #[arg(long)]
    pub full: bool,

    /// List parties attached to this opportunity instead
    #[arg(long)]
    pub opportunity: Option<u64>,
}

#[derive(Args)]
pub struct PartyArgs {
    /// Party id
    pub id: u64,
}

#[derive(Args)]
pub struct PeopleArgs {
    /// Organisation id
    pub id: u64,

    /// Also load custom fields for each person
    #[arg(long)]
    pub full: bool,
}

pub async fn run(args: &PartiesArgs, client: &CapsuleClient, format: &OutputFormat) -> Result<()> {
    let parties = match args.opportunity {
        Some(id) if args.full => client.full_parties_from_opportunity(id).await?,
        Some(id) => client.parties_from_opportunity(id).await?,
        None => {
            let mut query = PartyQuery::default().with_limit(args.limit);
            if let Some(start) = args.start {
                query = query.with_start(start);
            }
            if let Some(ref search) = args.search {
                query = query.with_search(search);
            }
            if let Some(ref email) = args.email {
                query = query.with_email(email);
            }
            if let Some(ref tag) = args.tag {
                query = query.with_tag(tag);
            }
            if args.full {
                client.full_parties(&query).await?
            } else {
                client.parties(&query).await?
            }
        }
    };

    eprintln!(
        "{} people, {} organisations",
        parties.people.len(),
        parties.organisations.len()
    );
    print_parties(&parties.into_parties(), format);
    Ok(())
}

pub async fn run_single(args: &PartyArgs, client: &CapsuleClient, format: &OutputFormat) -> Result<()> {
    let party = client.full_party(args.id).await?;
    print_parties(std::slice::from_ref(&party), format);
    print_custom_fields(&party, format);
    Ok(())
}

pub async fn run_people(args: &PeopleArgs, client: &CapsuleClient, format: &OutputFormat) -> Result<()> {
    let people = if args.full {
        client.full_people(args.id).await?
    } else {
        client.people(args.id).await?
    };
    print_people(&people, format);
    Ok(())
}
