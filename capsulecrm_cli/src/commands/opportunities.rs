use anyhow::Result;
use capsulecrm_lib::{CapsuleClient, OpportunityQuery, Query};
use clap::Args;

use super::parse_date_arg;
use crate::output::{print_custom_fields, print_opportunities, print_tasks, OutputFormat};

#[derive(Args)]
pub struct OpportunitiesArgs {
    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,

    /// Filter by milestone name
    #[arg(long)]
    pub milestone: Option<String>,

    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Only opportunities modified since (YYYYMMDDTHHMMSS)
    #[arg(long)]
    pub since: Option<String>,

    /// Offset of the first result
    #[arg(long)]
    pub start: Option<u32>,

    /// Maximum number of results
    #[arg(long, default_value = "20")]
    pub limit: u32,

    /// Also load custom fields and tags (two extra requests per opportunity)
    #[arg(long)]
    pub full: bool,

    /// List opportunities of this party instead
    #[arg(long)]
    pub party: Option<u64>,
}

#[derive(Args)]
pub struct OpportunityArgs {
    /// Opportunity id
    pub id: u64,

    /// Also list the opportunity's tasks
    #[arg(long)]
    pub tasks: bool,
}

#[derive(Args)]
pub struct DatatagArgs {
    /// Opportunity id
    pub id: u64,

    /// Tag name
    pub name: String,

    /// Date to set (YYYY-MM-DD); today when omitted
    #[arg(long)]
    pub date: Option<String>,
}

pub async fn run(
    args: &OpportunitiesArgs,
    client: &CapsuleClient,
    format: &OutputFormat,
) -> Result<()> {
    if let Some(party_id) = args.party {
        let opportunities = client.opportunities_by_party(party_id).await?;
        print_opportunities(&opportunities, format);
        return Ok(());
    }

    let mut query = OpportunityQuery::default().with_limit(args.limit);
    if let Some(start) = args.start {
        query = query.with_start(start);
    }
    if let Some(ref search) = args.search {
        query = query.with_search(search);
    }
    if let Some(ref milestone) = args.milestone {
        query = query.with_milestone(milestone);
    }
    if let Some(ref tag) = args.tag {
        query = query.with_tag(tag);
    }
    if let Some(ref since) = args.since {
        query = query.with_last_modified(since);
    }

    let opportunities = if args.full {
        client.full_opportunities(&query).await?
    } else {
        client.opportunities(&query).await?
    };

    eprintln!("{} opportunities", opportunities.len());
    print_opportunities(&opportunities, format);
    Ok(())
}

pub async fn run_single(
    args: &OpportunityArgs,
    client: &CapsuleClient,
    format: &OutputFormat,
) -> Result<()> {
    let mut opportunity = client.full_opportunity(args.id).await?;
    if args.tasks {
        client.inject_opportunity_tasks(&mut opportunity).await?;
    }

    print_opportunities(std::slice::from_ref(&opportunity), format);
    print_custom_fields(&opportunity, format);
    if args.tasks && !matches!(format, OutputFormat::Json) {
        print_tasks(&opportunity.tasks()?, format);
    }
    Ok(())
}

pub async fn run_datatag(args: &DatatagArgs, client: &CapsuleClient) -> Result<()> {
    let date = args.date.as_deref().map(parse_date_arg).transpose()?;
    client.put_datatag(args.id, &args.name, date).await?;
    eprintln!("Set date tag '{}' on opportunity {}", args.name, args.id);
    Ok(())
}
