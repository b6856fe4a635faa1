use anyhow::{bail, Result};
use capsulecrm_lib::types::NewHistoryItem;
use capsulecrm_lib::CapsuleClient;
use clap::Args;

use crate::output::{print_records, OutputFormat};

#[derive(Args)]
pub struct HistoryArgs {
    /// History of this opportunity
    #[arg(long, conflicts_with = "party")]
    pub opportunity: Option<u64>,

    /// History of this party
    #[arg(long)]
    pub party: Option<u64>,

    /// Add a note instead of listing (opportunities only)
    #[arg(long)]
    pub add: Option<String>,

    /// Subject for the added note
    #[arg(long, requires = "add")]
    pub subject: Option<String>,
}

pub async fn run(args: &HistoryArgs, client: &CapsuleClient, format: &OutputFormat) -> Result<()> {
    if let Some(ref note) = args.add {
        let Some(opportunity_id) = args.opportunity else {
            bail!("--add requires --opportunity");
        };
        let mut item = NewHistoryItem::new(note);
        item.subject = args.subject.clone();
        let id = client.post_opportunity_history(opportunity_id, &item).await?;
        eprintln!("Added history item {} to opportunity {}", id, opportunity_id);
        return Ok(());
    }

    let items = match (args.opportunity, args.party) {
        (Some(id), _) => client.opportunity_history(id).await?,
        (None, Some(id)) => client.party_history(id).await?,
        (None, None) => bail!("one of --opportunity or --party is required"),
    };
    print_records(&items, &["entryDate", "subject", "note"], format);
    Ok(())
}
