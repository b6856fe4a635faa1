use anyhow::Result;
use capsulecrm_lib::CapsuleClient;

use crate::output::{print_records, OutputFormat};

pub async fn run_milestones(client: &CapsuleClient, format: &OutputFormat) -> Result<()> {
    let milestones = client.milestones().await?;
    print_records(&milestones, &["name", "probability", "description"], format);
    Ok(())
}

pub async fn run_users(client: &CapsuleClient, format: &OutputFormat) -> Result<()> {
    let users = client.users().await?;
    print_records(&users, &["username", "name", "currency", "timezone"], format);
    Ok(())
}
