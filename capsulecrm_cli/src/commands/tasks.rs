use anyhow::Result;
use capsulecrm_lib::{CapsuleClient, Query, TaskQuery};
use clap::Args;

use crate::output::{print_tasks, OutputFormat};

#[derive(Args)]
pub struct TasksArgs {
    /// Filter by task category
    #[arg(long)]
    pub category: Option<String>,

    /// Filter by owner user name
    #[arg(long)]
    pub user: Option<String>,

    /// Offset of the first result
    #[arg(long)]
    pub start: Option<u32>,

    /// Maximum number of results
    #[arg(long, default_value = "20")]
    pub limit: u32,

    /// Tasks of this opportunity instead
    #[arg(long)]
    pub opportunity: Option<u64>,
}

#[derive(Args)]
pub struct CompleteTaskArgs {
    /// Task id
    pub id: u64,
}

pub async fn run(args: &TasksArgs, client: &CapsuleClient, format: &OutputFormat) -> Result<()> {
    let tasks = match args.opportunity {
        Some(id) => client.opportunity_tasks(id).await?,
        None => {
            let mut query = TaskQuery::default().with_limit(args.limit);
            if let Some(start) = args.start {
                query = query.with_start(start);
            }
            if let Some(ref category) = args.category {
                query = query.with_category(category);
            }
            if let Some(ref user) = args.user {
                query = query.with_user(user);
            }
            client.tasks(&query).await?
        }
    };
    print_tasks(&tasks, format);
    Ok(())
}

pub async fn run_complete(args: &CompleteTaskArgs, client: &CapsuleClient) -> Result<()> {
    client.complete_task(args.id).await?;
    eprintln!("Completed task {}", args.id);
    Ok(())
}
