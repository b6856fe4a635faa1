mod commands;
mod output;

use anyhow::Result;
use capsulecrm_lib::{CapsuleClient, CapsuleConfig};
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "capsulecrm")]
#[command(about = "Query and update a Capsule CRM account")]
struct Cli {
    /// Output format: table, json or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List opportunities
    Opportunities(commands::opportunities::OpportunitiesArgs),
    /// Show one opportunity with its custom fields and tags
    Opportunity(commands::opportunities::OpportunityArgs),
    /// Set a date tag on an opportunity
    Datatag(commands::opportunities::DatatagArgs),
    /// List people and organisations
    Parties(commands::parties::PartiesArgs),
    /// Show one party with its custom fields
    Party(commands::parties::PartyArgs),
    /// List the people of an organisation
    People(commands::parties::PeopleArgs),
    /// List tasks
    Tasks(commands::tasks::TasksArgs),
    /// Mark a task as completed
    CompleteTask(commands::tasks::CompleteTaskArgs),
    /// List or add history notes
    History(commands::history::HistoryArgs),
    /// List opportunity milestones
    Milestones,
    /// List account users
    Users,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("capsulecrm=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    let config = CapsuleConfig::from_env()?;
    let client = CapsuleClient::from_config(&config)?;

    match &cli.command {
        Commands::Opportunities(args) => commands::opportunities::run(args, &client, &format).await?,
        Commands::Opportunity(args) => {
            commands::opportunities::run_single(args, &client, &format).await?
        }
        Commands::Datatag(args) => commands::opportunities::run_datatag(args, &client).await?,
        Commands::Parties(args) => commands::parties::run(args, &client, &format).await?,
        Commands::Party(args) => commands::parties::run_single(args, &client, &format).await?,
        Commands::People(args) => commands::parties::run_people(args, &client, &format).await?,
        Commands::Tasks(args) => commands::tasks::run(args, &client, &format).await?,
        Commands::CompleteTask(args) => commands::tasks::run_complete(args, &client).await?,
        Commands::History(args) => commands::history::run(args, &client, &format).await?,
        Commands::Milestones => commands::account::run_milestones(&client, &format).await?,
        Commands::Users => commands::account::run_users(&client, &format).await?,
    }

    Ok(())
}
