mod commands;
mod pool;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "autocart")]
#[command(about = "Concurrent checkout runner for Shopify-style storefronts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every task in the task file, or a single one
    Run {
        /// Only run the task with this id
        #[arg(long)]
        task: Option<String>,
    },
    /// Validate the task file and resolve every task's store without network access
    Check,
    /// Print the store registry in use
    Stores,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = autocart_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command.unwrap_or(Commands::Run { task: None }) {
        Commands::Run { task } => {
            let summary = commands::run(&config, task.as_deref()).await?;
            if summary.failed > 0 {
                anyhow::bail!("{} of {} tasks failed", summary.failed, summary.total());
            }
        }
        Commands::Check => commands::check(&config)?,
        Commands::Stores => commands::stores(&config)?,
    }

    Ok(())
}
