mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "tefas")]
#[command(about = "Query Turkish mutual-fund data from the TEFAS portal")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Cache whole-universe queries for this many seconds (0 disables)
    #[arg(long, default_value = "300", global = true)]
    cache_ttl: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every fund the portal knows
    Funds(commands::funds::FundsArgs),
    /// Current snapshot for one fund
    Snapshot(commands::snapshot::SnapshotArgs),
    /// Unit-price history for one fund
    History(commands::history::HistoryArgs),
    /// Portfolio asset-class breakdown for one fund
    Allocation(commands::allocation::AllocationArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tefas=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    let mut service = tefas_lib::FundDataService::new()?;
    if cli.cache_ttl > 0 {
        service = service.with_cache(std::time::Duration::from_secs(cli.cache_ttl));
    }

    let result = match &cli.command {
        Commands::Funds(args) => commands::funds::run(args, &service, &format).await,
        Commands::Snapshot(args) => commands::snapshot::run(args, &service, &format).await,
        Commands::History(args) => commands::history::run(args, &service, &format).await,
        Commands::Allocation(args) => commands::allocation::run(args, &service, &format).await,
    };

    if let Err(e) = result {
        // Upstream endpoint names and payload details stay in the
        // logs; the terminal gets the generic message.
        match e.downcast_ref::<tefas_lib::TefasError>() {
            Some(tefas_lib::TefasError::NotFound { code }) => {
                eprintln!("fund not found: {code}");
            }
            Some(tefas_lib::TefasError::InvalidInput(msg)) => {
                eprintln!("invalid input: {msg}");
            }
            Some(tefas_lib::TefasError::Api(api)) => {
                tracing::error!(error = %api, attempts = %api.attempt_report(), "data acquisition failed");
                eprintln!("fund data is temporarily unavailable, try again later");
            }
            Some(other) => {
                tracing::error!(error = %other, "data acquisition failed");
                eprintln!("fund data is temporarily unavailable, try again later");
            }
            None => return Err(e),
        }
        std::process::exit(1);
    }

    Ok(())
}
