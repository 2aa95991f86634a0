use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Args;
use tefas_lib::FundDataService;

use crate::output::{print_history_table, print_json, OutputFormat};

#[derive(Args)]
pub struct HistoryArgs {
    /// Fund code, e.g. MAC
    pub code: String,

    /// Range start, DD.MM.YYYY or YYYY-MM-DD. Defaults to 30 days ago.
    #[arg(long)]
    pub from: Option<String>,

    /// Range end. Defaults to today.
    #[arg(long)]
    pub to: Option<String>,
}

pub async fn run(
    args: &HistoryArgs,
    service: &FundDataService,
    format: &OutputFormat,
) -> Result<()> {
    let today = Utc::now().date_naive();
    let from = match &args.from {
        Some(s) => tefas_lib::parse_date(s)?,
        None => today - Duration::days(30),
    };
    let to = match &args.to {
        Some(s) => tefas_lib::parse_date(s)?,
        None => today,
    };

    let points = service.get_history(&args.code, from, to).await?;
    if points.is_empty() {
        // Market holiday or a range with no published prices.
        eprintln!("no data points in the requested range");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_history_table(&points),
        OutputFormat::Json => print_json(&points)?,
    }
    Ok(())
}
