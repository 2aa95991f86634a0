use anyhow::Result;
use clap::Args;
use tefas_lib::FundDataService;

use crate::output::{print_funds_table, print_json, OutputFormat};

#[derive(Args)]
pub struct FundsArgs {
    /// Only funds whose category contains this text (case-insensitive)
    #[arg(long)]
    pub category: Option<String>,

    /// Limit the number of rows
    #[arg(long)]
    pub limit: Option<usize>,
}

pub async fn run(args: &FundsArgs, service: &FundDataService, format: &OutputFormat) -> Result<()> {
    let mut funds = service.list_all_funds().await?;

    if let Some(category) = &args.category {
        let needle = category.to_lowercase();
        funds.retain(|f| {
            f.category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
        });
    }
    if let Some(limit) = args.limit {
        funds.truncate(limit);
    }

    match format {
        OutputFormat::Table => print_funds_table(&funds),
        OutputFormat::Json => print_json(&funds)?,
    }
    Ok(())
}
