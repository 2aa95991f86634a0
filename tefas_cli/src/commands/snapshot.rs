use anyhow::Result;
use clap::Args;
use tefas_lib::FundDataService;

use crate::output::{print_funds_table, print_json, OutputFormat};

#[derive(Args)]
pub struct SnapshotArgs {
    /// Fund code, e.g. MAC
    pub code: String,
}

pub async fn run(
    args: &SnapshotArgs,
    service: &FundDataService,
    format: &OutputFormat,
) -> Result<()> {
    let snapshot = service.get_snapshot(&args.code).await?;
    match format {
        OutputFormat::Table => print_funds_table(std::slice::from_ref(&snapshot)),
        OutputFormat::Json => print_json(&snapshot)?,
    }
    Ok(())
}
