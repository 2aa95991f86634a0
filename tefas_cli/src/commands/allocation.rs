use anyhow::Result;
use clap::Args;
use tefas_lib::FundDataService;

use crate::output::{print_allocation_table, print_json, OutputFormat};

#[derive(Args)]
pub struct AllocationArgs {
    /// Fund code, e.g. MAC
    pub code: String,
}

pub async fn run(
    args: &AllocationArgs,
    service: &FundDataService,
    format: &OutputFormat,
) -> Result<()> {
    let allocation = service.get_allocation(&args.code).await?;
    match format {
        OutputFormat::Table => print_allocation_table(&allocation),
        OutputFormat::Json => print_json(&allocation)?,
    }
    Ok(())
}
