mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting DoraLens - DORA metrics for GitHub repositories");
    cli.execute().await?;

    Ok(())
}
