use anyhow::Result;
use clap::Parser;

mod agents;
mod cache;
mod cli;
mod config;
mod llm;
mod mcp;
mod orchestrator;
mod types;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    cli::run(args).await
}
