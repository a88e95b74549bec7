//! prgen CLI: pull request descriptions, commit messages, reviews and
//! branch names from your git history, written by the LLM of your choice.

mod clipboard;
mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
