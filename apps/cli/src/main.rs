//! Templatesmith CLI: bulk template download and local template editing.
//!
//! `fetch` mirrors the published template catalog into a directory; `edit`
//! rewrites one local template from a plain-language instruction.

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
