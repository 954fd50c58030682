//! mdstitch CLI: merge a tree of Markdown documents into one.
//!
//! The merged document goes to stdout (or `-o`); logs go to stderr.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
