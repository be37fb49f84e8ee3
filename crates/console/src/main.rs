//! console - offline companion to the deployment console
//!
//! Renders ANSI-colored stage logs and converts RBAC policy text to and
//! from the JSON the backend stores.

mod cli;
mod commands;
mod config;
mod output;
mod runtime;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = runtime::boot::boot(cli.config.as_deref())?;

    let out = commands::run(&cli.command, &config)?;
    println!("{}", out);
    Ok(())
}
