use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::OutputFormat;

/// console - render deployment logs and edit RBAC policies offline
#[derive(Parser, Debug)]
#[command(name = "console")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Extra configuration file, layered over the default locations
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deployment log rendering
    #[command(subcommand)]
    Log(LogCommands),

    /// RBAC policy text
    #[command(subcommand)]
    Rbac(RbacCommands),

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// Parse a raw ANSI log into styled lines
    Render {
        /// Log file; reads stdin when omitted
        path: Option<PathBuf>,

        /// Output format (defaults to render.format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Render a JSON array of log blocks as one stream
    Blocks {
        /// JSON file holding the blocks
        path: PathBuf,

        /// Output format (defaults to render.format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RbacCommands {
    /// Policy text to JSON policies
    Parse {
        /// Policy text file; reads stdin when omitted
        path: Option<PathBuf>,
    },

    /// JSON policies to policy text
    Format {
        /// JSON file; reads stdin when omitted
        path: Option<PathBuf>,
    },

    /// Parse policy text and fail on unknown resource types or actions
    Check {
        /// Policy text file; reads stdin when omitted
        path: Option<PathBuf>,
    },
}
