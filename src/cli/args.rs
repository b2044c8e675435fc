//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Docforge document template tool CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the preview server with hot reload
    #[command(visible_alias = "d")]
    Dev {
        /// Documents directory containing template files
        #[arg(default_value = "documents", value_hint = clap::ValueHint::DirPath)]
        dir: PathBuf,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compile a single template to build artifacts
    #[command(visible_alias = "b")]
    Build {
        /// Template file to compile
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Build a template and assemble a publish bundle
    #[command(visible_alias = "p")]
    Publish {
        /// Template file to publish
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },
}

impl Cli {
    /// Port override for the dev server, if given.
    pub fn port(&self) -> Option<u16> {
        match &self.command {
            Commands::Dev { port, .. } => *port,
            _ => None,
        }
    }
}
