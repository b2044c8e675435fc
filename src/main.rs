//! docforge - a live-preview build tool for TSX document templates.

#![allow(dead_code)]

mod actor;
mod cli;
mod compiler;
mod config;
mod embed;
mod graph;
mod logger;
mod reload;
mod render;
mod sandbox;
mod server;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Dev { dir, .. } => cli::dev::run(&cli, dir),
        Commands::Build { file } => cli::build::run(&cli, file),
        Commands::Publish { file } => cli::publish::run(&cli, file),
    }
}
