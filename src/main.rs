//! folio - keeps a compiled HTML mirror and a search index in sync with a
//! live tree of notes.

mod build;
mod cli;
mod config;
mod core;
mod error;
mod index;
mod link;
mod logger;
mod path;
mod sync;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::NotesConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = NotesConfig::load(&cli)?;

    match &cli.command {
        Commands::Build => cli::build::build_all(&config),
        Commands::Watch { reset_index } => cli::watch::watch(&config, *reset_index),
        Commands::Reconcile => cli::build::reconcile(&config),
        Commands::Search { args } => cli::search::search(&config, args),
        Commands::Show { path, json } => cli::search::show(&config, path, *json),
    }
}
