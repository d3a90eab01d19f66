//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Keep a compiled HTML mirror and a search index in sync with a notes tree
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Notes root directory (default: [notes] root, else the config's directory)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Config file path (default: folio.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Rebuild the compiled tree and the search index from scratch
    #[command(visible_alias = "b")]
    Build,

    /// Bring both views up to date, then follow filesystem changes
    #[command(visible_alias = "w")]
    Watch {
        /// Recreate the search index instead of reconciling it on startup
        #[arg(long)]
        reset_index: bool,
    },

    /// Compare the search index against the notes tree and fix differences
    Reconcile,

    /// Full-text search over indexed notes
    #[command(visible_alias = "s")]
    Search {
        #[command(flatten)]
        args: SearchArgs,
    },

    /// Print the indexed document stored for a note
    Show {
        /// Note path (absolute, or relative to the notes root)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Search command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Query string (title and content are searched)
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Maximum number of hits
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    pub fn query_string(&self) -> String {
        self.query.join(" ")
    }
}
