use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fingerprint JSX elements and map them to a structural UI graph.
///
/// jsx-graph tags every element of a React project with a stable marker
/// attribute, builds a graph of functions and elements from the source, and
/// turns a selected element into a context bundle. Change plans written
/// against that bundle are applied back to the files with `apply`.
#[derive(Parser, Debug)]
#[command(
    name = "jsx-graph",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add marker attributes to every element that does not carry one.
    Inject {
        /// Path to the project root.
        path: PathBuf,

        /// Output the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Remove every marker attribute and reformat the touched files.
    Strip {
        /// Path to the project root.
        path: PathBuf,

        /// Output the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Build the graph and fingerprint index and write them to the output directory.
    Build {
        /// Path to the project root.
        path: PathBuf,

        /// Output the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Strip, re-inject, and rebuild in one pass.
    Refresh {
        /// Path to the project root.
        path: PathBuf,

        /// Output the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the context bundle for an element id from the saved graph.
    Context {
        /// Path to the project root.
        path: PathBuf,

        /// Element fingerprint.
        id: String,

        /// What the user wants to change.
        #[arg(long)]
        intent: String,
    },

    /// Print the saved source location of an element id as JSON.
    Lookup {
        /// Path to the project root.
        path: PathBuf,

        /// Element fingerprint.
        id: String,
    },

    /// Print the saved graph as an adjacency listing.
    Show {
        /// Path to the project root.
        path: PathBuf,
    },

    /// Apply a change plan; `file` entries resolve against the project root.
    Apply {
        /// Path to the project root.
        path: PathBuf,

        /// JSON plan file: `{"plan": [{"file", "action", "reason", "changes": [{"old", "new"}]}]}`.
        plan: PathBuf,

        /// Only report what would be changed.
        #[arg(long)]
        dry_run: bool,

        /// Output the report as JSON.
        #[arg(long)]
        json: bool,
    },
}
