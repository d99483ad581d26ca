use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "warden")]
#[command(version)]
#[command(about = "Write arbitration and traceability for parallel AI agents")]
pub struct Cli {
    /// Workspace root (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn workspace_root(&self) -> anyhow::Result<PathBuf> {
        match &self.workspace {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialise the .orchestration directory for this workspace
    Init,

    /// Show orchestration state counts
    Status,

    /// List declared intents and their owned scopes
    Intents,

    /// Print recent trace ledger entries
    Trace {
        /// How many entries to show, newest last
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// List recorded lessons
    Lessons {
        /// Only lessons in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Space-separated keywords to rank lessons by
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Record a lesson in the shared knowledge file
    RecordLesson {
        /// One of ARCHITECTURE, TESTING, LINTER, BUILD, USER_FEEDBACK,
        /// STYLE, PERFORMANCE, SECURITY, GENERAL
        category: String,

        /// The lesson body (markdown)
        lesson: String,
    },

    /// Select the active intent for subsequent write calls
    SelectIntent {
        /// Intent id declared in active_intents.yaml
        intent_id: String,
    },

    /// Print version information
    Version,
}
