mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let workspace = cli.workspace_root()?;

    match cli.command {
        Commands::Init => commands::init::run(&workspace),
        Commands::Status => commands::status::run(&workspace),
        Commands::Intents => commands::intents::run(&workspace),
        Commands::Trace { limit } => commands::trace::run(&workspace, limit),
        Commands::Lessons { category, search } => {
            commands::lessons::run(&workspace, category.as_deref(), search.as_deref())
        }
        Commands::RecordLesson { category, lesson } => {
            commands::record_lesson::run(&workspace, &category, &lesson)
        }
        Commands::SelectIntent { intent_id } => {
            commands::select_intent::run(&workspace, &intent_id)
        }
        Commands::Version => commands::version::run(),
    }
}
