//! CLI binary for roster-tasks.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use roster_tasks::commands;
use roster_tasks::config::Config;
use roster_tasks::domain::Character;
use roster_tasks::AppState;

/// Recurring task tracker for character rosters.
#[derive(Parser)]
#[command(name = "roster-tasks", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// User the command acts for.
    #[arg(short, long, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge the task catalog into the user's tasks and write the result.
    Reconcile,

    /// Show every enabled task with each character's progress.
    Status,

    /// Add or update a roster character.
    Character {
        name: String,
        ilvl: u32,
        /// Grant the lazy-tracking grace window.
        #[arg(long)]
        lazy: bool,
        /// Hide the character from friends.
        #[arg(long)]
        private: bool,
    },

    /// Record progress; increments by one unless an amount is given.
    Complete {
        character: String,
        /// Task key or label.
        task: String,
        amount: Option<u32>,
    },

    /// Print custom tasks as JSON, or write them to a file.
    Export {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Import custom tasks from a JSON file.
    Import { file: PathBuf },

    /// Show which friends can still help with shared tasks.
    Planner {
        /// Friend user ids.
        friends: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) if path.exists() => Config::from_file(path)?,
        _ => Config::default(),
    };

    match &config.logging.dir {
        Some(dir) => rolling_logger::init_logger(dir.clone(), &config.logging.app_name),
        None => rolling_logger::init_stderr_logger(),
    }
    .map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    let state = AppState::open(&config).await?;
    let result = run(&state, &cli.user, cli.command).await;

    // Pending reconciliation writes go out even when the command failed
    let flushed = state.service.flush().await;
    result?;
    flushed?;
    Ok(())
}

async fn run(state: &AppState, user: &str, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Reconcile => {
            let rec = commands::reconcile_tasks(state, user).await?;
            let report = state.service.flush().await?;
            println!(
                "{} tasks ({} created, {} updated)",
                rec.result.len(),
                report.created,
                report.updated
            );
        }
        Command::Status => {
            for row in commands::checklist(state, user).await? {
                let progress: Vec<String> = row
                    .characters
                    .iter()
                    .map(|c| match c.status.progress() {
                        Some(done) => format!("{} {}/{}", c.character, done, row.task.amount),
                        None => format!("{} -", c.character),
                    })
                    .collect();
                println!("[{}] {:<24} {}", row.task.frequency.as_str(), row.task.label, progress.join("  "));
            }
        }
        Command::Character { name, ilvl, lazy, private } => {
            let mut character = Character::new(name, ilvl);
            character.lazy = lazy;
            character.is_private = private;
            let roster = commands::upsert_character(state, user, character).await?;
            println!("{} characters", roster.characters.len());
        }
        Command::Complete { character, task, amount } => {
            let tasks = commands::list_tasks(state, user).await?;
            state.service.flush().await?;
            let key = tasks
                .iter()
                .find(|t| t.key == task || t.label == task)
                .map(|t| t.key.clone())
                .ok_or_else(|| anyhow!("no task named {}", task))?;
            let record = match amount {
                Some(amount) => commands::set_completion(state, user, &character, &key, amount).await?,
                None => commands::increment_completion(state, user, &character, &key).await?,
            };
            println!("{} {}: {}", character, task, record.amount);
        }
        Command::Export { out } => {
            let json = commands::export_tasks(state, user).await?;
            match out {
                Some(path) => std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?,
                None => println!("{}", json),
            }
        }
        Command::Import { file } => {
            let payload = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let count = commands::import_tasks(state, user, &payload).await?;
            println!("imported {} tasks", count);
        }
        Command::Planner { friends } => {
            let board = commands::party_planner(state, user, &friends).await?;
            println!("{}", serde_json::to_string_pretty(&board)?);
        }
    }
    Ok(())
}
