//! Command-line shell over the TaskNest core.
//!
//! # Responsibility
//! - Drive task-store and session operations against a SQLite-backed
//!   key-value store, for local inspection and scripting.
//! - Keep output plain and line-oriented.

use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tasknest_core::session::format_countdown;
use tasknest_core::{
    init_logging, CoreConfig, Countdown, KeyValueStore, KvTaskListRepository, SessionManager,
    SessionStatus, SqliteKeyValueStore, SystemClock, TaskStore,
};

const DB_PATH_ENV: &str = "TASKNEST_DB_PATH";
const DEFAULT_DB_FILE_NAME: &str = "tasknest.sqlite3";
const DEFAULT_SCOPE: &str = "local";

#[derive(Parser)]
#[command(name = "tasknest", version, about = "Local task lists with session tracking")]
struct Cli {
    /// Database file; defaults to $TASKNEST_DB_PATH, then the temp directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Storage scope, the equivalent of a browser origin.
    #[arg(long, global = true, default_value = DEFAULT_SCOPE)]
    scope: String,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Health check.
    Ping,
    /// Print the core version.
    Version,
    /// List all task lists.
    Lists,
    /// Show tasks of a list, pending first.
    Show {
        #[arg(long)]
        list: Option<String>,
    },
    /// Create a task list.
    AddList { name: String },
    /// Delete a task list (the last list is kept).
    DeleteList { list: String },
    /// Append a task.
    AddTask {
        title: String,
        #[arg(long)]
        list: Option<String>,
    },
    /// Flip a task's completion.
    Toggle {
        task: String,
        #[arg(long)]
        list: Option<String>,
    },
    /// Delete a task.
    DeleteTask {
        task: String,
        #[arg(long)]
        list: Option<String>,
    },
    /// Inspect or clear the stored session.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    Status,
    Clear,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(tasknest_core::default_log_level(), log_dir)?;
    }

    match cli.command {
        Command::Ping => {
            println!("tasknest_core ping={}", tasknest_core::ping());
            return Ok(());
        }
        Command::Version => {
            println!("tasknest_core version={}", tasknest_core::core_version());
            return Ok(());
        }
        _ => {}
    }

    let db_path = resolve_db_path(cli.db);
    info!("event=cli_open module=cli status=ok scope={}", cli.scope);
    let storage: Arc<dyn KeyValueStore> =
        Arc::new(SqliteKeyValueStore::open(&db_path, cli.scope)?);
    let clock = Arc::new(SystemClock);

    if let Command::Session { action } = cli.command {
        let config = CoreConfig::from_env()?;
        let session = SessionManager::new(storage, clock, &config);
        return run_session(&session, &action, &config);
    }

    let repo = KvTaskListRepository::new(storage);
    let mut store = TaskStore::load(repo, clock)?;
    run_tasks(&mut store, cli.command)
}

fn run_tasks(
    store: &mut TaskStore<KvTaskListRepository>,
    command: Command,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Lists => {
            for list in store.lists() {
                println!("{}\t{}\t{}", list.id, list.name, list.summary());
            }
        }
        Command::Show { list } => {
            let list_id = resolve_list(store, list);
            let Some(list) = store.list(&list_id) else {
                return Err(format!("unknown list `{list_id}`").into());
            };
            println!("{} ({})", list.name, list.summary());
            for task in list.display_order() {
                let mark = if task.completed { "x" } else { " " };
                println!("[{mark}] {}\t{}", task.id, task.title);
            }
        }
        Command::AddList { name } => match store.add_list(&name)? {
            Some(list_id) => println!("{list_id}"),
            None => return Err("list name must not be blank".into()),
        },
        Command::DeleteList { list } => {
            if !store.delete_list(&list)? {
                return Err(format!("list `{list}` was not deleted").into());
            }
        }
        Command::AddTask { title, list } => {
            let list_id = resolve_list(store, list);
            match store.add_task(&list_id, &title)? {
                Some(task_id) => println!("{task_id}"),
                None => return Err("task title must not be blank".into()),
            }
        }
        Command::Toggle { task, list } => {
            let list_id = resolve_list(store, list);
            if !store.toggle_task(&list_id, &task)? {
                return Err(format!("task `{task}` not found").into());
            }
        }
        Command::DeleteTask { task, list } => {
            let list_id = resolve_list(store, list);
            if !store.delete_task(&list_id, &task)? {
                return Err(format!("task `{task}` not found").into());
            }
        }
        Command::Ping | Command::Version | Command::Session { .. } => {}
    }
    Ok(())
}

fn run_session(
    session: &SessionManager,
    action: &SessionAction,
    config: &CoreConfig,
) -> Result<(), Box<dyn Error>> {
    match action {
        SessionAction::Status => match session.validate() {
            SessionStatus::Valid(record) => {
                let remaining = record.remaining_secs_at(session.now_ms());
                let countdown = Countdown::new(remaining, config.expiry_warning);
                let flag = if countdown.warning { " (expiring soon)" } else { "" };
                println!(
                    "active, expires in {}{flag}",
                    format_countdown(countdown.remaining_secs)
                );
            }
            SessionStatus::Invalid => println!("no active session"),
        },
        SessionAction::Clear => {
            session.destroy()?;
            println!("session cleared");
        }
    }
    Ok(())
}

fn resolve_list(store: &TaskStore<KvTaskListRepository>, list: Option<String>) -> String {
    list.or_else(|| store.selected_list_id().map(str::to_string))
        .unwrap_or_default()
}

fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Ok(raw) = std::env::var(DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}
