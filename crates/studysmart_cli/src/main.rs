//! Command-line probe for `studysmart_core`.
//!
//! # Responsibility
//! - Verify core linkage without the Flutter/FFI runtime.
//! - Print a dashboard summary of a store file, optionally seeding it first.
//! - Drive the timer service against a console notification sink.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use studysmart_core::fixtures::seed_sample_data;
use studysmart_core::timer::{
    NotificationChannel, NotificationSink, StatusNotification, StudySessionTimerService,
    TimerServiceError,
};
use studysmart_core::{seconds_to_hours, AppContainer, CoreConfig, Session, Subject, Task};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "studysmart", version, about = "StudySmart core CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print ping and core version
    Ping,
    /// Print dashboard totals and lists as JSON
    Dashboard {
        /// Store file; defaults to STUDYSMART_DB_PATH or a temp file
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Insert the sample subjects, tasks and sessions
    Seed {
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Send host actions to the foreground timer service
    Timer {
        /// e.g. ACTION_SERVICE_START
        actions: Vec<String>,
    },
}

#[derive(Serialize)]
struct DashboardSummary {
    total_subject_count: i64,
    total_goal_study_hours: f32,
    total_studied_hours: f32,
    subjects: Vec<Subject>,
    upcoming_tasks: Vec<Task>,
    recent_sessions: Vec<Session>,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Commands::Ping) {
        Commands::Ping => {
            println!("studysmart_core ping={}", studysmart_core::ping());
            println!("studysmart_core version={}", studysmart_core::core_version());
            Ok(())
        }
        Commands::Dashboard { db } => open(db).and_then(|app| print_dashboard(&app)),
        Commands::Seed { db } => open(db).and_then(|app| seed(&app)),
        Commands::Timer { actions } => run_timer(&actions),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn open(db: Option<PathBuf>) -> CliResult<AppContainer> {
    let mut config = CoreConfig::from_env()?;
    if let Some(path) = db {
        config.db_path = path;
    }
    config.init_logging()?;
    Ok(AppContainer::open(&config)?)
}

fn print_dashboard(app: &AppContainer) -> CliResult<()> {
    let summary = DashboardSummary {
        total_subject_count: app.subjects().total_subject_count().current()?,
        total_goal_study_hours: app.subjects().total_goal_hours().current()?,
        total_studied_hours: seconds_to_hours(app.sessions().total_sessions_duration().current()?),
        subjects: app.subjects().all_subjects().current()?,
        upcoming_tasks: app.tasks().all_upcoming_tasks().current()?,
        recent_sessions: app.sessions().recent_five_sessions().current()?,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn seed(app: &AppContainer) -> CliResult<()> {
    let subjects = app.subjects();
    let tasks = app.tasks();
    let sessions = app.sessions();
    seed_sample_data(subjects.as_ref(), tasks.as_ref(), sessions.as_ref())?;
    println!("seeded subjects={}", subjects.total_subject_count().current()?);
    Ok(())
}

/// Prints what a mobile host would post to its notification tray.
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn create_channel(&mut self, channel: &NotificationChannel) -> Result<(), TimerServiceError> {
        println!("channel id={} name={:?}", channel.id, channel.name);
        Ok(())
    }

    fn start_foreground(
        &mut self,
        notification: &StatusNotification,
    ) -> Result<(), TimerServiceError> {
        println!(
            "foreground id={} title={:?} text={} link={}",
            notification.id, notification.title, notification.text, notification.deep_link
        );
        Ok(())
    }
}

fn run_timer(actions: &[String]) -> CliResult<()> {
    let mut service = StudySessionTimerService::new(ConsoleSink);
    for action in actions {
        let outcome = service.handle_action(action)?;
        println!("{action} -> {outcome:?} state={:?}", service.state());
    }
    Ok(())
}
