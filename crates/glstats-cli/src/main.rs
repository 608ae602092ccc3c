mod commands;

use anyhow::Result;
use chrono::{Local, Offset};
use clap::{Parser, Subcommand, ValueEnum};
use glstats_core::{config::get_data_dir, Config, StatsError};
use glstats_storage::default_db_path;
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{AppContext, SubjectArgs};

/// Exit status when there is nothing to report for the requested subject
const EXIT_NOT_FOUND: u8 = 2;

#[derive(Parser)]
#[command(name = "gitlab-stats", version)]
#[command(about = "Collect GitLab issue statistics and chart them month by month")]
#[command(long_about = None)]
struct Cli {
    /// SQLite database file (default: ~/.gitlab-stats/db.sqlite3)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Use a flat JSON file as snapshot store instead of SQLite
    #[arg(long, global = true, value_name = "FILE")]
    json_store: Option<PathBuf>,

    /// Log level
    #[arg(short = 'd', long, value_enum, default_value_t = LogLevel::Error, global = true)]
    debug_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch current issue counters from GitLab and record a snapshot
    Collect {
        #[command(flatten)]
        subject: SubjectArgs,
    },
    /// Write monthly chart data to a file
    Graph {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        subject: SubjectArgs,
        /// Number of complete past months to include
        #[arg(short, long)]
        months: Option<u32>,
        /// Chart raw opened counters instead of period metrics
        #[arg(long)]
        basic: bool,
        /// Write the chart data as JSON instead of a PNG image
        #[arg(long)]
        json: bool,
    },
    /// Print monthly period metrics as a table
    Show {
        #[command(flatten)]
        subject: SubjectArgs,
        /// Number of complete past months to include
        #[arg(short, long)]
        months: Option<u32>,
    },
    /// List subjects with recorded snapshots
    Subjects,
    /// Import a legacy JSON database into SQLite
    ImportJson {
        /// Legacy file (default: db.json next to the database)
        file: Option<PathBuf>,
    },
    /// Record random snapshots for the last months (development aid)
    Seed {
        #[command(flatten)]
        subject: SubjectArgs,
        /// Number of complete past months to fill
        #[arg(short, long)]
        months: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.debug_level.as_filter()),
    )
    .format_timestamp_secs()
    .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Process exit status for a failed run
fn exit_status(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<StatsError>().is_some_and(StatsError::is_not_found) {
        EXIT_NOT_FOUND
    } else {
        1
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&get_data_dir()?)?;
    let ctx = AppContext {
        db_path: cli.db.unwrap_or_else(default_db_path),
        json_store: cli.json_store,
        offset: Local::now().offset().fix(),
        config,
    };
    log::debug!("Reference offset for month windows: {}", ctx.offset);

    match cli.command {
        Commands::Collect { subject } => {
            commands::collect::handle_collect_command(&ctx, subject).await
        }
        Commands::Graph {
            output,
            subject,
            months,
            basic,
            json,
        } => {
            commands::graph::handle_graph_command(&ctx, subject, months, basic, json, &output)
                .await
        }
        Commands::Show { subject, months } => {
            commands::show::handle_show_command(&ctx, subject, months).await
        }
        Commands::Subjects => commands::show::handle_subjects_command(&ctx),
        Commands::ImportJson { file } => commands::import::handle_import_command(&ctx, file),
        Commands::Seed { subject, months } => {
            commands::seed::handle_seed_command(&ctx, subject, months)
        }
    }
}
