//! citeharvest CLI: collect the works citing a list of DOIs into a CSV report.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log targets owned by this workspace; dependency chatter (hyper, reqwest)
/// stays out unless `RUST_LOG` asks for it.
const LOG_TARGETS: [&str; 2] = ["citeharvest", "citeharvest_core"];

/// citeharvest: find who cites your papers
#[derive(Parser, Debug)]
#[command(name = "citeharvest", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (holds citeharvest.toml; relative paths resolve here)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Configuration file path (replaces the workspace citeharvest.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Subcommand (defaults to `run`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Harvest citing works for the configured identifiers
    Run(RunArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// Identifiers to process (replaces the configured list)
    identifiers: Vec<String>,

    /// CSV output path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum citing records per identifier (0 = no limit)
    #[arg(long)]
    max_results: Option<usize>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default citeharvest.toml in the workspace
    Init,
    /// Show the effective configuration (API key masked)
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.verbose, cli.quiet);

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            commands::handle_run(args, &workspace, cli.config.as_deref(), cli.quiet).await
        }
        Commands::Config { action } => {
            commands::handle_config(action, &workspace, cli.config.as_deref())
        }
    }
}

fn console_level(verbose: u8, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (0, true) => "error",
        (0, false) => "info",
        (1, _) => "debug",
        _ => "trace",
    }
}

fn target_filter(level: &str) -> EnvFilter {
    let directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    EnvFilter::new(directives.join(","))
}

/// Stderr output at the requested verbosity plus a daily JSON log under the
/// platform data directory. The returned guard flushes the file writer when
/// dropped; no file layer is installed if the directory cannot be created.
fn init_tracing(verbose: u8, quiet: bool) -> Option<WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| target_filter(console_level(verbose, quiet)));
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let log_dir = directories::ProjectDirs::from("dev", "citeharvest", "citeharvest")
        .map(|dirs| dirs.data_dir().join("logs"))
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    let (file, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "citeharvest.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(target_filter("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}
