//! fastfood: operator CLI for the FastFood compose stack.
//!
//! # Usage
//!
//! ```text
//! fastfood deploy
//! fastfood backup
//! fastfood restore backups/20261019_020000
//! fastfood logs web
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fastfood",
    about = "FastFood stack operations: deploy, backup, restore",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory holding docker-compose.yml, .env, and fastfood.toml.
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full deployment: preflight, build, tiered startup, seeding, health.
    Deploy {
        /// Deploy even when required host ports are in use.
        #[arg(long)]
        skip_port_check: bool,
    },
    /// Snapshot the database and config files, then drop expired snapshots.
    Backup,
    /// Replace the database with a snapshot. Destructive.
    Restore {
        /// Snapshot directory written by `backup`.
        dir: PathBuf,
        /// Also put the snapshot's .env back in place.
        #[arg(long)]
        restore_env: bool,
    },
    /// Container listing plus a fresh health report.
    Status,
    /// Follow service logs.
    Logs {
        /// Service to show (default: all).
        service: Option<String>,
        /// Print the last N lines and exit instead of following.
        #[arg(short = 'n', long)]
        tail: Option<u32>,
    },
    /// Stop services (default: all).
    Stop { services: Vec<String> },
    /// Start stopped services (default: all).
    Start { services: Vec<String> },
    /// Restart services (default: all).
    Restart { services: Vec<String> },
    /// Apply the schema and seed baseline records against the running database.
    Seed,
    /// Delete snapshots older than BACKUP_RETENTION_DAYS.
    Prune,
    /// Wait until a TCP address accepts connections.
    Wait {
        /// host:port to probe.
        address: String,
        #[arg(long, default_value = "30")]
        attempts: u32,
        /// Delay between attempts, e.g. 2s or 500ms.
        #[arg(long, default_value = "2s")]
        interval: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version are not failures; everything else exits 1.
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_tracing() {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fastfood=info".parse()?),
        )
        .init();
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let dir = cli.project_dir.as_path();

    match cli.command {
        Commands::Deploy { skip_port_check } => commands::deploy::deploy(dir, skip_port_check).await,
        Commands::Backup => commands::backup::backup(dir).await,
        Commands::Restore { dir: snapshot, restore_env } => {
            commands::backup::restore(dir, &snapshot, restore_env).await
        }
        Commands::Prune => commands::backup::prune(dir),
        Commands::Status => commands::service::status(dir).await,
        Commands::Logs { service, tail } => commands::service::logs(dir, service.as_deref(), tail).await,
        Commands::Stop { services } => commands::service::stop(dir, &services).await,
        Commands::Start { services } => commands::service::start(dir, &services).await,
        Commands::Restart { services } => commands::service::restart(dir, &services).await,
        Commands::Seed => commands::service::seed(dir).await,
        Commands::Wait {
            address,
            attempts,
            interval,
        } => commands::service::wait(&address, attempts, &interval).await,
    }
}
