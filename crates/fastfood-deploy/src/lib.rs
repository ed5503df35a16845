//! fastfood-deploy: orchestration of the FastFood compose stack.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator::deploy
//!   ├── preflight: Host (tools on PATH, ports free)
//!   ├── bootstrap: .env secrets, self-signed TLS cert, log/backup dirs
//!   ├── Supervisor::build per image, in declared order
//!   ├── per tier: Supervisor::up → wait_ready per service (fatal on timeout)
//!   ├── SeedTarget::open → seed (baseline, samples in development)
//!   └── check_health → HealthReport
//!
//! BackupManager
//!   ├── backup: pg_dump → <backup_dir>/<timestamp>/ + config copies + manifest
//!   ├── restore: down → up db → pg_restore → (env) → up
//!   └── prune: drop snapshots older than the retention window (mtime)
//! ```
//!
//! Every external process goes through [`Supervisor`] and every host
//! check through [`Host`], so the whole sequence runs against fakes in
//! tests.

pub mod backup;
pub mod bootstrap;
pub mod host;
pub mod orchestrator;
pub mod supervisor;
pub mod tls;

pub use backup::{BackupManager, BackupSnapshot, RestoreOptions, prune_snapshots, retention_window};
pub use host::{Host, SystemHost, preflight};
pub use orchestrator::{DeployOptions, DeployReport, Orchestrator, PostgresTarget, SeedTarget};
pub use supervisor::{CommandOutput, DockerCompose, Supervisor, SupervisorExec};
