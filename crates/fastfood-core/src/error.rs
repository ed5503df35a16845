//! Error types shared by every FastFood ops component.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for orchestration operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Fatal failures of the deployment tooling.
///
/// Every variant ends the invoking command with exit code 1.
#[derive(Debug, Error)]
pub enum OpsError {
    #[error("required tool not found: {0}")]
    MissingDependency(String),

    #[error("port {0} is already in use")]
    PortConflict(u16),

    #[error("service {service} did not become ready after {attempts} attempts")]
    ProbeTimedOut { service: String, attempts: u32 },

    #[error("backup not found: {}", .0.display())]
    RestoreTargetMissing(PathBuf),

    #[error("supervisor command failed: {0}")]
    Supervisor(String),

    #[error("seeding failed: {0}")]
    Seed(String),

    #[error("certificate generation failed: {0}")]
    Tls(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while assembling [`crate::OpsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}
