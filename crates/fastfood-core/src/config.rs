//! Stack layout (`fastfood.toml`) and the assembled [`OpsConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::env::Environment;
use crate::error::ConfigError;
use crate::types::{ProbeBudget, ProbeKind, ServiceSpec, Tier};

/// Name of the optional stack layout file in the project directory.
pub const STACK_FILE: &str = "fastfood.toml";

/// Layout of the compose stack: files, ports, build order, and services.
///
/// Paths are relative to the project directory unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub compose_file: PathBuf,
    pub env_file: PathBuf,
    pub cert_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Executables that must be on `PATH` before deploying.
    pub required_tools: Vec<String>,
    /// Host ports that must be free before deploying.
    pub required_ports: Vec<u16>,
    /// Services whose images are built, in this order.
    pub build_order: Vec<String>,
    pub services: Vec<ServiceSpec>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            compose_file: PathBuf::from("docker-compose.yml"),
            env_file: PathBuf::from(".env"),
            cert_dir: PathBuf::from("ssl"),
            backup_dir: PathBuf::from("backups"),
            log_dir: PathBuf::from("logs"),
            required_tools: vec!["docker".to_string()],
            required_ports: vec![80, 443, 5000, 5050, 5432, 6379],
            build_order: vec!["db".to_string(), "web".to_string(), "nginx".to_string()],
            services: Vec::new(),
        }
    }
}

impl StackConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The FastFood services, with probe commands using `env` credentials.
    pub fn default_services(env: &Environment) -> Vec<ServiceSpec> {
        let db = &env.database;
        let mut redis_ping = vec!["redis-cli".to_string()];
        if let Some(password) = &env.cache.password {
            redis_ping.extend(["-a".to_string(), password.clone()]);
        }
        redis_ping.push("ping".to_string());

        let edge_budget = ProbeBudget::fixed(15, Duration::from_secs(2));

        vec![
            ServiceSpec::new(
                "db",
                Tier::Infra,
                ProbeKind::Command {
                    command: vec![
                        "pg_isready".to_string(),
                        "-U".to_string(),
                        db.user.clone(),
                        "-d".to_string(),
                        db.name.clone(),
                    ],
                },
            ),
            ServiceSpec::new("redis", Tier::Infra, ProbeKind::Command { command: redis_ping }),
            ServiceSpec::new(
                "web",
                Tier::App,
                ProbeKind::Http {
                    address: "127.0.0.1:5000".to_string(),
                    path: "/health".to_string(),
                },
            ),
            ServiceSpec::new(
                "nginx",
                Tier::Edge,
                ProbeKind::Tcp {
                    address: "127.0.0.1:80".to_string(),
                },
            )
            .with_budget(edge_budget)
            .with_public_check(ProbeKind::Tcp {
                address: "127.0.0.1:443".to_string(),
            }),
            ServiceSpec::new(
                "pgadmin",
                Tier::Edge,
                ProbeKind::Tcp {
                    address: "127.0.0.1:5050".to_string(),
                },
            )
            .with_budget(edge_budget),
        ]
    }
}

/// Immutable configuration assembled once at startup.
#[derive(Debug, Clone)]
pub struct OpsConfig {
    pub project_dir: PathBuf,
    pub stack: StackConfig,
    pub env: Environment,
}

impl OpsConfig {
    /// Load `fastfood.toml` (optional) and the environment for `project_dir`.
    ///
    /// An empty `services` list is filled with the FastFood defaults.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let stack_path = project_dir.join(STACK_FILE);
        let stack = if stack_path.is_file() {
            debug!(path = ?stack_path, "loading stack config");
            StackConfig::from_file(&stack_path)?
        } else {
            StackConfig::default()
        };
        let env = Environment::load(&resolve(project_dir, &stack.env_file))?;
        Ok(Self::new(project_dir, stack, env))
    }

    pub fn new(project_dir: &Path, mut stack: StackConfig, env: Environment) -> Self {
        if stack.services.is_empty() {
            stack.services = StackConfig::default_services(&env);
        }
        Self {
            project_dir: project_dir.to_path_buf(),
            stack,
            env,
        }
    }

    pub fn compose_file(&self) -> PathBuf {
        resolve(&self.project_dir, &self.stack.compose_file)
    }

    pub fn env_file(&self) -> PathBuf {
        resolve(&self.project_dir, &self.stack.env_file)
    }

    pub fn cert_dir(&self) -> PathBuf {
        resolve(&self.project_dir, &self.stack.cert_dir)
    }

    pub fn backup_dir(&self) -> PathBuf {
        resolve(&self.project_dir, &self.stack.backup_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        resolve(&self.project_dir, &self.stack.log_dir)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.stack.services.iter().find(|s| s.name == name)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
