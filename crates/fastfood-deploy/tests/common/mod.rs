//! Fakes shared by the deploy integration tests.
//!
//! Supervisor and prober append to one event log so tests can assert the
//! exact interleaving of container operations and readiness probes.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use fastfood_core::{Environment, OpsConfig, OpsError, OpsResult, ProbeKind, StackConfig};
use fastfood_deploy::{CommandOutput, Host, SeedTarget, Supervisor};
use fastfood_health::{Clock, ProbeResult, Prober};
use fastfood_seed::{MemoryStore, SeedStore};

pub type Events = Arc<Mutex<Vec<String>>>;

pub fn events() -> Events {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recorded(events: &Events) -> Vec<String> {
    events.lock().unwrap().clone()
}

pub fn test_config(project_dir: &Path) -> OpsConfig {
    let env = Environment::from_lookup(|key| match key {
        "POSTGRES_PASSWORD" => Some("s3cret".to_string()),
        _ => None,
    })
    .unwrap();
    OpsConfig::new(project_dir, StackConfig::default(), env)
}

/// Compose stand-in. `pg_dump`/`pg_restore` move the rows of `db` in and
/// out as JSON.
pub struct FakeSupervisor {
    pub events: Events,
    pub db: MemoryStore,
    pub fail_dump: bool,
}

impl FakeSupervisor {
    pub fn new(events: Events, db: MemoryStore) -> Self {
        Self {
            events,
            db,
            fail_dump: false,
        }
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

fn joined(verb: &str, services: &[String]) -> String {
    if services.is_empty() {
        verb.to_string()
    } else {
        format!("{verb} {}", services.join(" "))
    }
}

#[async_trait]
impl Supervisor for FakeSupervisor {
    async fn build(&self, service: &str) -> OpsResult<()> {
        self.record(format!("build {service}"));
        Ok(())
    }

    async fn up(&self, services: &[String]) -> OpsResult<()> {
        self.record(joined("up", services));
        Ok(())
    }

    async fn down(&self) -> OpsResult<()> {
        self.record("down".to_string());
        Ok(())
    }

    async fn start(&self, services: &[String]) -> OpsResult<()> {
        self.record(joined("start", services));
        Ok(())
    }

    async fn stop(&self, services: &[String]) -> OpsResult<()> {
        self.record(joined("stop", services));
        Ok(())
    }

    async fn restart(&self, services: &[String]) -> OpsResult<()> {
        self.record(joined("restart", services));
        Ok(())
    }

    async fn exec(
        &self,
        service: &str,
        command: &[String],
        stdin: Option<Vec<u8>>,
    ) -> OpsResult<CommandOutput> {
        let program = command.first().cloned().unwrap_or_default();
        self.record(format!("exec {service} {program}"));

        match program.as_str() {
            "pg_dump" if self.fail_dump => Ok(CommandOutput {
                success: false,
                stdout: Vec::new(),
                stderr: "pg_dump: connection refused".to_string(),
            }),
            "pg_dump" => Ok(CommandOutput {
                success: true,
                stdout: self.db.to_json().map_err(OpsError::from)?,
                stderr: String::new(),
            }),
            "pg_restore" => {
                let archive = stdin.unwrap_or_default();
                self.db.load_json(&archive).map_err(OpsError::from)?;
                Ok(CommandOutput {
                    success: true,
                    ..CommandOutput::default()
                })
            }
            _ => Ok(CommandOutput {
                success: true,
                ..CommandOutput::default()
            }),
        }
    }

    async fn ps(&self) -> OpsResult<String> {
        self.record("ps".to_string());
        Ok("db   running\nweb  running\n".to_string())
    }

    async fn logs(&self, service: Option<&str>, tail: u32) -> OpsResult<String> {
        self.record(format!("logs {} {tail}", service.unwrap_or("all")));
        Ok("connection refused\n".to_string())
    }

    async fn stats(&self) -> OpsResult<String> {
        Ok(String::new())
    }
}

/// Healthy on the first probe unless the service is listed as failing.
pub struct ScriptedProber {
    pub events: Events,
    pub failing: Vec<String>,
}

impl ScriptedProber {
    pub fn healthy(events: Events) -> Self {
        Self {
            events,
            failing: Vec::new(),
        }
    }

    pub fn failing(events: Events, service: &str) -> Self {
        Self {
            events,
            failing: vec![service.to_string()],
        }
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, service: &str, _probe: &ProbeKind) -> ProbeResult {
        self.events.lock().unwrap().push(format!("probe {service}"));
        if self.failing.iter().any(|s| s == service) {
            ProbeResult::Failed
        } else {
            ProbeResult::Healthy
        }
    }
}

/// Records requested sleeps without waiting.
#[derive(Default)]
pub struct RecordingClock {
    pub sleeps: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub struct FakeHost {
    pub missing_tools: Vec<String>,
    pub busy_ports: Vec<u16>,
}

impl FakeHost {
    pub fn ready() -> Self {
        Self {
            missing_tools: Vec::new(),
            busy_ports: Vec::new(),
        }
    }
}

impl Host for FakeHost {
    fn tool_available(&self, tool: &str) -> bool {
        !self.missing_tools.iter().any(|t| t == tool)
    }

    fn port_free(&self, port: u16) -> bool {
        !self.busy_ports.contains(&port)
    }
}

/// Seeds into a shared [`MemoryStore`].
pub struct MemoryTarget {
    pub events: Events,
    pub store: MemoryStore,
}

#[async_trait]
impl SeedTarget for MemoryTarget {
    async fn open(&self) -> OpsResult<Box<dyn SeedStore>> {
        self.events.lock().unwrap().push("seed".to_string());
        Ok(Box::new(self.store.clone()))
    }
}
