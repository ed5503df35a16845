//! Service specifications for the FastFood stack.
//!
//! A [`ServiceSpec`] names a compose service, the tier it starts in, and
//! how to tell when it is ready. Tiers start in strict order:
//! `Infra` → `App` → `Edge`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Startup tier of a service. Ordering follows startup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Data stores (database, cache).
    Infra,
    /// The web application.
    App,
    /// Reverse proxy and admin tooling.
    Edge,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Infra, Tier::App, Tier::Edge];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Infra => write!(f, "infra"),
            Tier::App => write!(f, "app"),
            Tier::Edge => write!(f, "edge"),
        }
    }
}

/// How a single readiness or health probe is performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProbeKind {
    /// The address (host:port) accepts a TCP connection.
    Tcp { address: String },
    /// A command run inside the service's container exits with status 0.
    Command { command: Vec<String> },
    /// `GET http://{address}{path}` answers with a 2xx status.
    Http { address: String, path: String },
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Tcp { address } => write!(f, "tcp {address}"),
            ProbeKind::Command { command } => write!(f, "exec `{}`", command.join(" ")),
            ProbeKind::Http { address, path } => write!(f, "GET http://{address}{path}"),
        }
    }
}

/// Interval growth between readiness attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    /// Same interval between every attempt.
    #[default]
    Fixed,
    /// Interval doubles after each failed attempt, capped at `max`.
    Exponential {
        #[serde(with = "crate::duration")]
        max: Duration,
    },
}

/// Attempt budget for readiness polling.
///
/// The budget is attempt-based, not a wall-clock deadline: a slow probe
/// stretches the effective timeout beyond `max_attempts * interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeBudget {
    pub max_attempts: u32,
    #[serde(with = "crate::duration")]
    pub interval: Duration,
    #[serde(default)]
    pub backoff: Backoff,
}

impl ProbeBudget {
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            backoff: Backoff::Fixed,
        }
    }

    /// Interval to wait after `current` when the latest attempt failed.
    pub fn next_interval(&self, current: Duration) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential { max } => current.saturating_mul(2).min(max),
        }
    }
}

impl Default for ProbeBudget {
    fn default() -> Self {
        Self::fixed(30, Duration::from_secs(2))
    }
}

/// A compose service managed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Compose service name.
    pub name: String,
    pub tier: Tier,
    /// Probe used both for startup readiness and for health reports.
    pub readiness: ProbeKind,
    #[serde(default)]
    pub budget: ProbeBudget,
    /// Extra reachability check over the public scheme (edge services).
    #[serde(default)]
    pub public_check: Option<ProbeKind>,
}

impl ServiceSpec {
    pub fn new(name: &str, tier: Tier, readiness: ProbeKind) -> Self {
        Self {
            name: name.to_string(),
            tier,
            readiness,
            budget: ProbeBudget::default(),
            public_check: None,
        }
    }

    pub fn with_budget(mut self, budget: ProbeBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_public_check(mut self, probe: ProbeKind) -> Self {
        self.public_check = Some(probe);
        self
    }
}

/// Group services by tier, preserving declaration order inside a tier.
pub fn services_by_tier(services: &[ServiceSpec]) -> Vec<(Tier, Vec<&ServiceSpec>)> {
    Tier::ALL
        .iter()
        .map(|tier| {
            let members: Vec<&ServiceSpec> =
                services.iter().filter(|s| s.tier == *tier).collect();
            (*tier, members)
        })
        .filter(|(_, members)| !members.is_empty())
        .collect()
}
