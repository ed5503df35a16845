//! Post-startup health report.
//!
//! One probe per service, no retries. The report is for the operator; it
//! never aborts the invoking command.

use std::fmt;

use tracing::warn;

use fastfood_core::ServiceSpec;

use crate::checker::{ProbeResult, Prober};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl From<ProbeResult> for HealthStatus {
    fn from(result: ProbeResult) -> Self {
        if result.is_healthy() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health of a single service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHealth {
    pub name: String,
    /// Result of the readiness probe.
    pub status: HealthStatus,
    /// Result of the public reachability check, when the service has one.
    pub public: Option<HealthStatus>,
}

impl ServiceHealth {
    /// Healthy only if every check passed.
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
            && self.public.is_none_or(|p| p == HealthStatus::Healthy)
    }
}

/// Fresh per-invocation health snapshot, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub services: Vec<ServiceHealth>,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.services.iter().all(ServiceHealth::is_healthy)
    }

    pub fn get(&self, name: &str) -> Option<&ServiceHealth> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn unhealthy(&self) -> Vec<&str> {
        self.services
            .iter()
            .filter(|s| !s.is_healthy())
            .map(|s| s.name.as_str())
            .collect()
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for service in &self.services {
            let mark = if service.is_healthy() { "✓" } else { "✗" };
            write!(f, "  {mark} {:<10} {}", service.name, service.status)?;
            if let Some(public) = service.public {
                write!(f, " (public: {public})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Probe every service once and collect the results.
pub async fn check_health<P>(prober: &P, services: &[ServiceSpec]) -> HealthReport
where
    P: Prober + ?Sized,
{
    let mut report = HealthReport::default();

    for spec in services {
        let status = HealthStatus::from(prober.probe(&spec.name, &spec.readiness).await);
        let public = match &spec.public_check {
            Some(probe) => Some(HealthStatus::from(prober.probe(&spec.name, probe).await)),
            None => None,
        };

        let entry = ServiceHealth {
            name: spec.name.clone(),
            status,
            public,
        };
        if !entry.is_healthy() {
            warn!(service = %spec.name, %status, ?public, "service unhealthy");
        }
        report.services.push(entry);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fastfood_core::{ProbeKind, Tier};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers per probe target; unknown targets fail.
    struct MapProber {
        answers: HashMap<String, ProbeResult>,
        calls: Mutex<Vec<String>>,
    }

    impl MapProber {
        fn new(answers: &[(&str, ProbeResult)]) -> Self {
            Self {
                answers: answers.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Prober for MapProber {
        async fn probe(&self, _service: &str, probe: &ProbeKind) -> ProbeResult {
            let key = match probe {
                ProbeKind::Tcp { address } | ProbeKind::Http { address, .. } => address.clone(),
                ProbeKind::Command { command } => command.join(" "),
            };
            self.calls.lock().unwrap().push(key.clone());
            self.answers.get(&key).copied().unwrap_or(ProbeResult::Failed)
        }
    }

    fn tcp(address: &str) -> ProbeKind {
        ProbeKind::Tcp {
            address: address.to_string(),
        }
    }

    fn services() -> Vec<ServiceSpec> {
        vec![
            ServiceSpec::new(
                "db",
                Tier::Infra,
                ProbeKind::Command {
                    command: vec!["pg_isready".to_string()],
                },
            ),
            ServiceSpec::new("web", Tier::App, tcp("web:5000")),
            ServiceSpec::new("nginx", Tier::Edge, tcp("edge:80")).with_public_check(tcp("edge:443")),
        ]
    }

    #[tokio::test]
    async fn all_healthy_report() {
        let prober = MapProber::new(&[
            ("pg_isready", ProbeResult::Healthy),
            ("web:5000", ProbeResult::Healthy),
            ("edge:80", ProbeResult::Healthy),
            ("edge:443", ProbeResult::Healthy),
        ]);

        let report = check_health(&prober, &services()).await;

        assert!(report.all_healthy());
        assert_eq!(report.services.len(), 3);
        assert_eq!(
            report.get("nginx").unwrap().public,
            Some(HealthStatus::Healthy)
        );
        assert!(report.unhealthy().is_empty());
    }

    #[tokio::test]
    async fn single_failure_is_reported_without_retry() {
        let prober = MapProber::new(&[
            ("pg_isready", ProbeResult::Healthy),
            ("web:5000", ProbeResult::Unhealthy),
            ("edge:80", ProbeResult::Healthy),
            ("edge:443", ProbeResult::Healthy),
        ]);

        let report = check_health(&prober, &services()).await;

        assert!(!report.all_healthy());
        assert_eq!(report.unhealthy(), vec!["web"]);
        // One probe per target: db, web, nginx + nginx public check.
        assert_eq!(prober.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn failed_public_check_marks_edge_unhealthy() {
        let prober = MapProber::new(&[
            ("pg_isready", ProbeResult::Healthy),
            ("web:5000", ProbeResult::Healthy),
            ("edge:80", ProbeResult::Healthy),
        ]);

        let report = check_health(&prober, &services()).await;

        let nginx = report.get("nginx").unwrap();
        assert_eq!(nginx.status, HealthStatus::Healthy);
        assert_eq!(nginx.public, Some(HealthStatus::Unhealthy));
        assert_eq!(report.unhealthy(), vec!["nginx"]);
    }

    #[test]
    fn report_display_lists_services() {
        let report = HealthReport {
            services: vec![
                ServiceHealth {
                    name: "db".to_string(),
                    status: HealthStatus::Healthy,
                    public: None,
                },
                ServiceHealth {
                    name: "nginx".to_string(),
                    status: HealthStatus::Healthy,
                    public: Some(HealthStatus::Unhealthy),
                },
            ],
        };
        let text = report.to_string();
        assert!(text.contains("✓ db"));
        assert!(text.contains("✗ nginx"));
        assert!(text.contains("(public: unhealthy)"));
    }
}
