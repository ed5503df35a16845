//! Tiered deployment of the compose stack.
//!
//! Preflight, build, then start tier by tier with readiness gating, seed,
//! and report health. Any failure aborts the run; services already started
//! are left running.

use async_trait::async_trait;
use tracing::{error, info};

use fastfood_core::{OpsConfig, OpsError, OpsResult, ServiceSpec, Tier, services_by_tier};
use fastfood_health::{Clock, HealthReport, Prober, Readiness, check_health, wait_ready};
use fastfood_seed::{PgSeedStore, SeedOutcome, SeedStore, seed};

use crate::bootstrap::ensure_dirs;
use crate::host::{Host, preflight};
use crate::supervisor::Supervisor;
use crate::tls::ensure_certificates;

/// Log lines collected from a service that failed readiness.
const FAILURE_LOG_TAIL: u32 = 50;

/// Where the seeder writes, opened once the stack is up.
#[async_trait]
pub trait SeedTarget: Send + Sync {
    async fn open(&self) -> OpsResult<Box<dyn SeedStore>>;
}

/// The stack's Postgres, migrated to the bundled schema on open.
pub struct PostgresTarget<'a> {
    config: &'a OpsConfig,
}

impl<'a> PostgresTarget<'a> {
    pub fn new(config: &'a OpsConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<'a> SeedTarget for PostgresTarget<'a> {
    async fn open(&self) -> OpsResult<Box<dyn SeedStore>> {
        let store = PgSeedStore::connect(&self.config.env.database).await?;
        store.migrate().await?;
        Ok(Box::new(store))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeployOptions {
    /// Refuse to deploy when a required port is taken.
    pub check_ports: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self { check_ports: true }
    }
}

/// Summary of a successful deployment.
#[derive(Debug, Clone)]
pub struct DeployReport {
    /// Images built, in build order.
    pub built: Vec<String>,
    /// Services in the order they reported ready, with attempts used.
    pub ready: Vec<(String, u32)>,
    pub seed: SeedOutcome,
    pub health: HealthReport,
}

/// Drives a deployment through its collaborators.
pub struct Orchestrator<'a, S: ?Sized, H: ?Sized, P: ?Sized, C: ?Sized> {
    config: &'a OpsConfig,
    supervisor: &'a S,
    host: &'a H,
    prober: &'a P,
    clock: &'a C,
}

impl<'a, S, H, P, C> Orchestrator<'a, S, H, P, C>
where
    S: Supervisor + ?Sized,
    H: Host + ?Sized,
    P: Prober + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(
        config: &'a OpsConfig,
        supervisor: &'a S,
        host: &'a H,
        prober: &'a P,
        clock: &'a C,
    ) -> Self {
        Self {
            config,
            supervisor,
            host,
            prober,
            clock,
        }
    }

    /// Full deployment: preflight → build → tiers → seed → health.
    pub async fn deploy<T>(&self, target: &T, options: DeployOptions) -> OpsResult<DeployReport>
    where
        T: SeedTarget + ?Sized,
    {
        info!("FastFood deployment starting");
        preflight(self.host, &self.config.stack, options.check_ports)?;

        ensure_certificates(&self.config.cert_dir())?;
        ensure_dirs(&[&self.config.log_dir(), &self.config.backup_dir()])?;

        let built = self.build_images().await?;
        let ready = self.start_tiers().await?;

        let store = target.open().await?;
        let seed_outcome = seed(store.as_ref(), self.config.env.mode).await?;
        info!(?seed_outcome, "seeding complete");

        let health = check_health(self.prober, &self.config.stack.services).await;
        if health.all_healthy() {
            info!("all services healthy");
        } else {
            error!(unhealthy = ?health.unhealthy(), "deployment finished with unhealthy services");
        }

        Ok(DeployReport {
            built,
            ready,
            seed: seed_outcome,
            health,
        })
    }

    /// Build every image in declared order, stopping at the first failure.
    pub async fn build_images(&self) -> OpsResult<Vec<String>> {
        let mut built = Vec::new();
        for service in &self.config.stack.build_order {
            info!(%service, "building image");
            self.supervisor.build(service).await?;
            built.push(service.clone());
        }
        Ok(built)
    }

    /// Start each tier and wait until all of its services are ready.
    pub async fn start_tiers(&self) -> OpsResult<Vec<(String, u32)>> {
        let mut ready = Vec::new();
        for (tier, services) in services_by_tier(&self.config.stack.services) {
            ready.extend(self.start_tier(tier, &services).await?);
        }
        Ok(ready)
    }

    async fn start_tier(&self, tier: Tier, services: &[&ServiceSpec]) -> OpsResult<Vec<(String, u32)>> {
        let names: Vec<String> = services.iter().map(|s| s.name.clone()).collect();
        info!(%tier, services = ?names, "starting tier");
        self.supervisor.up(&names).await?;

        let mut ready = Vec::new();
        for spec in services {
            ready.push((spec.name.clone(), self.await_ready(spec).await?));
        }
        info!(%tier, "tier ready");
        Ok(ready)
    }

    /// Wait for one service; on timeout dump its recent logs and fail.
    pub async fn await_ready(&self, spec: &ServiceSpec) -> OpsResult<u32> {
        let readiness = wait_ready(self.prober, self.clock, &spec.name, &spec.readiness, &spec.budget).await;
        match readiness {
            Readiness::Ready { attempts } => Ok(attempts),
            Readiness::TimedOut { attempts } => {
                match self.supervisor.logs(Some(&spec.name), FAILURE_LOG_TAIL).await {
                    Ok(logs) => eprintln!("--- last {FAILURE_LOG_TAIL} log lines of {} ---\n{logs}", spec.name),
                    Err(e) => error!(service = %spec.name, error = %e, "could not collect logs"),
                }
                Err(OpsError::ProbeTimedOut {
                    service: spec.name.clone(),
                    attempts,
                })
            }
        }
    }
}
