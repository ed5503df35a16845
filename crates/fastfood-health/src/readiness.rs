//! Bounded readiness polling.
//!
//! [`wait_ready`] probes a service until it answers or the attempt budget
//! runs out. Sleeping goes through [`Clock`] so tests can run on a
//! simulated clock.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use fastfood_core::{ProbeBudget, ProbeKind};

use crate::checker::Prober;

/// Outcome of readiness polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The service answered on attempt `attempts`.
    Ready { attempts: u32 },
    /// Every attempt in the budget failed.
    TimedOut { attempts: u32 },
}

impl Readiness {
    pub fn is_ready(self) -> bool {
        matches!(self, Readiness::Ready { .. })
    }
}

/// Source of delays between attempts.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real time, backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Probe `service` until it is ready or `budget.max_attempts` probes failed.
///
/// Never sleeps after the final attempt. A zero-attempt budget times out
/// immediately without probing.
pub async fn wait_ready<P, C>(
    prober: &P,
    clock: &C,
    service: &str,
    probe: &ProbeKind,
    budget: &ProbeBudget,
) -> Readiness
where
    P: Prober + ?Sized,
    C: Clock + ?Sized,
{
    let mut interval = budget.interval;

    for attempt in 1..=budget.max_attempts {
        let result = prober.probe(service, probe).await;
        if result.is_healthy() {
            info!(%service, attempt, "service ready");
            return Readiness::Ready { attempts: attempt };
        }

        debug!(%service, attempt, max = budget.max_attempts, ?result, "service not ready yet");

        if attempt < budget.max_attempts {
            clock.sleep(interval).await;
            interval = budget.next_interval(interval);
        }
    }

    warn!(%service, attempts = budget.max_attempts, %probe, "service did not become ready");
    Readiness::TimedOut {
        attempts: budget.max_attempts,
    }
}
