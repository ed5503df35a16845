//! fastfood-health: readiness gating and health reporting.
//!
//! Readiness gates startup sequencing; health is a post-startup,
//! non-blocking diagnostic report. Both use the same probes.
//!
//! # Architecture
//!
//! ```text
//! wait_ready(prober, clock, service, probe, budget) → Readiness
//!   └── up to max_attempts × Prober::probe(), Clock::sleep() between
//!
//! check_health(prober, services) → HealthReport
//!   └── one Prober::probe() per service (+ public check), no retries
//! ```
//!
//! `LiveProber` performs TCP connects, HTTP GETs, and container commands
//! (through an [`Exec`] implementation supplied by the caller).

pub mod checker;
pub mod readiness;
pub mod report;

pub use checker::{Exec, LiveProber, ProbeResult, Prober};
pub use readiness::{Clock, Readiness, TokioClock, wait_ready};
pub use report::{HealthReport, HealthStatus, ServiceHealth, check_health};
