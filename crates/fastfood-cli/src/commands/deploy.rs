use std::path::Path;

use fastfood_deploy::bootstrap::load_for_deploy;
use fastfood_deploy::{DeployOptions, DeployReport, Orchestrator, PostgresTarget, SupervisorExec, SystemHost};
use fastfood_health::{LiveProber, TokioClock};
use fastfood_seed::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
use tracing::info;

use super::compose;

pub async fn deploy(project_dir: &Path, skip_port_check: bool) -> anyhow::Result<()> {
    let config = load_for_deploy(project_dir, &SystemHost, !skip_port_check)?;

    let compose = compose(&config);
    let prober = LiveProber::new(SupervisorExec(&compose));
    let orchestrator = Orchestrator::new(&config, &compose, &SystemHost, &prober, &TokioClock);
    let options = DeployOptions {
        check_ports: !skip_port_check,
    };

    let report = orchestrator.deploy(&PostgresTarget::new(&config), options).await?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &DeployReport) {
    info!("deployment finished");

    println!();
    println!("✓ FastFood deployed");
    println!("  Images built: {}", report.built.join(", "));
    let ready: Vec<String> = report
        .ready
        .iter()
        .map(|(name, attempts)| format!("{name} ({attempts})"))
        .collect();
    println!("  Ready (attempts): {}", ready.join(", "));

    let seed = &report.seed;
    if seed.is_noop() {
        println!("  Seed: nothing to do");
    } else {
        println!(
            "  Seed: restaurant {}, admin {}, {} customers, {} menu items",
            created(seed.restaurant_created),
            created(seed.admin_created),
            seed.customers_created,
            seed.menu_items_created
        );
    }

    println!();
    println!("Health:");
    print!("{}", report.health);
    if !report.health.all_healthy() {
        println!("  Some services are unhealthy; check `fastfood logs <service>`.");
    }

    println!();
    println!("  Application: https://localhost");
    println!("  pgAdmin:     http://localhost:5050");
    if seed.admin_created {
        println!(
            "  Admin login: {DEFAULT_ADMIN_USERNAME} / {DEFAULT_ADMIN_PASSWORD} (change it after first login)"
        );
    }
}

fn created(flag: bool) -> &'static str {
    if flag { "created" } else { "kept" }
}
