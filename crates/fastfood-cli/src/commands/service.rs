use std::path::Path;

use anyhow::Context;
use fastfood_core::duration::parse_duration;
use fastfood_core::{OpsError, ProbeBudget, ProbeKind};
use fastfood_deploy::{DockerCompose, PostgresTarget, SeedTarget, Supervisor, SupervisorExec};
use fastfood_health::{LiveProber, Readiness, TokioClock, check_health, wait_ready};
use fastfood_seed::seed as seed_store;

use super::{compose, load_config};

pub async fn status(project_dir: &Path) -> anyhow::Result<()> {
    let config = load_config(project_dir)?;
    let compose = compose(&config);
    let prober = LiveProber::new(SupervisorExec(&compose));

    print!("{}", compose.ps().await?);
    println!();
    println!("Health:");
    let report = check_health(&prober, &config.stack.services).await;
    print!("{report}");

    let usage = compose.stats().await?;
    if !usage.trim().is_empty() {
        println!();
        println!("Resources:");
        print!("{usage}");
    }
    Ok(())
}

pub async fn logs(project_dir: &Path, service: Option<&str>, tail: Option<u32>) -> anyhow::Result<()> {
    let config = load_config(project_dir)?;
    let compose = compose(&config);
    match tail {
        Some(lines) => print!("{}", compose.logs(service, lines).await?),
        None => compose.follow_logs(service).await?,
    }
    Ok(())
}

pub async fn stop(project_dir: &Path, services: &[String]) -> anyhow::Result<()> {
    let config = load_config(project_dir)?;
    compose(&config).stop(services).await?;
    println!("✓ Stopped {}", describe(services));
    Ok(())
}

pub async fn start(project_dir: &Path, services: &[String]) -> anyhow::Result<()> {
    let config = load_config(project_dir)?;
    compose(&config).start(services).await?;
    println!("✓ Started {}", describe(services));
    Ok(())
}

pub async fn restart(project_dir: &Path, services: &[String]) -> anyhow::Result<()> {
    let config = load_config(project_dir)?;
    compose(&config).restart(services).await?;
    println!("✓ Restarted {}", describe(services));
    Ok(())
}

pub async fn seed(project_dir: &Path) -> anyhow::Result<()> {
    let config = load_config(project_dir)?;
    let store = PostgresTarget::new(&config).open().await?;
    let outcome = seed_store(store.as_ref(), config.env.mode).await?;

    if outcome.is_noop() {
        println!("✓ Database already seeded");
    } else {
        println!(
            "✓ Seeded: restaurant={} admin={} customers={} menu_items={}",
            outcome.restaurant_created,
            outcome.admin_created,
            outcome.customers_created,
            outcome.menu_items_created
        );
    }
    Ok(())
}

/// Block until `address` accepts TCP connections, like a container
/// entrypoint waiting on its database.
pub async fn wait(address: &str, attempts: u32, interval: &str) -> anyhow::Result<()> {
    let interval = parse_duration(interval).with_context(|| format!("invalid interval `{interval}`"))?;
    // TCP probes never exec; the compose handle only satisfies the prober's type.
    let compose = DockerCompose::new(Path::new("docker-compose.yml"), Path::new("."));
    let prober = LiveProber::new(SupervisorExec(&compose));
    let probe = ProbeKind::Tcp {
        address: address.to_string(),
    };

    match wait_ready(&prober, &TokioClock, address, &probe, &ProbeBudget::fixed(attempts, interval)).await {
        Readiness::Ready { attempts } => {
            println!("✓ {address} is accepting connections (attempt {attempts})");
            Ok(())
        }
        Readiness::TimedOut { attempts } => Err(OpsError::ProbeTimedOut {
            service: address.to_string(),
            attempts,
        }
        .into()),
    }
}

fn describe(services: &[String]) -> String {
    if services.is_empty() {
        "all services".to_string()
    } else {
        services.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_names_services_or_all() {
        assert_eq!(describe(&[]), "all services");
        assert_eq!(describe(&["web".to_string(), "nginx".to_string()]), "web, nginx");
    }

    #[tokio::test]
    async fn wait_succeeds_on_listening_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        assert!(wait(&address, 3, "10ms").await.is_ok());
    }

    #[tokio::test]
    async fn wait_rejects_bad_interval() {
        let err = wait("127.0.0.1:1", 1, "soon").await.unwrap_err();
        assert!(err.to_string().contains("invalid interval"));
    }
}
