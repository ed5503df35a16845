use std::path::Path;
use std::time::SystemTime;

use fastfood_deploy::{BackupManager, RestoreOptions, SupervisorExec, prune_snapshots, retention_window};
use fastfood_health::{LiveProber, TokioClock};

use super::{compose, load_config};

pub async fn backup(project_dir: &Path) -> anyhow::Result<()> {
    let config = load_config(project_dir)?;
    let compose = compose(&config);
    let prober = LiveProber::new(SupervisorExec(&compose));
    let manager = BackupManager::new(&config, &compose, &prober, &TokioClock);

    let snapshot = manager.backup().await?;
    println!("✓ Backup written to {}", snapshot.dir.display());
    println!("  Dump: {}", snapshot.dump.display());
    for path in &snapshot.aux_files {
        println!("  Copy: {}", path.display());
    }

    let removed = prune_snapshots(
        &config.backup_dir(),
        retention_window(config.env.backup_retention_days),
        SystemTime::now(),
    )?;
    if !removed.is_empty() {
        println!(
            "  Removed {} snapshot(s) older than {} days",
            removed.len(),
            config.env.backup_retention_days
        );
    }
    Ok(())
}

pub async fn restore(project_dir: &Path, snapshot: &Path, restore_env: bool) -> anyhow::Result<()> {
    let config = load_config(project_dir)?;
    let compose = compose(&config);
    let prober = LiveProber::new(SupervisorExec(&compose));
    let manager = BackupManager::new(&config, &compose, &prober, &TokioClock);

    println!("Restoring {} (current data will be replaced)", snapshot.display());
    manager.restore(snapshot, RestoreOptions { restore_env }).await?;
    println!("✓ Restore complete");
    Ok(())
}

pub fn prune(project_dir: &Path) -> anyhow::Result<()> {
    let config = load_config(project_dir)?;
    let days = config.env.backup_retention_days;
    let removed = prune_snapshots(&config.backup_dir(), retention_window(days), SystemTime::now())?;

    if removed.is_empty() {
        println!("No snapshots older than {days} days");
    }
    for path in &removed {
        println!("Removed {}", path.display());
    }
    Ok(())
}
