//! First-run files: `.env` with generated secrets and working directories.

use std::path::Path;

use tracing::{debug, info};

use fastfood_core::{OpsConfig, OpsResult};

use crate::host::{Host, preflight};

fn secret(bytes: usize) -> String {
    let raw: Vec<u8> = (0..bytes).map(|_| rand::random::<u8>()).collect();
    hex::encode(raw)
}

/// Render a production `.env` with fresh random secrets.
pub fn render_env_file() -> String {
    format!(
        "# Generated by fastfood deploy. Keep this file private.\n\
         FLASK_ENV=production\n\
         SECRET_KEY={secret_key}\n\
         \n\
         POSTGRES_USER=fastfood\n\
         POSTGRES_PASSWORD={db_password}\n\
         POSTGRES_DB=fastfood_db\n\
         DB_HOST=localhost\n\
         DB_PORT=5432\n\
         \n\
         REDIS_HOST=localhost\n\
         REDIS_PORT=6379\n\
         REDIS_PASSWORD={redis_password}\n\
         \n\
         PGADMIN_DEFAULT_EMAIL=admin@fastfood.local\n\
         PGADMIN_DEFAULT_PASSWORD={pgadmin_password}\n\
         \n\
         BACKUP_RETENTION_DAYS=7\n",
        secret_key = secret(32),
        db_password = secret(16),
        redis_password = secret(16),
        pgadmin_password = secret(12),
    )
}

/// Write a generated `.env` at `path` unless one exists. Returns whether
/// a file was written.
pub fn ensure_env_file(path: &Path) -> OpsResult<bool> {
    if path.exists() {
        debug!(?path, "env file present");
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_env_file())?;
    info!(?path, "generated env file with random secrets");
    Ok(true)
}

/// Load the config for a deployment, generating `.env` on first run.
///
/// Preflight runs before anything is written, so a host that cannot
/// deploy is left untouched.
pub fn load_for_deploy<H: Host + ?Sized>(project_dir: &Path, host: &H, check_ports: bool) -> OpsResult<OpsConfig> {
    let config = OpsConfig::load(project_dir)?;
    preflight(host, &config.stack, check_ports)?;
    if ensure_env_file(&config.env_file())? {
        // Pick up the generated credentials.
        return Ok(OpsConfig::load(project_dir)?);
    }
    Ok(config)
}

/// Create each directory if missing.
pub fn ensure_dirs(dirs: &[&Path]) -> OpsResult<()> {
    for dir in dirs {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
