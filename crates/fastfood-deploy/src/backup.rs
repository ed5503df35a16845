//! Database snapshots: backup, restore, and retention.
//!
//! A snapshot is a timestamped directory holding a compressed
//! `pg_dump -Fc` archive, copies of the stack's config files, and a
//! manifest.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use fastfood_core::{OpsConfig, OpsError, OpsResult, ServiceSpec};
use fastfood_health::{Clock, Prober, Readiness, wait_ready};

use crate::supervisor::Supervisor;

pub const DUMP_FILE: &str = "database.dump";
pub const MANIFEST_FILE: &str = "MANIFEST.txt";
pub const DB_SERVICE: &str = "db";

/// Snapshot directory names sort chronologically.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A backup written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSnapshot {
    pub timestamp: String,
    pub dir: PathBuf,
    pub dump: PathBuf,
    /// Config files and directories copied next to the dump.
    pub aux_files: Vec<PathBuf>,
    pub retention_days: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreOptions {
    /// Also put the snapshot's `.env` back in place.
    pub restore_env: bool,
}

pub struct BackupManager<'a, S: ?Sized, P: ?Sized, C: ?Sized> {
    config: &'a OpsConfig,
    supervisor: &'a S,
    prober: &'a P,
    clock: &'a C,
}

impl<'a, S, P, C> BackupManager<'a, S, P, C>
where
    S: Supervisor + ?Sized,
    P: Prober + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(config: &'a OpsConfig, supervisor: &'a S, prober: &'a P, clock: &'a C) -> Self {
        Self {
            config,
            supervisor,
            prober,
            clock,
        }
    }

    pub async fn backup(&self) -> OpsResult<BackupSnapshot> {
        self.backup_at(Local::now()).await
    }

    /// Dump the database and copy config files into a new snapshot directory.
    pub async fn backup_at(&self, now: DateTime<Local>) -> OpsResult<BackupSnapshot> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let root = self.config.backup_dir();
        std::fs::create_dir_all(&root)?;
        let dir = create_unique_dir(&root, &timestamp)?;

        info!(dir = ?dir, "backing up database");
        let snapshot = match self.write_snapshot(timestamp, &dir).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Leave no partial snapshot behind for restore to pick up.
                if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                    warn!(dir = ?dir, error = %cleanup, "could not remove partial snapshot");
                }
                return Err(e);
            }
        };

        info!(dir = ?snapshot.dir, files = snapshot.aux_files.len() + 1, "backup complete");
        Ok(snapshot)
    }

    /// Replace the database with the snapshot in `dir`.
    ///
    /// Destructive: stops the stack, replays the dump into a freshly
    /// started database, then starts everything again. Nothing is touched
    /// when `dir` or its dump is missing.
    pub async fn restore(&self, dir: &Path, options: RestoreOptions) -> OpsResult<()> {
        let dump = dir.join(DUMP_FILE);
        if !dir.is_dir() || !dump.is_file() {
            return Err(OpsError::RestoreTargetMissing(dir.to_path_buf()));
        }
        let db = self.db_spec()?;
        let archive = std::fs::read(&dump)?;

        info!(dir = ?dir, "restoring backup, stopping services");
        self.supervisor.down().await?;
        self.supervisor.up(&[db.name.clone()]).await?;

        if let Readiness::TimedOut { attempts } =
            wait_ready(self.prober, self.clock, &db.name, &db.readiness, &db.budget).await
        {
            return Err(OpsError::ProbeTimedOut {
                service: db.name.clone(),
                attempts,
            });
        }

        let output = self
            .supervisor
            .exec(
                &db.name,
                &self.pg_command("pg_restore", &["--clean", "--if-exists", "--no-owner"]),
                Some(archive),
            )
            .await?;
        if !output.success {
            return Err(OpsError::Supervisor(format!(
                "pg_restore failed: {}",
                output.stderr.trim()
            )));
        }
        info!("database restored");

        if options.restore_env {
            let saved_env = dir.join(file_name(&self.config.env_file()));
            if saved_env.is_file() {
                std::fs::copy(&saved_env, self.config.env_file())?;
                info!("environment file restored");
            } else {
                warn!(path = ?saved_env, "snapshot has no env file, keeping current");
            }
        }

        self.supervisor.up(&[]).await?;
        info!("services restarted");
        Ok(())
    }

    async fn write_snapshot(&self, timestamp: String, dir: &Path) -> OpsResult<BackupSnapshot> {
        let output = self
            .supervisor
            .exec(DB_SERVICE, &self.pg_command("pg_dump", &["-Fc"]), None)
            .await?;
        if !output.success {
            return Err(OpsError::Supervisor(format!("pg_dump failed: {}", output.stderr.trim())));
        }
        let dump = dir.join(DUMP_FILE);
        std::fs::write(&dump, &output.stdout)?;
        debug!(bytes = output.stdout.len(), "database dump written");

        let mut aux_files = Vec::new();
        for source in [self.config.env_file(), self.config.compose_file(), self.config.cert_dir()] {
            if let Some(copied) = copy_into(&source, dir)? {
                aux_files.push(copied);
            }
        }

        let snapshot = BackupSnapshot {
            timestamp,
            dir: dir.to_path_buf(),
            dump,
            aux_files,
            retention_days: self.config.env.backup_retention_days,
        };
        std::fs::write(dir.join(MANIFEST_FILE), self.manifest(&snapshot))?;
        Ok(snapshot)
    }

    fn db_spec(&self) -> OpsResult<&ServiceSpec> {
        self.config.service(DB_SERVICE).ok_or_else(|| {
            OpsError::Supervisor(format!("no `{DB_SERVICE}` service configured"))
        })
    }

    fn pg_command(&self, program: &str, extra: &[&str]) -> Vec<String> {
        let db = &self.config.env.database;
        let mut command = vec![
            program.to_string(),
            "-U".to_string(),
            db.user.clone(),
            "-d".to_string(),
            db.name.clone(),
        ];
        command.extend(extra.iter().map(|s| s.to_string()));
        command
    }

    fn manifest(&self, snapshot: &BackupSnapshot) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "FastFood backup");
        let _ = writeln!(text, "timestamp: {}", snapshot.timestamp);
        let _ = writeln!(text, "database:  {}", self.config.env.database.name);
        let _ = writeln!(text, "retention: {} days", snapshot.retention_days);
        let _ = writeln!(text);
        let _ = writeln!(text, "contents:");
        let _ = writeln!(text, "  {DUMP_FILE} (pg_dump custom format)");
        for path in &snapshot.aux_files {
            let suffix = if path.is_dir() { "/" } else { "" };
            let _ = writeln!(text, "  {}{suffix}", file_name(path));
        }
        let _ = writeln!(text);
        let _ = writeln!(text, "restore with:");
        let _ = writeln!(text, "  fastfood restore {}", snapshot.dir.display());
        text
    }
}

/// Delete snapshots whose age exceeds `retention`.
///
/// Age comes from the modification time of the snapshot's dump (or of
/// the entry itself when there is no dump). Returns the removed paths.
pub fn prune_snapshots(backup_dir: &Path, retention: Duration, now: SystemTime) -> OpsResult<Vec<PathBuf>> {
    if !backup_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    for entry in std::fs::read_dir(backup_dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(dir = ?backup_dir, error = %e, "unreadable backup entry, skipped");
                continue;
            }
        };
        let age = match snapshot_age(&path, now) {
            Ok(age) => age,
            Err(e) => {
                warn!(path = ?path, error = %e, "cannot determine backup age, skipped");
                continue;
            }
        };
        if age <= retention {
            continue;
        }

        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        if let Err(e) = result {
            warn!(path = ?path, error = %e, "could not remove expired backup");
            continue;
        }
        info!(path = ?path, age_days = age.as_secs() / 86_400, "removed expired backup");
        removed.push(path);
    }
    removed.sort();
    Ok(removed)
}

/// Age of a snapshot entry. Future mtimes count as fresh.
fn snapshot_age(path: &Path, now: SystemTime) -> std::io::Result<Duration> {
    let reference = if path.is_dir() && path.join(DUMP_FILE).is_file() {
        path.join(DUMP_FILE)
    } else {
        path.to_path_buf()
    };
    let modified = std::fs::metadata(&reference)?.modified()?;
    Ok(now.duration_since(modified).unwrap_or_default())
}

pub fn retention_window(days: u32) -> Duration {
    Duration::from_secs(u64::from(days) * 24 * 60 * 60)
}

fn create_unique_dir(root: &Path, name: &str) -> OpsResult<PathBuf> {
    let mut candidate = root.join(name);
    let mut n = 1;
    loop {
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                candidate = root.join(format!("{name}_{n}"));
                n += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Copy a file or directory tree into `dest_dir`. Missing sources are
/// skipped with a warning.
fn copy_into(source: &Path, dest_dir: &Path) -> OpsResult<Option<PathBuf>> {
    if !source.exists() {
        warn!(path = ?source, "not found, skipped in backup");
        return Ok(None);
    }
    let target = dest_dir.join(file_name(source));

    if source.is_file() {
        std::fs::copy(source, &target)?;
        return Ok(Some(target));
    }

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| OpsError::Io(std::io::Error::other(e.to_string())))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| OpsError::Io(std::io::Error::other(e.to_string())))?;
        let dest = target.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn age_file(path: &Path, now: SystemTime, days: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(now - Duration::from_secs(days * 86_400)).unwrap();
    }

    fn snapshot_dir(root: &Path, name: &str, now: SystemTime, age_days: u64) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let dump = dir.join(DUMP_FILE);
        std::fs::write(&dump, b"PGDMP").unwrap();
        age_file(&dump, now, age_days);
        dir
    }

    #[test]
    fn prune_removes_only_expired_snapshots() {
        let root = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        let old = snapshot_dir(root.path(), "20260901_020000", now, 30);
        let recent = snapshot_dir(root.path(), "20261015_020000", now, 3);

        let removed = prune_snapshots(root.path(), retention_window(7), now).unwrap();

        assert_eq!(removed, vec![old.clone()]);
        assert!(!old.exists());
        assert!(recent.exists());
    }

    #[test]
    fn prune_handles_loose_dump_files() {
        let root = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        let loose = root.path().join("fastfood_20260801.sql.gz");
        std::fs::write(&loose, b"old").unwrap();
        age_file(&loose, now, 60);

        let removed = prune_snapshots(root.path(), retention_window(7), now).unwrap();
        assert_eq!(removed, vec![loose]);
    }

    #[test]
    fn prune_keeps_snapshot_at_window_edge() {
        let root = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        let edge = snapshot_dir(root.path(), "edge", now, 7);

        let removed = prune_snapshots(root.path(), retention_window(7), now).unwrap();

        assert!(removed.is_empty());
        assert!(edge.exists());
    }

    #[cfg(unix)]
    #[test]
    fn prune_skips_unreadable_entries_and_continues() {
        let root = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        std::os::unix::fs::symlink(root.path().join("gone"), root.path().join("dangling")).unwrap();
        let old = snapshot_dir(root.path(), "20260901_020000", now, 30);

        let removed = prune_snapshots(root.path(), retention_window(7), now).unwrap();

        assert_eq!(removed, vec![old]);
        assert!(root.path().join("dangling").symlink_metadata().is_ok());
    }

    #[test]
    fn prune_missing_backup_dir_is_noop() {
        let root = tempfile::tempdir().unwrap();
        let removed =
            prune_snapshots(&root.path().join("nope"), retention_window(7), SystemTime::now()).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn unique_dir_appends_suffix() {
        let root = tempfile::tempdir().unwrap();
        let first = create_unique_dir(root.path(), "20261019_120000").unwrap();
        let second = create_unique_dir(root.path(), "20261019_120000").unwrap();
        assert_ne!(first, second);
        assert!(second.ends_with("20261019_120000_1"));
    }

    #[test]
    fn copy_into_copies_trees_and_skips_missing() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let ssl = src.path().join("ssl");
        std::fs::create_dir_all(ssl.join("nested")).unwrap();
        std::fs::write(ssl.join("cert.pem"), "cert").unwrap();
        std::fs::write(ssl.join("nested/extra.pem"), "extra").unwrap();

        let copied = copy_into(&ssl, dest.path()).unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(copied.join("cert.pem")).unwrap(), "cert");
        assert_eq!(
            std::fs::read_to_string(copied.join("nested/extra.pem")).unwrap(),
            "extra"
        );

        assert!(copy_into(&src.path().join("missing.yml"), dest.path()).unwrap().is_none());
    }
}
