//! Runtime settings read from the environment and the `.env` file.
//!
//! Settings are resolved once into an immutable [`Environment`]. The
//! lookup is injected so callers (and tests) decide where values come
//! from; [`Environment::load`] layers the process environment over the
//! `.env` file.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::ConfigError;

/// Production vs development behaviour (sample data seeding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Production,
    Development,
}

impl Mode {
    /// Anything other than `development` is production.
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("development") {
            Mode::Development
        } else {
            Mode::Production
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

/// Credentials for the pgAdmin web UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPanelSettings {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub mode: Mode,
    pub admin_panel: AdminPanelSettings,
    pub backup_retention_days: u32,
}

impl Environment {
    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database: DatabaseSettings {
                host: get("DB_HOST", "localhost"),
                port: parse_var(&lookup, "DB_PORT", 5432)?,
                user: get("POSTGRES_USER", "fastfood"),
                password: get("POSTGRES_PASSWORD", ""),
                name: get("POSTGRES_DB", "fastfood_db"),
            },
            cache: CacheSettings {
                host: get("REDIS_HOST", "localhost"),
                port: parse_var(&lookup, "REDIS_PORT", 6379)?,
                password: lookup("REDIS_PASSWORD").filter(|p| !p.is_empty()),
            },
            mode: Mode::from_flag(&get("FLASK_ENV", "production")),
            admin_panel: AdminPanelSettings {
                email: get("PGADMIN_DEFAULT_EMAIL", "admin@fastfood.local"),
                password: get("PGADMIN_DEFAULT_PASSWORD", ""),
            },
            backup_retention_days: parse_var(&lookup, "BACKUP_RETENTION_DAYS", 7)?,
        })
    }

    /// Process environment layered over the `.env` file at `env_file`.
    ///
    /// A missing `.env` file is not an error.
    pub fn load(env_file: &Path) -> Result<Self, ConfigError> {
        let file_vars = if env_file.is_file() {
            load_env_file(env_file)?
        } else {
            debug!(path = ?env_file, "no env file, using process environment only");
            HashMap::new()
        };

        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_vars.get(key).cloned())
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            })
        }
        _ => Ok(default),
    }
}

/// Parse `KEY=VALUE` lines of a dotenv file.
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is
/// allowed, and one pair of surrounding quotes is stripped from values.
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        vars.insert(key.trim().to_string(), unquote(value.trim()).to_string());
    }
    vars
}

pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(parse_env_file(&content))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let env = Environment::from_lookup(|_| None).unwrap();
        assert_eq!(env.database.host, "localhost");
        assert_eq!(env.database.port, 5432);
        assert_eq!(env.database.user, "fastfood");
        assert_eq!(env.database.name, "fastfood_db");
        assert_eq!(env.cache.port, 6379);
        assert_eq!(env.cache.password, None);
        assert_eq!(env.mode, Mode::Production);
        assert_eq!(env.backup_retention_days, 7);
    }

    #[test]
    fn reads_every_setting() {
        let env = Environment::from_lookup(lookup_from(&[
            ("DB_HOST", "db"),
            ("DB_PORT", "6543"),
            ("POSTGRES_USER", "ops"),
            ("POSTGRES_PASSWORD", "s3cret"),
            ("POSTGRES_DB", "orders"),
            ("REDIS_HOST", "cache"),
            ("REDIS_PORT", "7000"),
            ("REDIS_PASSWORD", "r3dis"),
            ("FLASK_ENV", "development"),
            ("PGADMIN_DEFAULT_EMAIL", "ops@example.com"),
            ("PGADMIN_DEFAULT_PASSWORD", "pg"),
            ("BACKUP_RETENTION_DAYS", "14"),
        ]))
        .unwrap();

        assert_eq!(env.database.host, "db");
        assert_eq!(env.database.port, 6543);
        assert_eq!(env.database.user, "ops");
        assert_eq!(env.database.password, "s3cret");
        assert_eq!(env.database.name, "orders");
        assert_eq!(env.cache.host, "cache");
        assert_eq!(env.cache.port, 7000);
        assert_eq!(env.cache.password.as_deref(), Some("r3dis"));
        assert_eq!(env.mode, Mode::Development);
        assert_eq!(env.admin_panel.email, "ops@example.com");
        assert_eq!(env.backup_retention_days, 14);
    }

    #[test]
    fn invalid_port_is_config_error() {
        let err = Environment::from_lookup(lookup_from(&[("DB_PORT", "five")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "DB_PORT"));
    }

    #[test]
    fn empty_redis_password_means_none() {
        let env = Environment::from_lookup(lookup_from(&[("REDIS_PASSWORD", "")])).unwrap();
        assert_eq!(env.cache.password, None);
    }

    #[test]
    fn mode_flag_is_case_insensitive() {
        assert_eq!(Mode::from_flag("Development"), Mode::Development);
        assert_eq!(Mode::from_flag("staging"), Mode::Production);
    }

    #[test]
    fn parse_env_file_handles_comments_quotes_and_export() {
        let vars = parse_env_file(
            "# database\nPOSTGRES_USER=fastfood\n\nexport POSTGRES_PASSWORD=\"p@ss word\"\nSECRET_KEY='abc'\nnot a pair\n",
        );
        assert_eq!(vars.get("POSTGRES_USER").map(String::as_str), Some("fastfood"));
        assert_eq!(vars.get("POSTGRES_PASSWORD").map(String::as_str), Some("p@ss word"));
        assert_eq!(vars.get("SECRET_KEY").map(String::as_str), Some("abc"));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn load_reads_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "POSTGRES_DB=from_file_db_unique_name\n").unwrap();

        let env = Environment::load(&path).unwrap();
        if std::env::var("POSTGRES_DB").is_err() {
            assert_eq!(env.database.name, "from_file_db_unique_name");
        }
    }

    #[test]
    fn load_without_env_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Environment::load(&dir.path().join(".env")).is_ok());
    }
}
