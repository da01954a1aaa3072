//! Database connection configuration.
//!
//! Connection parameters are read from a small INI-format file at a
//! well-known per-user path, with environment variables taking precedence
//! field-by-field. This mirrors the teacher's `DATABASE_URL`-env-override
//! convention, generalized to the source's `configparser`-per-field style.

use std::path::{Path, PathBuf};

use crate::{ConfigError, ConfigResult};

const ENV_USER: &str = "PDOFLOW_DB_USER";
const ENV_PASSWORD: &str = "PDOFLOW_DB_PASSWORD";
const ENV_HOST: &str = "PDOFLOW_DB_HOST";
const ENV_PORT: &str = "PDOFLOW_DB_PORT";
const ENV_DATABASE: &str = "PDOFLOW_DB_NAME";

/// Connection parameters for the DB: user, password, host, port, database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DbConfig {
    /// The default per-user config file location: `~/.config/pdoflow/pdoflow.ini`.
    pub fn default_path() -> ConfigResult<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("pdoflow").join("pdoflow.ini"))
    }

    /// Load from the default per-user path, applying environment overrides.
    /// If the file does not exist, falls back to built-in defaults before
    /// applying overrides (so a bare `PDOFLOW_DB_*` environment is enough
    /// to run without ever writing a config file).
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default().with_env_overrides())
        }
    }

    /// Load from an explicit path, applying environment overrides.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let conf = ini::Ini::load_from_file(path)?;
        let section = conf.section(Some("database"));

        let defaults = Self::default();
        let get = |key: &str, default: &str| -> String {
            section
                .and_then(|s| s.get(key))
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string())
        };

        let port = section
            .and_then(|s| s.get("port"))
            .map(|p| {
                p.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                    field: "port".to_string(),
                    message: format!("not a valid port number: {p}"),
                })
            })
            .transpose()?
            .unwrap_or(defaults.port);

        Ok(Self {
            user: get("user", &defaults.user),
            password: get("password", &defaults.password),
            host: get("host", &defaults.host),
            port,
            database: get("database", &defaults.database),
        }
        .with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var(ENV_USER) {
            self.user = v;
        }
        if let Ok(v) = std::env::var(ENV_PASSWORD) {
            self.password = v;
        }
        if let Ok(v) = std::env::var(ENV_HOST) {
            self.host = v;
        }
        if let Ok(v) = std::env::var(ENV_PORT) {
            if let Ok(p) = v.parse() {
                self.port = p;
            }
        }
        if let Ok(v) = std::env::var(ENV_DATABASE) {
            self.database = v;
        }
        self
    }

    /// Build the `postgres://` connection string consumed by `pdoflow_db::create_pool`.
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            user: "pdoflow".to_string(),
            password: "pdoflow".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5432,
            database: "pdoflow".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_ini_file() {
        let mut file = tempfile_ini(
            "[database]\nuser = alice\npassword = secret\nhost = db.internal\nport = 6543\ndatabase = pdoflow_prod\n",
        );
        let config = DbConfig::load_from(file.path()).unwrap();
        assert_eq!(config.user, "alice");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.database, "pdoflow_prod");
        file.flush().ok();
    }

    #[test]
    fn falls_back_to_defaults_for_missing_fields() {
        let file = tempfile_ini("[database]\nuser = alice\n");
        let config = DbConfig::load_from(file.path()).unwrap();
        assert_eq!(config.user, "alice");
        assert_eq!(config.host, DbConfig::default().host);
        assert_eq!(config.port, DbConfig::default().port);
    }

    #[test]
    fn rejects_non_numeric_port() {
        let file = tempfile_ini("[database]\nport = not-a-number\n");
        let err = DbConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn builds_connection_string() {
        let config = DbConfig {
            user: "u".into(),
            password: "p".into(),
            host: "h".into(),
            port: 1,
            database: "d".into(),
        };
        assert_eq!(config.connection_string(), "postgres://u:p@h:1/d");
    }

    fn tempfile_ini(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }
}
