use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_USER: &str = "root";
const DEFAULT_DB_PASSWORD: &str = "sath";
const DEFAULT_DB_NAME: &str = "swiftrefund";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Database settings. The store is an embedded SQLite file named after
/// `name`; host, user and password identify the deployment in logs and
/// default to local development values.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// SQLite path for `name`: `:memory:` and names that already look like a
    /// path are used as given, a bare name gets a `.db` suffix.
    pub fn path(&self) -> String {
        if self.name == ":memory:" || self.name.ends_with(".db") || self.name.contains('/') {
            self.name.clone()
        } else {
            format!("{}.db", self.name)
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASSWORD.to_string(),
            name: DEFAULT_DB_NAME.to_string(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("name", &self.name)
            .field("busy_timeout", &self.busy_timeout)
            .finish()
    }
}

/// Runtime configuration, built once in `main` and handed to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: DatabaseConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if present) and then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Unset or blank
    /// variables fall back to the development defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get("SWIFTREFUND_HOST") {
            config.host = host;
        }
        if let Some(port) = get("SWIFTREFUND_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "SWIFTREFUND_PORT",
                value: port.clone(),
            })?;
        }

        let db = &mut config.database;
        if let Some(host) = get("SWIFTREFUND_DB_HOST") {
            db.host = host;
        }
        if let Some(user) = get("SWIFTREFUND_DB_USER") {
            db.user = user;
        }
        // Passwords are taken verbatim, surrounding whitespace included.
        if let Some(password) = lookup("SWIFTREFUND_DB_PASSWORD") {
            db.password = password;
        }
        if let Some(name) = get("SWIFTREFUND_DB_NAME") {
            db.name = name;
        }
        if let Some(timeout) = get("SWIFTREFUND_DB_BUSY_TIMEOUT_MS") {
            let ms: u64 = timeout.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "SWIFTREFUND_DB_BUSY_TIMEOUT_MS",
                value: timeout.clone(),
            })?;
            db.busy_timeout = Duration::from_millis(ms);
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
