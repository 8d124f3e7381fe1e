//! # Configuration State
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`SNACK_*`, e.g. `SNACK_DATABASE_PATH`)
//! 2. Config file (`snack-admin.toml`, optional)
//! 3. Defaults (this file)
//!
//! ## Example `snack-admin.toml`
//! ```toml
//! database_path = "/srv/snacks/snack.db"
//! overpayment_policy = "allow"
//! page_size = 20
//! log_filter = "info,snack=debug"
//!
//! [[admin_users]]
//! username = "ana"
//! password_hash = "$argon2id$v=19$m=19456,t=2,p=1$..."
//! role = "admin"
//! ```
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no lock is needed.

use std::path::{Path, PathBuf};

use ::config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use snack_core::{OverpaymentPolicy, Page, Role};
use snack_db::DbConfig;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "snack-admin.toml";

/// Database file name inside the platform data directory.
const DB_FILE: &str = "snack.db";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file. `None` means the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Maximum pool connections
    pub max_connections: u32,

    /// What to do with a payment above the remaining balance
    pub overpayment_policy: OverpaymentPolicy,

    /// Rows per page in the admin lists
    pub page_size: u32,

    /// `EnvFilter` directive. `RUST_LOG` wins when set.
    #[serde(default)]
    pub log_filter: Option<String>,

    /// Users allowed to sign in
    #[serde(default)]
    pub admin_users: Vec<ConfiguredUser>,
}

/// A user entry from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfiguredUser {
    pub username: String,

    /// Argon2 PHC string, see `snack-admin hash-password`.
    pub password_hash: String,

    #[serde(default)]
    pub role: Role,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: None,
            max_connections: 5,
            overpayment_policy: OverpaymentPolicy::Reject,
            page_size: Page::DEFAULT_SIZE,
            log_filter: None,
            admin_users: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads `snack-admin.toml` from the working directory plus `SNACK_*`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Loads from an explicit file. A missing file is not an error.
    ///
    /// ## Errors
    /// Malformed file or a value that does not deserialize
    /// (e.g. `SNACK_OVERPAYMENT_POLICY=sometimes`).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let settings = Config::builder()
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("overpayment_policy", "reject")?
            .set_default("page_size", i64::from(defaults.page_size))?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("SNACK").try_parsing(true))
            .build()?;

        settings.try_deserialize()
    }

    /// Page helper for list commands.
    pub fn page(&self, number: u32) -> Page {
        Page::new(number, self.page_size)
    }

    /// Resolves the database file, creating the data directory if needed.
    ///
    /// ## Platform Paths
    /// - macOS: `~/Library/Application Support/com.snack.manager/snack.db`
    /// - Windows: `%APPDATA%\snack\manager\data\snack.db`
    /// - Linux: `~/.local/share/manager/snack.db`
    pub fn resolved_database_path(&self) -> std::io::Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("com", "snack", "manager").ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine a data directory",
            )
        })?;
        let dir = dirs.data_dir();
        std::fs::create_dir_all(dir)?;
        Ok(dir.join(DB_FILE))
    }

    /// Database settings derived from this config.
    pub fn db_config(&self) -> std::io::Result<DbConfig> {
        Ok(DbConfig::new(self.resolved_database_path()?)
            .max_connections(self.max_connections)
            .overpayment_policy(self.overpayment_policy))
    }
}
