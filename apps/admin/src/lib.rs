//! # Snack Admin Library
//!
//! Command layer between the admin UI and the snack database.
//!
//! ## Module Organization
//! ```text
//! snack_admin/
//! ├── lib.rs          ◄─── You are here (bootstrap, tracing)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── config.rs   ◄─── AppConfig (file + SNACK_* env)
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── session.rs  ◄─── Signed-in user, argon2 checks
//! │   └── cart.rs     ◄─── Cart state management
//! ├── commands/       ◄─── One module per area (snack, person, sale, ...)
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State Management (Multiple State Types)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    AdminApp                                             │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │  AppConfig   │ │   DbState    │ │ SessionState │ │  CartState   │   │
//! │  │              │ │              │ │              │ │              │   │
//! │  │  • db path   │ │  • pool      │ │  • users     │ │  • lines     │   │
//! │  │  • policy    │ │  • repos     │ │  • current   │ │  • totals    │   │
//! │  │  • page size │ │              │ │              │ │              │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │                                                                         │
//! │  Each command takes only the pieces it needs:                          │
//! │    commands::debt::add_debt_payment(&app.db, &app.session, id, req)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use ::config::ConfigError;
use snack_db::{Database, DbError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use state::{AppConfig, CartState, DbState, SessionState};

/// Filter used when neither `RUST_LOG` nor `log_filter` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,snack=debug,sqlx=warn";

/// Startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not resolve database path: {0}")]
    DataDir(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

/// Everything a UI host needs to serve commands.
#[derive(Debug)]
pub struct AdminApp {
    pub config: AppConfig,
    pub db: DbState,
    pub session: SessionState,
    pub cart: CartState,
}

impl AdminApp {
    /// Builds the application state from a loaded config.
    ///
    /// ## Startup Sequence
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────────┐
    /// │  1. Resolve database path ── config value or platform data dir         │
    /// │  2. Connect ─────────────── SQLite, WAL, foreign keys on               │
    /// │  3. Migrate ─────────────── embedded migrations                        │
    /// │  4. State ───────────────── DbState, SessionState(users), CartState    │
    /// └─────────────────────────────────────────────────────────────────────────┘
    /// ```
    pub async fn start(config: AppConfig) -> Result<Self, StartupError> {
        let db_config = config.db_config()?;
        info!(path = ?db_config.database_path, policy = ?config.overpayment_policy, "Opening database");

        let db = Database::new(db_config).await?;
        info!(users = config.admin_users.len(), "Database ready");

        Ok(Self::with_database(config, db))
    }

    /// Wraps an already open database.
    pub fn with_database(config: AppConfig, db: Database) -> Self {
        AdminApp {
            session: SessionState::new(config.admin_users.clone()),
            db: DbState::new(db),
            cart: CartState::new(),
            config,
        }
    }

    pub async fn shutdown(&self) {
        self.session.logout();
        self.db.inner().close().await;
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Filter Precedence
/// 1. `RUST_LOG`
/// 2. `log_filter` from the config
/// 3. [`DEFAULT_LOG_FILTER`]
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        config
            .log_filter
            .as_deref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
