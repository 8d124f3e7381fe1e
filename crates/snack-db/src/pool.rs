//! # Pool
//!
//! Opens the snack database and hands out repositories.
//!
//! ```text
//! AppConfig ──► DbConfig ──► Database::new ──► SqlitePool (WAL, FKs on)
//!                                 │
//!                                 └── embedded migrations
//!
//! Database ─┬─ snacks()    ─┐
//!           ├─ people()     │  each repository borrows a clone of the pool;
//!           ├─ sales()      │  debts() also carries the overpayment policy
//!           ├─ debts()      │
//!           ├─ activity()   │
//!           └─ reports()   ─┘
//! ```
//!
//! The sale workflow and debt payments serialize on SQLite's single writer,
//! so a handful of connections is enough. `:memory:` databases live and die
//! with their only connection, which is why [`DbConfig::in_memory`] pins the
//! pool to one.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use snack_core::OverpaymentPolicy;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::activity::{ActivityLogRepository, ActivityLogger};
use crate::repository::debt::DebtRepository;
use crate::repository::person::PersonRepository;
use crate::repository::report::ReportRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::snack::SnackRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the snack database lives and how the pool around it behaves.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/snack-admin/snack.db")
///     .max_connections(4)
///     .overpayment_policy(OverpaymentPolicy::Allow);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open.
    pub database_path: PathBuf,

    /// Default 5.
    pub max_connections: u32,

    /// Default 1.
    pub min_connections: u32,

    pub connect_timeout: Duration,

    pub idle_timeout: Duration,

    /// Apply pending migrations in [`Database::new`]. Default true.
    pub run_migrations: bool,

    /// Handed to every [`DebtRepository`]. Default reject.
    pub overpayment_policy: OverpaymentPolicy,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
            overpayment_policy: OverpaymentPolicy::default(),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn overpayment_policy(mut self, policy: OverpaymentPolicy) -> Self {
        self.overpayment_policy = policy;
        self
    }

    /// A private, migrated database for one test.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
            overpayment_policy: OverpaymentPolicy::default(),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the snack database. Clones share the pool.
///
/// Admin commands reach it through `DbState`:
/// ```rust,ignore
/// let page = db.inner().snacks().list_page(Page::new(1, 20)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    overpayment_policy: OverpaymentPolicy,
}

impl Database {
    /// Opens (or creates) the database file, builds the pool and, unless
    /// disabled, applies pending migrations.
    ///
    /// ## Errors
    /// - `ConnectionFailed` for a bad path or an unreachable file
    /// - `MigrationFailed` when the schema cannot be brought up to date
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening snack database");

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // cascades from sales to sale_items and debts depend on this
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            policy = ?config.overpayment_policy,
            "Snack database pool ready"
        );

        let db = Database {
            pool,
            overpayment_policy: config.overpayment_policy,
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies the embedded snack schema migrations that are still pending.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn logger(&self) -> ActivityLogger {
        ActivityLogger::new(self.pool.clone())
    }

    pub fn snacks(&self) -> SnackRepository {
        SnackRepository::new(self.pool.clone(), self.logger())
    }

    pub fn people(&self) -> PersonRepository {
        PersonRepository::new(self.pool.clone(), self.logger())
    }

    /// The sale workflow and sale history.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone(), self.logger())
    }

    /// Debts, bound to the configured overpayment policy.
    pub fn debts(&self) -> DebtRepository {
        DebtRepository::new(self.pool.clone(), self.logger(), self.overpayment_policy)
    }

    pub fn activity(&self) -> ActivityLogRepository {
        ActivityLogRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    pub fn overpayment_policy(&self) -> OverpaymentPolicy {
        self.overpayment_policy
    }

    /// Closes the pool. Repositories handed out earlier fail afterwards.
    pub async fn close(&self) {
        info!("Closing snack database");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        let db = Database::new(config).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.overpayment_policy, OverpaymentPolicy::Reject);
    }

    #[tokio::test]
    async fn test_policy_reaches_database() {
        let config = DbConfig::in_memory().overpayment_policy(OverpaymentPolicy::Allow);
        let db = Database::new(config).await.unwrap();

        assert_eq!(db.overpayment_policy(), OverpaymentPolicy::Allow);
    }

    #[tokio::test]
    async fn test_migrations_can_be_deferred() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(applied, 0);

        db.run_migrations().await.unwrap();
        let (_, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(applied, total);
    }

    #[tokio::test]
    async fn test_schema_applied() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();

        assert_eq!(total, applied);
        assert!(total >= 1);
    }
}
