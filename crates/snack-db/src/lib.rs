//! # snack-db: Database Layer for the Snack Manager
//!
//! SQLite storage via sqlx. Repositories take domain inputs, run the rules
//! from `snack-core`, and persist the results.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Snack Manager Data Flow                             │
//! │                                                                         │
//! │  Admin command (record_sale)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     snack-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │    │   │
//! │  │   │               │    │ SnackRepo     │    │              │    │   │
//! │  │   │ SqlitePool    │◄───│ PersonRepo    │    │ 001_initial  │    │   │
//! │  │   │               │    │ SaleRepo      │    │   _schema    │    │   │
//! │  │   │               │    │ DebtRepo      │    │              │    │   │
//! │  │   │               │    │ ActivityRepo  │    │              │    │   │
//! │  │   │               │    │ ReportRepo    │    │              │    │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL, foreign keys on)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use snack_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("snacks.db")).await?;
//! let catalog = db.snacks().public_catalog("").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::activity::{ActivityLogRepository, ActivityLogger};
pub use repository::debt::DebtRepository;
pub use repository::person::PersonRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::snack::SnackRepository;
