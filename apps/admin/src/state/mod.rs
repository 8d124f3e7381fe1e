//! # State Module
//!
//! Application state for the admin command layer.
//!
//! Instead of a single `AppState` struct, each concern has its own type and
//! every command declares exactly the pieces it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │   DbState    │  │ SessionState │  │  CartState   │  │ AppConfig  │  │
//! │  │              │  │              │  │              │  │            │  │
//! │  │  Database    │  │  configured  │  │  Arc<Mutex<  │  │  paths,    │  │
//! │  │  (SQLite     │  │  users +     │  │    Cart      │  │  policy,   │  │
//! │  │   pool)      │  │  RwLock<User>│  │  >>          │  │  users     │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • SessionState: current user behind an RwLock                         │
//! │  • CartState: Protected by Arc<Mutex<T>> for exclusive access          │
//! │  • AppConfig: Read-only after initialization                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;
mod session;

pub use cart::CartState;
pub use self::config::{AppConfig, ConfiguredUser, CONFIG_FILE};
pub use db::DbState;
pub use session::{hash_password, verify_password, SessionState};
