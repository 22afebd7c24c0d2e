//! # growhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `RuleRepository` and `TriggerHistory` from `growhub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `growhub-app` (for port traits) and `growhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod rule_repo;
pub mod trigger_history;

pub use pool::{Config, Database};
pub use rule_repo::SqliteRuleRepository;
pub use trigger_history::SqliteTriggerHistory;
