//! # econwatch Database Crate
//!
//! This crate is the system's canonical indicator store and alert archive.
//!
//! ## Architectural Principles
//!
//! - **Adapter Layer:** The rest of the application talks to the `IndicatorStore` and
//!   `AlertSink` traits only. The SQL and the storage technology stay in here.
//! - **Atomic per Key:** Every upsert is decided and applied atomically for its
//!   (country, indicator, year) key, so concurrent syncs never need locks of their own.
//! - **Two Backends:** `DbRepository` persists to PostgreSQL through a pooled `sqlx`
//!   connection; `MemoryStore` keeps everything in process for development and tests.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool setup and schema migrations.
//! - `IndicatorStore`, `AlertSink`: the storage contracts.
//! - `decide_upsert` / `UpsertOutcome`: the last-writer-wins rule shared by both backends.
//! - `DbRepository`, `MemoryStore`: the implementations.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::MemoryStore;
pub use repository::DbRepository;
pub use store::{
    decide_upsert, settle_write, AlertSink, IndicatorStore, SourceStats, UpsertOutcome,
};
