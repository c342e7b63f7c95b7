//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx over SQLite.
//! It follows the Repository pattern to provide clean abstractions over
//! database operations.
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! Repositories wrap a `&mut SqliteConnection`, so callers decide whether an
//! operation runs on a pool connection or inside a transaction. Uniqueness is
//! enforced by the schema (partial unique indexes on `username` and
//! `external_id`), never by a separate read-then-write.

pub mod errors;
pub mod handlers;
pub mod models;
