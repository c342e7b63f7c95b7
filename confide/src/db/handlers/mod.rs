//! Repository implementations for database access.
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Accounts`]: account management, credential lookup, and the
//!   find-or-create path used by federated login

pub mod accounts;
pub mod repository;

pub use accounts::Accounts;
pub use repository::Repository;
