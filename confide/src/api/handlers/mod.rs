//! HTTP request handlers.
//!
//! - [`auth`]: registration, login, logout, and the federation flow
//! - [`pages`]: the public pages (landing, form pages)
//! - [`secrets`]: secret listing and submission

pub mod auth;
pub mod pages;
pub mod secrets;
