//! HTTP layer: route handlers and the request/response models they speak.
//!
//! - **[`handlers`]**: Axum route handlers for the page and auth surface
//! - **[`models`]**: Form payloads and page view models

pub mod handlers;
pub mod models;
