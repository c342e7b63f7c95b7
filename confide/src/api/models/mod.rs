//! Form payloads and page view models.

pub mod accounts;
