//! Authentication and session management.
//!
//! Two login paths produce the same thing - an account id bound to a fresh
//! session token:
//!
//! - **Local**: username/password, verified against an Argon2id hash
//!   ([`local`], [`password`]).
//! - **Federated**: an OAuth authorization-code exchange that maps the
//!   provider's subject id onto a local account ([`oauth`]).
//!
//! Sessions are opaque server-side tokens ([`session`]); the browser carries
//! an HMAC-signed cookie whose only payload is the token itself. Protected
//! routes go through the [`gate`] via the [`current_account::CurrentAccount`]
//! extractor, which re-checks that the account behind a session still exists
//! before admitting a request.

pub mod current_account;
pub mod gate;
pub mod local;
pub mod oauth;
pub mod password;
pub mod session;
