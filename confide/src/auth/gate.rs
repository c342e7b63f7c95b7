//! The authorization gate for routes that require an authenticated session.

use crate::auth::session::Resolution;
use crate::types::AccountId;

/// Where unauthenticated requests are sent.
pub const LOGIN_PAGE: &str = "/login";

/// Gate decision for a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Admit(AccountId),
    RedirectTo(&'static str),
}

/// Admit iff the session resolved to an identity *and* the account behind it
/// still exists. Existence is re-checked per request rather than trusted from
/// the resolution: an account can be deleted while its sessions are live.
pub fn authorize(resolution: Resolution, account_exists: bool) -> Access {
    match resolution {
        Resolution::Authenticated(account_id) if account_exists => Access::Admit(account_id),
        Resolution::Authenticated(_) | Resolution::Anonymous => Access::RedirectTo(LOGIN_PAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_admits_live_account() {
        let id = Uuid::new_v4();
        assert_eq!(authorize(Resolution::Authenticated(id), true), Access::Admit(id));
    }

    #[test]
    fn test_redirects_anonymous() {
        assert_eq!(authorize(Resolution::Anonymous, false), Access::RedirectTo(LOGIN_PAGE));
        // Account existence alone is not enough without a session
        assert_eq!(authorize(Resolution::Anonymous, true), Access::RedirectTo(LOGIN_PAGE));
    }

    #[test]
    fn test_redirects_session_for_deleted_account() {
        let id = Uuid::new_v4();
        assert_eq!(authorize(Resolution::Authenticated(id), false), Access::RedirectTo(LOGIN_PAGE));
    }
}
