//! Shared constructors for tests.

use axum::http::header;
use axum_test::{TestResponse, TestServer};
use sqlx::SqlitePool;

use crate::{
    auth::{local, oauth::OAuthClient, session::SessionManager},
    config::{Config, OAuthProviderConfig},
    db::models::accounts::AccountDBResponse,
    AppState,
};

/// Test configuration: signing key set, fast Argon2 parameters, plain-HTTP
/// cookies.
pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-for-sessions".to_string()),
        ..Config::default()
    };
    config.auth.session.cookie_secure = false;
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config
}

/// Provider configuration pointing at `base` (usually a wiremock server).
pub fn create_test_provider_config(base: &str) -> OAuthProviderConfig {
    OAuthProviderConfig {
        enabled: true,
        client_id: "test-client".to_string(),
        client_secret: "test-client-secret".to_string(),
        authorize_url: format!("{base}/authorize").parse().unwrap(),
        token_url: format!("{base}/token").parse().unwrap(),
        profile_url: format!("{base}/userinfo").parse().unwrap(),
        scopes: vec!["email".to_string(), "profile".to_string()],
        ..OAuthProviderConfig::default()
    }
}

pub fn create_test_state(pool: SqlitePool) -> AppState {
    create_test_state_with_provider(pool, "http://localhost:0")
}

pub fn create_test_state_with_provider(pool: SqlitePool, provider_base: &str) -> AppState {
    let mut config = create_test_config();
    config.auth.provider = create_test_provider_config(provider_base);

    let sessions = SessionManager::new(config.auth.session.timeout);
    let oauth = OAuthClient::new(config.auth.provider.clone()).expect("test provider client");

    AppState::builder()
        .db(pool)
        .config(config)
        .sessions(sessions)
        .oauth(oauth)
        .build()
}

/// A test server over the full router, plus the state behind it.
pub fn create_test_app(pool: SqlitePool) -> (TestServer, AppState) {
    create_test_app_with_state(pool, "http://localhost:0")
}

pub fn create_test_app_with_state(pool: SqlitePool, provider_base: &str) -> (TestServer, AppState) {
    let state = create_test_state_with_provider(pool, provider_base);
    let server = TestServer::new(crate::build_router(state.clone())).expect("Failed to create test server");
    (server, state)
}

/// Register a local account directly through the strategy layer.
pub async fn create_test_account(state: &AppState, username: &str, password: &str) -> AccountDBResponse {
    let mut conn = state.db.acquire().await.expect("acquire test connection");
    local::register(&mut conn, &state.config.auth.password, username, password)
        .await
        .expect("register test account")
}

/// The `name=value` cookie pair for a session token, signed like the server
/// signs it.
pub fn signed_session_cookie(state: &AppState, token: &str) -> String {
    let secret_key = state.config.secret_key.as_deref().expect("test config has a secret key");
    let signed = crate::auth::session::sign_token(token, secret_key).expect("sign test token");
    format!("{}={}", state.config.auth.session.cookie_name, signed)
}

/// Extract the session cookie pair from a login/registration response.
pub fn session_cookie_pair(response: &TestResponse) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("expected a Set-Cookie header")
        .to_str()
        .expect("cookie should be valid UTF-8");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair before attributes")
        .to_string()
}
