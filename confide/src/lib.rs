//! # confide: a small secret-sharing service
//!
//! `confide` lets registered users attach one private note (a "secret") to
//! their account and browse the notes of everyone who has set one. The part
//! that carries the engineering weight is the authentication core:
//!
//! - **Credential management**: accounts live in SQLite behind a repository
//!   ([`db`]); local passwords are Argon2id hashes ([`auth::password`]).
//!   Uniqueness of usernames and federated subject ids is enforced by the
//!   schema, so concurrent registrations and first-time federated logins
//!   cannot create duplicates.
//! - **Session lifecycle**: successful logins mint opaque server-side
//!   tokens; the browser carries an HMAC-signed cookie ([`auth::session`]).
//!   Logout destroys the token, and the authorization gate re-checks that
//!   the account behind a session still exists ([`auth::gate`]).
//! - **Identity federation**: an OAuth authorization-code flow maps a
//!   provider's subject id onto a local account with an atomic
//!   find-or-create ([`auth::oauth`]).
//!
//! The HTTP surface ([`api`]) is a handful of server-rendered pages; see
//! `build_router` for the exact routes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use confide::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = confide::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     confide::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
mod types;
mod views;

#[cfg(test)]
pub mod test_utils;

use std::str::FromStr;
use std::time::Duration;

use axum::{routing::get, Router};
use bon::Builder;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, instrument, Level};

use crate::auth::{oauth::OAuthClient, session::SessionManager};
pub use config::Config;
pub use types::AccountId;

/// Application state shared across all request handlers.
///
/// Built once at startup and handed to handlers by Axum; there are no
/// ambient globals.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub sessions: SessionManager,
    pub oauth: Option<OAuthClient>,
}

/// Get the confide database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the connection pool and bring the schema up to date.
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database.url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.pool.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.pool.acquire_timeout_secs))
        .connect_with(options)
        .await?;

    migrator().run(&pool).await?;

    Ok(pool)
}

/// Build the application router with all routes and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/", get(api::handlers::pages::home))
        .route("/login", get(api::handlers::pages::login_form).post(api::handlers::auth::login))
        .route(
            "/register",
            get(api::handlers::pages::register_form).post(api::handlers::auth::register),
        )
        .route("/secrets", get(api::handlers::secrets::list_secrets))
        .route(
            "/submit",
            get(api::handlers::secrets::submit_form).post(api::handlers::secrets::submit_secret),
        )
        .route("/logout", get(api::handlers::auth::logout))
        .route("/auth/provider", get(api::handlers::auth::begin_authorization))
        .route("/auth/provider/callback", get(api::handlers::auth::complete_authorization))
        .with_state(state);

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] opens the database, runs migrations,
///    and wires up the session store and identity provider client
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config).await?;

        let sessions = SessionManager::new(config.auth.session.timeout);
        let oauth = if config.auth.provider.enabled {
            Some(OAuthClient::new(config.auth.provider.clone())?)
        } else {
            None
        };

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .sessions(sessions)
            .maybe_oauth(oauth)
            .build();

        let router = build_router(state);

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "confide listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
