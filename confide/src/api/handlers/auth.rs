//! Registration, login, logout, and the federation flow.
//!
//! Every success path here ends the same way: credentials (or a provider
//! identity) are fully validated first, and only then is a session
//! established and the browser sent to `/secrets` with a signed cookie.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use minijinja::context;

use crate::{
    api::models::accounts::{LoginForm, OAuthCallbackParams, RegisterForm},
    auth::{local, session},
    db::errors::DbError,
    errors::Error,
    types::AccountId,
    views, AppState,
};

/// Establish a session for a freshly authenticated account and redirect.
fn establish_session(state: &AppState, account_id: AccountId, to: &str) -> Result<Response, Error> {
    let secret_key = state.config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "sign session cookie: secret_key is required".to_string(),
    })?;

    let token = state.sessions.establish(account_id);
    let signed = session::sign_token(&token, secret_key)?;
    let cookie = session::session_cookie(&signed, &state.config.auth.session);

    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response())
}

/// Re-render a form page with a validation message and a 400 status.
fn form_error(template: &str, message: &str) -> Result<Response, Error> {
    let page = views::render(template, context! { error => message })?;
    Ok((StatusCode::BAD_REQUEST, page).into_response())
}

#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Result<Response, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let account = match local::register(&mut conn, &state.config.auth.password, &form.username, &form.password).await {
        Ok(account) => account,
        Err(Error::Validation { message }) => return form_error("register", &message),
        Err(Error::Database(DbError::UniqueViolation { .. })) => {
            return Ok(Redirect::to("/register").into_response());
        }
        Err(e) => return Err(e),
    };

    establish_session(&state, account.id, "/secrets")
}

#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response, Error> {
    if form.username.trim().is_empty() || form.password.is_empty() {
        return form_error("login", "Username and password are required");
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // InvalidCredentials propagates and lands back on the login page
    let account = local::login(&mut conn, &form.username, &form.password).await?;

    establish_session(&state, account.id, "/secrets")
}

#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, Error> {
    if let Some(secret_key) = state.config.secret_key.as_deref() {
        if let Some(token) = session::token_from_headers(&headers, &state.config.auth.session.cookie_name, secret_key) {
            state.sessions.destroy(&token);
        }
    }

    let cookie = session::clear_session_cookie(&state.config.auth.session);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}

#[tracing::instrument(skip_all)]
pub async fn begin_authorization(State(state): State<AppState>) -> Result<Response, Error> {
    let oauth = state.oauth.as_ref().ok_or_else(|| Error::OAuth {
        reason: "identity provider is not configured".to_string(),
    })?;

    Ok(Redirect::to(oauth.authorization_url().as_str()).into_response())
}

#[tracing::instrument(skip_all)]
pub async fn complete_authorization(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<Response, Error> {
    let oauth = state.oauth.as_ref().ok_or_else(|| Error::OAuth {
        reason: "identity provider is not configured".to_string(),
    })?;

    if let Some(denial) = params.error {
        return Err(Error::OAuth {
            reason: format!("provider denied authorization: {denial}"),
        });
    }
    let code = params.code.ok_or_else(|| Error::OAuth {
        reason: "callback carried no authorization code".to_string(),
    })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let account = oauth.complete_authorization(&mut conn, &code).await?;

    establish_session(&state, account.id, "/secrets")
}
