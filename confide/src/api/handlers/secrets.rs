//! Secret listing and submission.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use minijinja::context;

use crate::{
    api::models::accounts::{CurrentAccount, SecretForm, SecretView},
    db::handlers::Accounts,
    errors::Error,
    views, AppState,
};

/// Everyone can browse the secrets; only their authors can change them.
#[tracing::instrument(skip_all)]
pub async fn list_secrets(State(state): State<AppState>) -> Result<Html<String>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let accounts = Accounts::new(&mut conn).list_with_secret().await?;

    let secrets: Vec<SecretView> = accounts.into_iter().map(SecretView::from).collect();
    views::render("secrets", context! { secrets })
}

#[tracing::instrument(skip_all)]
pub async fn submit_form(_account: CurrentAccount) -> Result<Html<String>, Error> {
    views::render("submit", context! {})
}

/// Overwrite the calling account's secret.
///
/// The target account is the one bound to the caller's session - the id is
/// never taken from the request, so one user cannot write another's secret.
#[tracing::instrument(skip_all, fields(account_id = %account.id))]
pub async fn submit_secret(
    State(state): State<AppState>,
    account: CurrentAccount,
    Form(form): Form<SecretForm>,
) -> Result<Response, Error> {
    if form.secret.trim().is_empty() {
        let page = views::render("submit", context! { error => "A secret must not be empty" })?;
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Accounts::new(&mut conn).update_secret(account.id, &form.secret).await?;

    Ok(Redirect::to("/secrets").into_response())
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, session_cookie_pair};
    use axum::http::{header, StatusCode};
    use serde_json::json;
    use sqlx::SqlitePool;

    async fn register(server: &axum_test::TestServer, username: &str) -> String {
        let response = server
            .post("/register")
            .form(&json!({ "username": username, "password": "a strong password" }))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        session_cookie_pair(&response)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_submit_requires_a_session(pool: SqlitePool) {
        let (server, _state) = create_test_app(pool);

        let response = server.get("/submit").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");

        let response = server.post("/submit").form(&json!({ "secret": "sneaky" })).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_submitted_secret_appears_on_the_secrets_page(pool: SqlitePool) {
        let (server, _state) = create_test_app(pool);
        let cookie = register(&server, "alice").await;

        // The page is public and starts empty
        let page = server.get("/secrets").await;
        page.assert_status(StatusCode::OK);
        assert!(page.text().contains("No secrets yet"));

        let response = server
            .post("/submit")
            .add_header(header::COOKIE, &cookie)
            .form(&json!({ "secret": "I still use tabs" }))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/secrets");

        let page = server.get("/secrets").await;
        assert!(page.text().contains("I still use tabs"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_submission_only_touches_the_callers_account(pool: SqlitePool) {
        let (server, _state) = create_test_app(pool);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;

        server
            .post("/submit")
            .add_header(header::COOKIE, &alice)
            .form(&json!({ "secret": "the first confession" }))
            .await
            .assert_status(StatusCode::SEE_OTHER);
        server
            .post("/submit")
            .add_header(header::COOKIE, &bob)
            .form(&json!({ "secret": "an unrelated confession" }))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        // Alice overwrites her own secret; bob's is untouched
        server
            .post("/submit")
            .add_header(header::COOKIE, &alice)
            .form(&json!({ "secret": "the revised confession" }))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let page = server.get("/secrets").await.text();
        assert!(page.contains("the revised confession"));
        assert!(!page.contains("the first confession"));
        assert!(page.contains("an unrelated confession"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_empty_secret_rerenders_the_form(pool: SqlitePool) {
        let (server, _state) = create_test_app(pool);
        let cookie = register(&server, "alice").await;

        let response = server
            .post("/submit")
            .add_header(header::COOKIE, &cookie)
            .form(&json!({ "secret": "   " }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("<form"));
    }
}
