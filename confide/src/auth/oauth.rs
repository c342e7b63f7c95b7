//! Federated login against an external OAuth identity provider.
//!
//! Each authorization attempt walks `Initiated -> ProfileFetched ->
//! AccountResolved`, with the caller establishing the session as the final
//! step; any failure along the way collapses to [`Error::OAuth`] and the
//! caller sends the browser back to the login page, never to a protected
//! route. The provider is an external collaborator, so the only timeout in
//! the flow lives on the HTTP client talking to it.

use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    config::OAuthProviderConfig,
    db::{handlers::Accounts, models::accounts::AccountDBResponse},
    errors::Error,
};

/// Token endpoint response; only the access token is consumed.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Provider profile document. Providers disagree on field names, so both
/// the OIDC `sub` and the plain `id` spelling are accepted.
#[derive(Debug, Deserialize)]
struct ProviderProfile {
    sub: Option<String>,
    id: Option<String>,
    name: Option<String>,
}

/// The identity extracted from a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub external_id: String,
    pub display_name: Option<String>,
}

/// Client for one configured identity provider, built once at startup.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthProviderConfig,
}

impl OAuthClient {
    pub fn new(config: OAuthProviderConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Internal {
                operation: format!("build identity provider HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    /// The provider URL the browser is redirected to, carrying the
    /// requested scopes.
    pub fn authorization_url(&self) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_url.as_str())
            .append_pair("scope", &self.config.scopes.join(" "));
        url
    }

    /// Exchange an authorization code for the provider's profile.
    #[instrument(skip_all)]
    async fn fetch_profile(&self, code: &str) -> Result<ExternalProfile, Error> {
        let token: TokenResponse = self
            .http
            .post(self.config.token_url.clone())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::OAuth {
                reason: format!("token exchange request failed: {e}"),
            })?
            .error_for_status()
            .map_err(|e| Error::OAuth {
                reason: format!("token exchange rejected: {e}"),
            })?
            .json()
            .await
            .map_err(|e| Error::OAuth {
                reason: format!("malformed token response: {e}"),
            })?;

        let profile: ProviderProfile = self
            .http
            .get(self.config.profile_url.clone())
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| Error::OAuth {
                reason: format!("profile request failed: {e}"),
            })?
            .error_for_status()
            .map_err(|e| Error::OAuth {
                reason: format!("profile request rejected: {e}"),
            })?
            .json()
            .await
            .map_err(|e| Error::OAuth {
                reason: format!("malformed profile: {e}"),
            })?;

        debug!("Fetched identity provider profile");

        let external_id = profile
            .sub
            .or(profile.id)
            .filter(|subject| !subject.is_empty())
            .ok_or_else(|| Error::OAuth {
                reason: "profile has no stable subject identifier".to_string(),
            })?;

        Ok(ExternalProfile {
            external_id,
            display_name: profile.name,
        })
    }

    /// Complete an authorization attempt: exchange the code, resolve the
    /// provider identity to a local account (creating it on first login).
    #[instrument(skip_all)]
    pub async fn complete_authorization(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
    ) -> Result<AccountDBResponse, Error> {
        let profile = self.fetch_profile(code).await?;

        let account = Accounts::new(conn)
            .find_or_create_by_external_id(&profile.external_id, profile.display_name.as_deref())
            .await?;

        debug!("Resolved federated identity to account {}", account.id);
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_provider_config;
    use serde_json::json;
    use sqlx::SqlitePool;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_provider(profile: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "mock-access-token",
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .mount(&server)
            .await;

        server
    }

    #[test]
    fn test_authorization_url_carries_scopes() {
        let config = create_test_provider_config("http://localhost:0");
        let client = OAuthClient::new(config).unwrap();

        let url = client.authorization_url();
        assert!(url.as_str().starts_with("http://localhost:0/authorize?"));
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("response_type".to_string(), "code".to_string())));
        assert!(query.contains(&("client_id".to_string(), "test-client".to_string())));
        assert!(query.contains(&("scope".to_string(), "email profile".to_string())));
    }

    #[sqlx::test]
    async fn test_complete_authorization_creates_account(pool: SqlitePool) {
        let server = mock_provider(json!({ "sub": "provider|42", "name": "Alice Example" })).await;
        let client = OAuthClient::new(create_test_provider_config(&server.uri())).unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let account = client.complete_authorization(&mut conn, "the-code").await.unwrap();

        assert_eq!(account.external_id.as_deref(), Some("provider|42"));
        assert_eq!(account.display_name.as_deref(), Some("Alice Example"));
        assert!(account.password_hash.is_none());

        // A repeat login with the same identity resolves to the same account
        let again = client.complete_authorization(&mut conn, "another-code").await.unwrap();
        assert_eq!(again.id, account.id);
    }

    #[sqlx::test]
    async fn test_plain_id_field_is_accepted(pool: SqlitePool) {
        let server = mock_provider(json!({ "id": "12345", "name": "Bob" })).await;
        let client = OAuthClient::new(create_test_provider_config(&server.uri())).unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let account = client.complete_authorization(&mut conn, "the-code").await.unwrap();
        assert_eq!(account.external_id.as_deref(), Some("12345"));
    }

    #[sqlx::test]
    async fn test_provider_denial_is_oauth_failure(pool: SqlitePool) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_provider_config(&server.uri())).unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let err = client.complete_authorization(&mut conn, "bad-code").await.unwrap_err();
        assert!(matches!(err, Error::OAuth { .. }));

        // Nothing was created
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    async fn test_profile_without_subject_is_oauth_failure(pool: SqlitePool) {
        let server = mock_provider(json!({ "name": "No Subject" })).await;
        let client = OAuthClient::new(create_test_provider_config(&server.uri())).unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let err = client.complete_authorization(&mut conn, "the-code").await.unwrap_err();
        assert!(matches!(err, Error::OAuth { .. }));
    }
}
