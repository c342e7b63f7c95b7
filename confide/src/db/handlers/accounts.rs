//! Database repository for accounts.

use crate::types::{abbrev_uuid, AccountId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::accounts::{AccountCreateDBRequest, AccountDBResponse, AccountUpdateDBRequest},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing accounts
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Restrict the listing to accounts that have set a secret
    pub with_secret: bool,
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Account {
    pub id: AccountId,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub external_id: Option<String>,
    pub display_name: Option<String>,
    pub secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountDBResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            password_hash: account.password_hash,
            external_id: account.external_id,
            display_name: account.display_name,
            secret: account.secret,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

pub struct Accounts<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Accounts<'c> {
    type CreateRequest = AccountCreateDBRequest;
    type UpdateRequest = AccountUpdateDBRequest;
    type Response = AccountDBResponse;
    type Id = AccountId;
    type Filter = AccountFilter;

    #[instrument(skip(self, request), fields(username = ?request.username, external_id = ?request.external_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Always generate a new ID for accounts
        let account_id = Uuid::new_v4();
        let now = Utc::now();

        // Single INSERT: the partial unique indexes on username/external_id
        // make duplicate detection atomic with the write.
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, username, password_hash, external_id, display_name, secret, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(&request.external_id)
        .bind(&request.display_name)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(AccountDBResponse::from(account))
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(account.map(AccountDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(with_secret = filter.with_secret), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = if filter.with_secret {
            "SELECT * FROM accounts WHERE secret IS NOT NULL ORDER BY created_at"
        } else {
            "SELECT * FROM accounts ORDER BY created_at"
        };

        let accounts = sqlx::query_as::<_, Account>(query).fetch_all(&mut *self.db).await?;

        Ok(accounts.into_iter().map(AccountDBResponse::from).collect())
    }

    #[instrument(skip(self, request), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Atomic update with conditional field updates
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET
                display_name = COALESCE(?2, display_name),
                secret = COALESCE(?3, secret),
                updated_at = ?4
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.display_name)
        .bind(&request.secret)
        .bind(Utc::now())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(AccountDBResponse::from(account))
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Accounts<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, username), err)]
    pub async fn find_by_username(&mut self, username: &str) -> Result<Option<AccountDBResponse>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?1")
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(account.map(AccountDBResponse::from))
    }

    #[instrument(skip(self), err)]
    pub async fn find_by_external_id(&mut self, external_id: &str) -> Result<Option<AccountDBResponse>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE external_id = ?1")
            .bind(external_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(account.map(AccountDBResponse::from))
    }

    /// Return the account with this external id, creating it if absent.
    ///
    /// At most one account ever exists per external id: the unique index
    /// makes the insert the arbiter, and a conflicting insert (a concurrent
    /// first login with the same identity) falls back to a single re-read
    /// that returns the winner's row.
    #[instrument(skip(self, display_name), err)]
    pub async fn find_or_create_by_external_id(
        &mut self,
        external_id: &str,
        display_name: Option<&str>,
    ) -> Result<AccountDBResponse> {
        if let Some(existing) = self.find_by_external_id(external_id).await? {
            return Ok(existing);
        }

        let request = AccountCreateDBRequest::federated(external_id, display_name);
        match self.create(&request).await {
            Ok(created) => Ok(created),
            Err(DbError::UniqueViolation { .. }) => {
                self.find_by_external_id(external_id).await?.ok_or(DbError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Overwrite the secret of the account with this id.
    ///
    /// Unlike [`Repository::update`], a secret is always written through,
    /// so an account can replace its note any number of times.
    #[instrument(skip(self, secret), fields(account_id = %abbrev_uuid(&id)), err)]
    pub async fn update_secret(&mut self, id: AccountId, secret: &str) -> Result<AccountDBResponse> {
        let account = sqlx::query_as::<_, Account>(
            "UPDATE accounts SET secret = ?2, updated_at = ?3 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(secret)
        .bind(Utc::now())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(AccountDBResponse::from(account))
    }

    /// Snapshot of every account that has set a secret, in insertion order.
    pub async fn list_with_secret(&mut self) -> Result<Vec<AccountDBResponse>> {
        self.list(&AccountFilter { with_secret: true }).await
    }
}
