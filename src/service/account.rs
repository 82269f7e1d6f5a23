//! Account service
//!
//! Registration, credential checks, profile reads/updates, search and
//! admin listing.

use std::sync::Arc;

use crate::auth::{hash_password, verify_password};
use crate::data::{Account, Database, EntityId, Role, DEFAULT_AVATAR_URL, DEFAULT_BIO};
use crate::error::AppError;

/// Maximum results returned by a username search
const SEARCH_RESULT_CAP: i64 = 100;

/// Inputs for [`AccountService::register`]
#[derive(Debug)]
pub struct RegisterParams {
    pub email: String,
    pub name: String,
    pub username: String,
    pub password: String,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

fn require_field(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a new account
    ///
    /// # Errors
    /// `Conflict` if the email or username is already taken. The uniqueness
    /// check is repeated by the store's constraints, so a concurrent
    /// duplicate registration still maps to `Conflict`.
    pub async fn register(&self, params: RegisterParams) -> Result<Account, AppError> {
        require_field(&params.email, "email")?;
        require_field(&params.name, "name")?;
        require_field(&params.username, "username")?;
        require_field(&params.password, "password")?;

        let role = Role::parse(params.role.as_deref()).map_err(AppError::Validation)?;

        if self
            .db
            .account_exists(&params.email, &params.username)
            .await?
        {
            return Err(AppError::Conflict(
                "Email or Username already exists".to_string(),
            ));
        }

        let password = params.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

        let now = chrono::Utc::now();
        let account = Account {
            id: EntityId::new().0,
            email: params.email.trim().to_string(),
            name: params.name.trim().to_string(),
            username: params.username.trim().to_string(),
            password_hash,
            role: role.as_str().to_string(),
            bio: params
                .bio
                .filter(|bio| !bio.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIO.to_string()),
            avatar_url: params
                .avatar_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
            created_at: now,
            updated_at: now,
        };

        self.db.insert_account(&account).await?;

        tracing::info!(username = %account.username, "Account registered");

        Ok(account)
    }

    /// Check a username/password pair
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown username and for a wrong
    /// password alike, so responses cannot distinguish the two.
    pub async fn login(&self, username: &str, password: &str) -> Result<Account, AppError> {
        let Some(account) = self.db.get_account_by_username(username).await? else {
            return Err(AppError::InvalidCredentials);
        };

        let candidate = password.to_string();
        let stored_hash = account.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&candidate, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        Ok(account)
    }

    /// Fetch a profile together with its live post count
    pub async fn get_profile(&self, username: &str) -> Result<(Account, i64), AppError> {
        let account = self
            .db
            .get_account_by_username(username)
            .await?
            .ok_or(AppError::NotFound)?;
        let post_count = self.db.count_posts_by_author(&account.id).await?;
        Ok((account, post_count))
    }

    /// Update profile fields, overwriting only what is supplied
    ///
    /// Only the account owner or an admin may update a profile.
    pub async fn update_profile(
        &self,
        username: &str,
        caller: &Account,
        name: Option<String>,
        bio: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<Account, AppError> {
        let mut account = self
            .db
            .get_account_by_username(username)
            .await?
            .ok_or(AppError::NotFound)?;

        if caller.id != account.id && !caller.is_admin() {
            return Err(AppError::Forbidden);
        }

        if let Some(name) = name.filter(|value| !value.trim().is_empty()) {
            account.name = name.trim().to_string();
        }
        if let Some(bio) = bio.filter(|value| !value.trim().is_empty()) {
            account.bio = bio.trim().to_string();
        }
        if let Some(avatar_url) = avatar_url {
            account.avatar_url = avatar_url;
        }
        account.updated_at = chrono::Utc::now();

        self.db.update_account(&account).await?;

        Ok(account)
    }

    /// Total account count plus the full account list
    ///
    /// Credential material never leaves the service: callers receive the
    /// `Account` structs, whose password hash is not serialized.
    pub async fn count_users(&self) -> Result<(i64, Vec<Account>), AppError> {
        let total = self.db.count_accounts().await?;
        let accounts = self.db.list_accounts().await?;
        Ok((total, accounts))
    }

    /// Case-insensitive substring search on username, capped at 100 results
    ///
    /// # Errors
    /// `NotFound` when nothing matches.
    pub async fn search_users(&self, query: &str) -> Result<Vec<Account>, AppError> {
        let matches = self.db.search_accounts(query, SEARCH_RESULT_CAP).await?;
        if matches.is_empty() {
            return Err(AppError::NotFound);
        }
        Ok(matches)
    }
}
