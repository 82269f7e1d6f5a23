//! Authentication extractors
//!
//! The access gate: handlers that require identity take [`CurrentUser`],
//! visibility-aware public reads take [`MaybeUser`], admin-only routes take
//! [`AdminUser`]. On success the caller's full account record is available
//! for ownership and role checks.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

use super::token::verify_token;
use crate::data::Account;
use crate::error::AppError;
use crate::AppState;

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Resolve a bearer token to the caller's account record
///
/// Missing token is Unauthorized, a bad signature or expired token is
/// Forbidden, and a token whose account no longer exists is NotFound.
async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<Account, AppError> {
    let token = extract_bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = verify_token(token, &state.config.auth.token_secret)?;
    state
        .db
        .get_account_by_id(&claims.sub)
        .await?
        .ok_or(AppError::NotFound)
}

/// Extractor for the current authenticated account
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(account): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", account.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Account);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(account) = parts.extensions.get::<Account>().cloned() {
            return Ok(CurrentUser(account));
        }

        let state = AppState::from_ref(state);
        let account = authenticate(&parts.headers, &state).await?;
        parts.extensions.insert(account.clone());

        Ok(CurrentUser(account))
    }
}

/// Optional current account extractor
///
/// Returns None if not authenticated, instead of an error. Used where
/// visibility depends on who is asking but anonymous access is allowed.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Account>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(account) = parts.extensions.get::<Account>().cloned() {
            return Ok(MaybeUser(Some(account)));
        }

        let app_state = AppState::from_ref(state);
        let account = match extract_bearer_token(&parts.headers) {
            Some(_) => authenticate(&parts.headers, &app_state).await.ok(),
            None => None,
        };

        if let Some(account) = &account {
            parts.extensions.insert(account.clone());
        }

        Ok(MaybeUser(account))
    }
}

/// Extractor requiring an authenticated admin account
#[derive(Debug, Clone)]
pub struct AdminUser(pub Account);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(account) = CurrentUser::from_request_parts(parts, state).await?;
        if !account.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(account))
    }
}
