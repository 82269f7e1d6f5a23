//! Account endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::{discard_uploads, multipart_error, read_image_field};
use crate::auth::{issue_token, AdminUser, CurrentUser};
use crate::data::Account;
use crate::error::AppError;
use crate::service::{AccountService, RegisterParams};
use crate::AppState;

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub username: String,
    pub password: String,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// Account fields safe to return to any caller
///
/// Never carries credential material or email addresses.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: String,
    pub bio: String,
    pub avatar_url: String,
}

impl From<&Account> for UserSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.clone(),
            name: account.name.clone(),
            role: account.role.clone(),
            bio: account.bio.clone(),
            avatar_url: account.avatar_url.clone(),
        }
    }
}

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let service = AccountService::new(state.db.clone());
    service
        .register(RegisterParams {
            email: request.email,
            name: request.name,
            username: request.username,
            password: request.password,
            role: request.role,
            bio: request.bio,
            avatar_url: request.avatar_url,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "User registered successfully" })),
    ))
}

/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = AccountService::new(state.db.clone());
    let account = service.login(&request.username, &request.password).await?;

    let token = issue_token(
        &account,
        &state.config.auth.token_secret,
        state.config.auth.token_ttl_seconds,
    )?;

    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "token": token,
        "user": {
            "id": account.id,
            "username": account.username,
            "email": account.email,
            "bio": account.bio,
            "avatar_url": account.avatar_url,
            "role": account.role,
        },
    })))
}

/// GET /users/:username
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = AccountService::new(state.db.clone());
    let (account, post_count) = service.get_profile(&username).await?;

    Ok(Json(serde_json::json!({
        "name": account.name,
        "username": account.username,
        "bio": account.bio,
        "avatar_url": account.avatar_url,
        "post_count": post_count,
    })))
}

/// PUT /users/:username
///
/// Multipart form: optional `name` and `bio` text fields, optional
/// `profileImg` file field for a new avatar.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(username): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut name: Option<String> = None;
    let mut bio: Option<String> = None;
    let mut avatar_url: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or("") {
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            "bio" => bio = Some(field.text().await.map_err(multipart_error)?),
            "profileImg" => {
                let upload = read_image_field(field).await?;
                avatar_url = Some(state.storage.save_image(upload).await?);
            }
            _ => {}
        }
    }

    let service = AccountService::new(state.db.clone());
    let account = match service
        .update_profile(&username, &caller, name, bio, avatar_url.clone())
        .await
    {
        Ok(account) => account,
        Err(error) => {
            // The avatar was persisted while the form streamed in; drop it
            // again when the update is refused.
            if let Some(url) = &avatar_url {
                discard_uploads(&state, std::slice::from_ref(url)).await;
            }
            return Err(error);
        }
    };

    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully",
        "user": {
            "name": account.name,
            "username": account.username,
            "bio": account.bio,
            "avatar_url": account.avatar_url,
        },
    })))
}

/// GET /users/check-admin
pub async fn check_admin(
    CurrentUser(caller): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    if !caller.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(serde_json::json!({ "message": "User is admin" })))
}

/// GET /users/admin/data
pub async fn admin_data(AdminUser(_caller): AdminUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome, Admin! You have access to this data.",
    }))
}

/// GET /users/admin/data/count
pub async fn count_users(
    State(state): State<AppState>,
    AdminUser(_caller): AdminUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = AccountService::new(state.db.clone());
    let (total, accounts) = service.count_users().await?;
    let users: Vec<UserSummary> = accounts.iter().map(UserSummary::from).collect();

    Ok(Json(serde_json::json!({
        "message": "Total users count retrieved successfully",
        "total_users": total,
        "users": users,
    })))
}

/// GET /users/search?query=
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .ok_or_else(|| AppError::Validation("Query parameter is required".to_string()))?;

    let service = AccountService::new(state.db.clone());
    let matches = service.search_users(query).await?;
    let users: Vec<UserSummary> = matches.iter().map(UserSummary::from).collect();

    Ok(Json(serde_json::json!({ "users": users })))
}
