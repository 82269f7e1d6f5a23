//! Comment endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::PostService;
use crate::AppState;

/// Comment creation request
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

/// POST /posts/:postId/comments
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(post_id): Path<String>,
    Json(request): Json<AddCommentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.add_comment(&post_id, &caller, &request.text).await?;

    Ok(Json(serde_json::json!({
        "message": "Comment added successfully",
        "post": post,
    })))
}

/// DELETE /posts/comments/:commentId
///
/// The comment is located by id across all posts.
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.delete_comment(&comment_id, &caller).await?;

    Ok(Json(serde_json::json!({
        "message": "Comment deleted successfully",
        "post": post,
    })))
}

/// POST /posts/:postId/comments/:commentId/like
///
/// Toggles the verified caller's like on the comment.
pub async fn like_comment(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.like_comment(&post_id, &comment_id, &caller).await?;

    Ok(Json(serde_json::json!({
        "message": "Comment like updated",
        "post": post,
    })))
}

/// GET /posts/comments
pub async fn get_all_comments(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    let comments = service.all_comments().await?;

    Ok(Json(serde_json::json!({
        "message": "All comments retrieved successfully",
        "comments": comments,
    })))
}
