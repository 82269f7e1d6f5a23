//! HTTP handlers
//!
//! Routes are grouped into a `/users` router (account operations) and a
//! `/posts` router (post, comment and interaction operations).

use axum::{
    extract::multipart::Field,
    routing::{delete, get, post},
    Router,
};

use crate::error::AppError;
use crate::storage::UploadedImage;
use crate::AppState;

pub mod comments;
pub mod posts;
pub mod users;

/// Create the account router, nested under `/users`
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/search", get(users::search_users))
        .route("/check-admin", get(users::check_admin))
        .route("/admin/data", get(users::admin_data))
        .route("/admin/data/count", get(users::count_users))
        .route(
            "/:username",
            get(users::get_profile).put(users::update_profile),
        )
}

/// Create the post router, nested under `/posts`
pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list_posts).post(posts::create_post))
        .route("/count", get(posts::count_posts))
        .route("/count/:username", get(posts::count_posts_by_username))
        .route("/comments", get(comments::get_all_comments))
        .route("/comments/:commentId", delete(comments::delete_comment))
        .route("/users/:username", get(posts::get_posts_by_username))
        .route(
            "/:postId",
            get(posts::get_post)
                .put(posts::edit_post)
                .delete(posts::delete_post),
        )
        .route("/:postId/like", post(posts::like_post))
        .route("/:postId/unlike", post(posts::unlike_post))
        .route("/:postId/share", post(posts::share_post))
        .route("/:postId/comments", post(comments::add_comment))
        .route(
            "/:postId/comments/:commentId/like",
            post(comments::like_comment),
        )
}

/// Read one multipart file field into an [`UploadedImage`]
pub(crate) async fn read_image_field(field: Field<'_>) -> Result<UploadedImage, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AppError::Validation("Missing content type for uploaded file".to_string())
        })?;
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {}", e)))?
        .to_vec();

    Ok(UploadedImage {
        file_name,
        content_type,
        data,
    })
}

pub(crate) fn multipart_error(error: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Failed to parse multipart form: {}", error))
}

/// Remove files persisted during a request whose later checks failed,
/// so rejected requests leave nothing behind in the uploads directory.
pub(crate) async fn discard_uploads(state: &AppState, urls: &[String]) {
    for url in urls {
        if let Err(error) = state.storage.remove_image(url).await {
            tracing::warn!(%error, url = %url, "Failed to discard upload");
        }
    }
}
