//! Post endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};

use super::{discard_uploads, multipart_error, read_image_field};
use crate::auth::{CurrentUser, MaybeUser};
use crate::data::PostDetail;
use crate::error::AppError;
use crate::service::PostService;
use crate::storage::MAX_POST_IMAGES;
use crate::AppState;

/// Fields accepted by the create/edit multipart forms
#[derive(Debug, Default)]
struct PostForm {
    content: Option<String>,
    status: Option<String>,
    /// URLs of images already persisted by the upload boundary
    image_urls: Option<Vec<String>>,
}

/// Parse a post multipart form, persisting image fields as they stream in
///
/// Files persisted before a later field is rejected are discarded again.
async fn read_post_form(state: &AppState, multipart: Multipart) -> Result<PostForm, AppError> {
    let mut form = PostForm::default();

    match fill_post_form(state, &mut form, multipart).await {
        Ok(()) => Ok(form),
        Err(error) => {
            if let Some(urls) = &form.image_urls {
                discard_uploads(state, urls).await;
            }
            Err(error)
        }
    }
}

async fn fill_post_form(
    state: &AppState,
    form: &mut PostForm,
    mut multipart: Multipart,
) -> Result<(), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or("") {
            "content" => form.content = Some(field.text().await.map_err(multipart_error)?),
            "status" => form.status = Some(field.text().await.map_err(multipart_error)?),
            "images" => {
                let urls = form.image_urls.get_or_insert_with(Vec::new);
                if urls.len() >= MAX_POST_IMAGES {
                    return Err(AppError::Validation(format!(
                        "a post can have at most {} images",
                        MAX_POST_IMAGES
                    )));
                }
                let upload = read_image_field(field).await?;
                urls.push(state.storage.save_image(upload).await?);
            }
            _ => {}
        }
    }

    Ok(())
}

/// GET /posts
pub async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
) -> Result<Json<Vec<PostDetail>>, AppError> {
    let service = PostService::new(state.db.clone());
    let posts = service.list_posts(viewer.as_ref()).await?;
    Ok(Json(posts))
}

/// POST /posts
///
/// Multipart form: optional `content` and `status` text fields, up to ten
/// `images` file fields.
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let form = read_post_form(&state, multipart).await?;
    let image_urls = form.image_urls.unwrap_or_default();

    let service = PostService::new(state.db.clone());
    let post = match service
        .create_post(&caller, form.content, image_urls.clone(), form.status)
        .await
    {
        Ok(post) => post,
        Err(error) => {
            discard_uploads(&state, &image_urls).await;
            return Err(error);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Post created successfully",
            "post": post,
        })),
    ))
}

/// GET /posts/:postId
pub async fn get_post(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(post_id): Path<String>,
) -> Result<Json<PostDetail>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get_post(&post_id, viewer.as_ref()).await?;
    Ok(Json(post))
}

/// PUT /posts/:postId
pub async fn edit_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let form = read_post_form(&state, multipart).await?;
    let image_urls = form.image_urls;

    let service = PostService::new(state.db.clone());
    let post = match service
        .edit_post(
            &post_id,
            &caller,
            form.content,
            image_urls.clone(),
            form.status,
        )
        .await
    {
        Ok(post) => post,
        Err(error) => {
            if let Some(urls) = &image_urls {
                discard_uploads(&state, urls).await;
            }
            return Err(error);
        }
    };

    Ok(Json(serde_json::json!({
        "message": "Post updated successfully",
        "post": post,
    })))
}

/// DELETE /posts/:postId
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    service.delete_post(&post_id, &caller).await?;

    Ok(Json(serde_json::json!({
        "message": "Post deleted successfully",
    })))
}

/// POST /posts/:postId/like
pub async fn like_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.like_post(&post_id, &caller).await?;

    Ok(Json(serde_json::json!({
        "message": "Post liked",
        "post": post,
    })))
}

/// POST /posts/:postId/unlike
pub async fn unlike_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.unlike_post(&post_id, &caller).await?;

    Ok(Json(serde_json::json!({
        "message": "Post unliked",
        "post": post,
    })))
}

/// POST /posts/:postId/share
pub async fn share_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.share_post(&post_id, &caller).await?;

    Ok(Json(serde_json::json!({
        "message": "Post shared",
        "post": post,
    })))
}

/// GET /posts/count
pub async fn count_posts(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    let total = service.count_posts().await?;

    Ok(Json(serde_json::json!({
        "message": "Total posts count retrieved successfully",
        "total_posts": total,
    })))
}

/// GET /posts/count/:username
pub async fn count_posts_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = PostService::new(state.db.clone());
    let total = service.count_posts_by_username(&username).await?;

    Ok(Json(serde_json::json!({
        "message": format!(
            "Total posts count for username '{}' retrieved successfully",
            username
        ),
        "total_posts": total,
    })))
}

/// GET /posts/users/:username
pub async fn get_posts_by_username(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
) -> Result<Json<Vec<PostDetail>>, AppError> {
    let service = PostService::new(state.db.clone());
    let posts = service.posts_by_username(&username, viewer.as_ref()).await?;
    Ok(Json(posts))
}
