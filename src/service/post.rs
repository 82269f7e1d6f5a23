//! Post service
//!
//! Post CRUD, like/unlike/share, comments and aggregate queries.
//! Visibility is enforced on every read that returns post content:
//! public posts are visible to everyone, private and draft posts only
//! to their author or an admin. Counts stay global.

use std::sync::Arc;

use crate::data::{
    Account, Comment, CommentDetail, Database, EntityId, Post, PostDetail, PostStatus,
};
use crate::error::AppError;

/// Post service
pub struct PostService {
    db: Arc<Database>,
}

impl PostService {
    /// Create new post service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Resolve a post's like/share/comment sets for an API response
    async fn hydrate(&self, post: Post) -> Result<PostDetail, AppError> {
        let likes = self.db.post_liker_usernames(&post.id).await?;
        let shares = self.db.post_sharer_usernames(&post.id).await?;

        let mut comments = Vec::new();
        for comment in self.db.comments_for_post(&post.id).await? {
            let likes = self.db.comment_liker_usernames(&comment.id).await?;
            comments.push(CommentDetail { comment, likes });
        }

        Ok(PostDetail {
            post,
            likes,
            shares,
            comments,
        })
    }

    /// Fetch a post, treating posts the viewer may not see as absent
    async fn fetch_visible(&self, id: &str, viewer: Option<&Account>) -> Result<Post, AppError> {
        let post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        if !post.visible_to(viewer) {
            return Err(AppError::NotFound);
        }
        Ok(post)
    }

    fn ensure_can_modify(post: &Post, caller: &Account) -> Result<(), AppError> {
        if post.author_id != caller.id && !caller.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    /// Create a post owned by the caller
    ///
    /// Image files have already been persisted by the upload boundary;
    /// only their URLs are stored.
    pub async fn create_post(
        &self,
        author: &Account,
        content: Option<String>,
        image_urls: Vec<String>,
        status: Option<String>,
    ) -> Result<PostDetail, AppError> {
        let status = match status {
            Some(raw) => PostStatus::parse(&raw).map_err(AppError::Validation)?,
            None => PostStatus::Public,
        };

        let now = chrono::Utc::now();
        let post = Post {
            id: EntityId::new().0,
            author_id: author.id.clone(),
            username: author.username.clone(),
            avatar_url: author.avatar_url.clone(),
            content: content.unwrap_or_default(),
            images: image_urls,
            tags: vec![],
            status: status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.db.insert_post(&post).await?;

        tracing::info!(post_id = %post.id, author = %author.username, "Post created");

        self.hydrate(post).await
    }

    /// All posts visible to the viewer, newest first
    pub async fn list_posts(&self, viewer: Option<&Account>) -> Result<Vec<PostDetail>, AppError> {
        let mut details = Vec::new();
        for post in self.db.list_posts().await? {
            if post.visible_to(viewer) {
                details.push(self.hydrate(post).await?);
            }
        }
        Ok(details)
    }

    pub async fn get_post(
        &self,
        id: &str,
        viewer: Option<&Account>,
    ) -> Result<PostDetail, AppError> {
        let post = self.fetch_visible(id, viewer).await?;
        self.hydrate(post).await
    }

    /// Edit content/images/status; author or admin only
    ///
    /// Images are replaced wholesale when new URLs are supplied,
    /// otherwise the existing ones are kept.
    pub async fn edit_post(
        &self,
        id: &str,
        caller: &Account,
        content: Option<String>,
        image_urls: Option<Vec<String>>,
        status: Option<String>,
    ) -> Result<PostDetail, AppError> {
        let mut post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        Self::ensure_can_modify(&post, caller)?;

        if let Some(content) = content {
            post.content = content;
        }
        if let Some(images) = image_urls {
            post.images = images;
        }
        if let Some(raw) = status {
            post.status = PostStatus::parse(&raw)
                .map_err(AppError::Validation)?
                .as_str()
                .to_string();
        }
        post.updated_at = chrono::Utc::now();

        self.db.update_post(&post).await?;

        self.hydrate(post).await
    }

    /// Hard-delete a post; author or admin only
    pub async fn delete_post(&self, id: &str, caller: &Account) -> Result<(), AppError> {
        let post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        Self::ensure_can_modify(&post, caller)?;

        self.db.delete_post(id).await?;

        tracing::info!(post_id = %id, caller = %caller.username, "Post deleted");

        Ok(())
    }

    /// Add the caller to a post's like set
    ///
    /// # Errors
    /// `Validation` ("Post already liked") on a redundant call.
    pub async fn like_post(&self, id: &str, caller: &Account) -> Result<PostDetail, AppError> {
        let post = self.fetch_visible(id, Some(caller)).await?;

        if !self.db.add_post_like(&post.id, &caller.id).await? {
            return Err(AppError::Validation("Post already liked".to_string()));
        }

        self.hydrate(post).await
    }

    /// Remove the caller from a post's like set
    ///
    /// # Errors
    /// `Validation` ("Post not liked yet") on a redundant call.
    pub async fn unlike_post(&self, id: &str, caller: &Account) -> Result<PostDetail, AppError> {
        let post = self.fetch_visible(id, Some(caller)).await?;

        if !self.db.remove_post_like(&post.id, &caller.id).await? {
            return Err(AppError::Validation("Post not liked yet".to_string()));
        }

        self.hydrate(post).await
    }

    /// Add the caller to a post's share set; redundant calls are a no-op
    pub async fn share_post(&self, id: &str, caller: &Account) -> Result<PostDetail, AppError> {
        let post = self.fetch_visible(id, Some(caller)).await?;
        self.db.add_post_share(&post.id, &caller.id).await?;
        self.hydrate(post).await
    }

    /// Append a comment authored by the caller
    pub async fn add_comment(
        &self,
        post_id: &str,
        caller: &Account,
        text: &str,
    ) -> Result<PostDetail, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("text is required".to_string()));
        }

        let post = self.fetch_visible(post_id, Some(caller)).await?;

        let now = chrono::Utc::now();
        let comment = Comment {
            id: EntityId::new().0,
            post_id: post.id.clone(),
            author_id: caller.id.clone(),
            username: caller.username.clone(),
            avatar_url: caller.avatar_url.clone(),
            body: text.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.db.insert_comment(&comment).await?;

        self.hydrate(post).await
    }

    /// Delete a comment located by id across all posts
    ///
    /// Comment author or admin only. Returns the parent post after removal.
    pub async fn delete_comment(
        &self,
        comment_id: &str,
        caller: &Account,
    ) -> Result<PostDetail, AppError> {
        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if comment.author_id != caller.id && !caller.is_admin() {
            return Err(AppError::Forbidden);
        }

        self.db.delete_comment(comment_id).await?;

        let post = self
            .db
            .get_post(&comment.post_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.hydrate(post).await
    }

    /// Toggle the caller's membership in a comment's like set
    pub async fn like_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        caller: &Account,
    ) -> Result<PostDetail, AppError> {
        let post = self.fetch_visible(post_id, Some(caller)).await?;

        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .filter(|comment| comment.post_id == post.id)
            .ok_or(AppError::NotFound)?;

        // Toggle: insert wins if absent, otherwise remove.
        if !self.db.add_comment_like(&comment.id, &caller.id).await? {
            self.db.remove_comment_like(&comment.id, &caller.id).await?;
        }

        self.hydrate(post).await
    }

    /// Total post count, regardless of visibility
    pub async fn count_posts(&self) -> Result<i64, AppError> {
        self.db.count_posts().await
    }

    /// Post count for one author
    ///
    /// # Errors
    /// `NotFound` if the account is absent.
    pub async fn count_posts_by_username(&self, username: &str) -> Result<i64, AppError> {
        let account = self
            .db
            .get_account_by_username(username)
            .await?
            .ok_or(AppError::NotFound)?;
        self.db.count_posts_by_author(&account.id).await
    }

    /// Posts by one author, filtered to what the viewer may see
    ///
    /// # Errors
    /// `NotFound` if the account is absent or has no visible posts.
    pub async fn posts_by_username(
        &self,
        username: &str,
        viewer: Option<&Account>,
    ) -> Result<Vec<PostDetail>, AppError> {
        let account = self
            .db
            .get_account_by_username(username)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut details = Vec::new();
        for post in self.db.list_posts_by_author(&account.id).await? {
            if post.visible_to(viewer) {
                details.push(self.hydrate(post).await?);
            }
        }

        if details.is_empty() {
            return Err(AppError::NotFound);
        }
        Ok(details)
    }

    /// Every post's comments flattened into one author-resolved sequence
    ///
    /// # Errors
    /// `NotFound` when no posts exist at all.
    pub async fn all_comments(&self) -> Result<Vec<CommentDetail>, AppError> {
        let posts = self.db.list_posts().await?;
        if posts.is_empty() {
            return Err(AppError::NotFound);
        }

        let mut all = Vec::new();
        for post in posts {
            for comment in self.db.comments_for_post(&post.id).await? {
                let likes = self.db.comment_liker_usernames(&comment.id).await?;
                all.push(CommentDetail { comment, likes });
            }
        }
        Ok(all)
    }
}
