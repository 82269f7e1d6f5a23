//! SQLite database operations
//!
//! All database access goes through this module. Set membership for likes
//! and shares is enforced by composite primary keys, so redundant inserts
//! and removals are single atomic statements rather than read-modify-write
//! sequences.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

/// Escape LIKE wildcards in user-supplied search text
///
/// The escaped pattern must be used with `ESCAPE '\'`.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_string_list(raw: String) -> Vec<String> {
    serde_json::from_str(&raw).unwrap_or_default()
}

fn encode_string_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed")
    )
}

/// Columns selected for post reads; display fields come from the author join.
const POST_SELECT: &str = "SELECT p.id, p.author_id, a.username, a.avatar_url, p.content, \
     p.images, p.tags, p.status, p.created_at, p.updated_at \
     FROM posts p JOIN accounts a ON a.id = p.author_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.author_id, a.username, a.avatar_url, \
     c.body, c.created_at, c.updated_at \
     FROM comments c JOIN accounts a ON a.id = c.author_id";

fn row_to_post(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        author_id: row.try_get("author_id")?,
        username: row.try_get("username")?,
        avatar_url: row.try_get("avatar_url")?,
        content: row.try_get("content")?,
        images: parse_string_list(row.try_get("images")?),
        tags: parse_string_list(row.try_get("tags")?),
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_comment(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        author_id: row.try_get("author_id")?,
        username: row.try_get("username")?,
        avatar_url: row.try_get("avatar_url")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Database {
    /// Connect to the SQLite database and run migrations
    ///
    /// Creates the parent directory and the database file if missing.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a new account
    ///
    /// # Errors
    /// Returns `Conflict` if the email or username is already stored.
    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO accounts (id, email, name, username, password_hash, role, bio, \
             avatar_url, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.role)
        .bind(&account.bio)
        .bind(&account.avatar_url)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::Conflict("Email or Username already exists".to_string())
            } else {
                AppError::Database(error)
            }
        })?;

        Ok(())
    }

    pub async fn get_account_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    /// Whether an account with the given email or username exists
    pub async fn account_exists(&self, email: &str, username: &str) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM accounts WHERE email = ? OR username = ?",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Persist profile changes (name, bio, avatar)
    pub async fn update_account(&self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE accounts SET name = ?, bio = ?, avatar_url = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&account.name)
        .bind(&account.bio)
        .bind(&account.avatar_url)
        .bind(account.updated_at)
        .bind(&account.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        let accounts = sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }

    pub async fn count_accounts(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Case-insensitive substring search on username
    pub async fn search_accounts(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Account>, AppError> {
        let pattern = format!("%{}%", escape_like(query));
        let accounts = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE username LIKE ? ESCAPE '\\' ORDER BY username LIMIT ?",
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO posts (id, author_id, content, images, tags, status, created_at, \
             updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.content)
        .bind(encode_string_list(&post.images))
        .bind(encode_string_list(&post.tags))
        .bind(&post.status)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let row = sqlx::query(&format!("{} WHERE p.id = ?", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_post).transpose().map_err(Into::into)
    }

    /// All posts, newest first
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query(&format!("{} ORDER BY p.created_at DESC", POST_SELECT))
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(row_to_post)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    pub async fn list_posts_by_author(&self, author_id: &str) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE p.author_id = ? ORDER BY p.created_at DESC",
            POST_SELECT
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(row_to_post)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    /// Persist content/images/status changes
    pub async fn update_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE posts SET content = ?, images = ?, status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&post.content)
        .bind(encode_string_list(&post.images))
        .bind(&post.status)
        .bind(post.updated_at)
        .bind(&post.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Hard-delete a post; likes, shares and comments cascade
    pub async fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_posts(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_posts_by_author(&self, author_id: &str) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = ?")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    // =========================================================================
    // Post likes and shares
    // =========================================================================

    /// Add an account to a post's like set
    ///
    /// # Returns
    /// `false` if the account had already liked the post.
    pub async fn add_post_like(&self, post_id: &str, account_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO post_likes (post_id, account_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(post_id)
        .bind(account_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove an account from a post's like set
    ///
    /// # Returns
    /// `false` if the account had not liked the post.
    pub async fn remove_post_like(
        &self,
        post_id: &str,
        account_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND account_id = ?")
            .bind(post_id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add an account to a post's share set (idempotent)
    pub async fn add_post_share(&self, post_id: &str, account_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO post_shares (post_id, account_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(post_id)
        .bind(account_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn post_liker_usernames(&self, post_id: &str) -> Result<Vec<String>, AppError> {
        let usernames = sqlx::query_scalar::<_, String>(
            "SELECT a.username FROM post_likes pl JOIN accounts a ON a.id = pl.account_id \
             WHERE pl.post_id = ? ORDER BY pl.created_at",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(usernames)
    }

    pub async fn post_sharer_usernames(&self, post_id: &str) -> Result<Vec<String>, AppError> {
        let usernames = sqlx::query_scalar::<_, String>(
            "SELECT a.username FROM post_shares ps JOIN accounts a ON a.id = ps.account_id \
             WHERE ps.post_id = ? ORDER BY ps.created_at",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(usernames)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, body, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.author_id)
        .bind(&comment.body)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a comment by id across all posts
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let row = sqlx::query(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(row_to_comment)
            .transpose()
            .map_err(Into::into)
    }

    pub async fn delete_comment(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Comments on a post, oldest first
    pub async fn comments_for_post(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE c.post_id = ? ORDER BY c.created_at",
            COMMENT_SELECT
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(row_to_comment)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    // =========================================================================
    // Comment likes
    // =========================================================================

    pub async fn add_comment_like(
        &self,
        comment_id: &str,
        account_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO comment_likes (comment_id, account_id, created_at) \
             VALUES (?, ?, ?)",
        )
        .bind(comment_id)
        .bind(account_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_comment_like(
        &self,
        comment_id: &str,
        account_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM comment_likes WHERE comment_id = ? AND account_id = ?")
                .bind(comment_id)
                .bind(account_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn comment_liker_usernames(
        &self,
        comment_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let usernames = sqlx::query_scalar::<_, String>(
            "SELECT a.username FROM comment_likes cl JOIN accounts a ON a.id = cl.account_id \
             WHERE cl.comment_id = ? ORDER BY cl.created_at",
        )
        .bind(comment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(usernames)
    }
}
