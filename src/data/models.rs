//! Data models
//!
//! Rust structs representing database entities and their hydrated views.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Account
// =============================================================================

/// Default bio applied at registration when none is supplied
pub const DEFAULT_BIO: &str = "This is my bio";

/// Default avatar applied at registration when none is supplied
pub const DEFAULT_AVATAR_URL: &str =
    "https://cdn.pixabay.com/photo/2023/02/18/11/00/icon-7797704_640.png";

/// A registered user identity
///
/// Email and username are globally unique. Accounts are never deleted
/// by any exposed operation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    pub username: String,
    /// Argon2 hash, never serialized into responses
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// "user" or "admin"
    pub role: String,
    pub bio: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }
}

/// Account roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse a client-supplied role string, defaulting to `user`
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw.map(str::trim) {
            None | Some("") | Some("user") => Ok(Self::User),
            Some("admin") => Ok(Self::Admin),
            Some(other) => Err(format!("unknown role: {}", other)),
        }
    }
}

// =============================================================================
// Post
// =============================================================================

/// Post visibility status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Public,
    Private,
    Draft,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Draft => "draft",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "draft" => Ok(Self::Draft),
            other => Err(format!(
                "status must be one of public, private, draft (got: {})",
                other
            )),
        }
    }
}

/// A content item owned by an account
///
/// `username` and `avatar_url` are resolved from the author account at read
/// time by a join, never stored, so account edits always propagate.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub username: String,
    pub avatar_url: String,
    pub content: String,
    /// URLs of attached images, in upload order
    pub images: Vec<String>,
    pub tags: Vec<String>,
    /// "public", "private" or "draft"
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Whether `viewer` may see this post
    ///
    /// Public posts are visible to everyone. Private and draft posts are
    /// visible only to their author or an admin.
    pub fn visible_to(&self, viewer: Option<&Account>) -> bool {
        if self.status == PostStatus::Public.as_str() {
            return true;
        }
        match viewer {
            Some(account) => account.id == self.author_id || account.is_admin(),
            None => false,
        }
    }
}

// =============================================================================
// Comment
// =============================================================================

/// A reply attached to a post
///
/// Individually addressable by id across all posts. Display fields are
/// join-resolved like [`Post`]'s.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub username: String,
    pub avatar_url: String,
    #[serde(rename = "text")]
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Hydrated views
// =============================================================================

/// A comment with its like set resolved to usernames
#[derive(Debug, Clone, Serialize)]
pub struct CommentDetail {
    #[serde(flatten)]
    pub comment: Comment,
    pub likes: Vec<String>,
}

/// A post with likes, shares and comments resolved for API responses
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    /// Usernames of liking accounts
    pub likes: Vec<String>,
    /// Usernames of sharing accounts
    pub shares: Vec<String>,
    pub comments: Vec<CommentDetail>,
}
