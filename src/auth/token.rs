//! Signed, time-limited bearer tokens (HS256)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::data::Account;
use crate::error::AppError;

/// Token claims: the account's internal id and role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Account role at issuance time
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issue a bearer token for an account
pub fn issue_token(account: &Account, secret: &str, ttl_seconds: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: account.id.clone(),
        role: account.role.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {}", e)))
}

/// Verify a bearer token's signature and expiry
///
/// # Errors
/// Returns `Forbidden` for any invalid or expired token.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Account, EntityId, Role, DEFAULT_AVATAR_URL, DEFAULT_BIO};

    fn test_account() -> Account {
        let now = Utc::now();
        Account {
            id: EntityId::new().0,
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            username: "ann".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::Admin.as_str().to_string(),
            bio: DEFAULT_BIO.to_string(),
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    const SECRET: &str = "test-secret-key-32-bytes-long!!!";

    #[test]
    fn issue_and_verify_round_trip() {
        let account = test_account();
        let token = issue_token(&account, SECRET, 3600).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&test_account(), SECRET, 3600).unwrap();
        assert!(matches!(
            verify_token(&token, "another-secret-key-32-bytes!!!!!"),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // jsonwebtoken's default validation allows 60s of leeway.
        let token = issue_token(&test_account(), SECRET, -120).unwrap();
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            verify_token("not.a.token", SECRET),
            Err(AppError::Forbidden)
        ));
    }
}
