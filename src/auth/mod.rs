//! Authentication: password hashing, bearer tokens, request extractors

mod middleware;
mod password;
mod token;

pub use middleware::{AdminUser, CurrentUser, MaybeUser};
pub use password::{hash_password, verify_password};
pub use token::{issue_token, verify_token, Claims};
