//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database and storage operations.

mod account;
mod post;

pub use account::{AccountService, RegisterParams};
pub use post::PostService;
