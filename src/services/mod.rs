pub mod auth;
pub mod sessions;

// Re-export commonly used types
pub use auth::permissions::PermissionService;
pub use auth::tokens::TokenService;
pub use sessions::{NoopSessionStore, RedisSessionStore, SessionStore, REVOCATION_TTL};
