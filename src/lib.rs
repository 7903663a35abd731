//! Gamedock server library.
//!
//! Exports the modules shared by the server binary and the test suite:
//! configuration, persistence, the auth core (tokens, sessions,
//! permissions), HTTP middleware, and route wiring.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types for convenience
pub use config::AppSettings;
pub use error::{AppError, AuthError};
pub use routes::AppContext;
