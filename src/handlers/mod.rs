pub mod auth;
pub mod health;
pub mod mod_handlers;
pub mod server_handlers;
pub mod user_handlers;
