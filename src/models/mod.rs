pub mod authenticated_user;
pub mod claims;
pub mod game_mod;
pub mod game_server;
pub mod refresh_token;
pub mod role;
pub mod session;
pub mod user;

pub use authenticated_user::AuthenticatedUser;
pub use claims::{AccessTokenClaims, RefreshTokenClaims};
pub use game_mod::GameMod;
pub use game_server::{GameServer, SERVER_STATUS_RUNNING, SERVER_STATUS_STOPPED};
pub use refresh_token::RefreshTokenRecord;
pub use role::{Permission, Role, ADMIN_BYPASS_ACTION, ADMIN_BYPASS_RESOURCE};
pub use session::SessionData;
pub use user::{User, UserResponse};
