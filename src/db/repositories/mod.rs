pub mod game_server_repository;
pub mod mod_repository;
pub mod refresh_token_repository;
pub mod role_repository;
pub mod user_repository;

pub use game_server_repository::GameServerRepository;
pub use mod_repository::ModRepository;
pub use refresh_token_repository::RefreshTokenRepository;
pub use role_repository::RoleRepository;
pub use user_repository::UserRepository;
