pub mod fingerprint;
pub mod password;
pub mod permissions;
pub mod tokens;
