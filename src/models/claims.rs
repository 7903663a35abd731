use serde::{Deserialize, Serialize};

/// Claims carried by a short-lived access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject user ID
    pub user_id: i64,
    /// Display name of the subject
    pub username: String,
    /// JWT ID, the session and revocation key
    pub jti: String,
    /// Issued at (UTC seconds)
    pub iat: i64,
    /// Not valid before (UTC seconds)
    pub nbf: i64,
    /// Expiration time (UTC seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Claims carried by a long-lived refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// Subject user ID
    pub user_id: i64,
    /// Family grouping every refresh token descended from one login
    pub family_id: String,
    /// JWT ID
    pub jti: String,
    /// Issued at (UTC seconds)
    pub iat: i64,
    /// Not valid before (UTC seconds)
    pub nbf: i64,
    /// Expiration time (UTC seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}
