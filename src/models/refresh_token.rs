use chrono::{DateTime, Utc};

/// Persisted fingerprint of an issued refresh token. The raw token is
/// never stored; `token_hash` is a keyed HMAC-SHA-256 of it. Rows in
/// the same `family_id` descend from one login, which is what makes
/// reuse detection possible: presenting a token whose row is already
/// revoked burns the whole family.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub family_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}
