pub mod login_handler;
pub mod logout_handler;
pub mod refresh_handler;
pub mod register_handler;
pub mod userinfo_handler;

pub use login_handler::login;
pub use logout_handler::{logout, logout_all};
pub use refresh_handler::refresh;
pub use register_handler::register;
pub use userinfo_handler::get_user_info;

use actix_web::{http::header::USER_AGENT, web, HttpRequest};
use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config::AppSettings;
use crate::db::repositories::RefreshTokenRepository;
use crate::error::AppError;
use crate::models::SessionData;
use crate::services::auth::fingerprint::fingerprint_token;
use crate::services::auth::tokens::TokenService;
use crate::services::sessions::SessionStore;

/// Body returned by both `/auth/login` and `/auth/refresh`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// Where a login or refresh request came from, recorded with the session
/// and the refresh-token row.
pub(crate) struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

pub(crate) fn client_info(req: &HttpRequest) -> ClientInfo {
    let ip_address = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    ClientInfo {
        ip_address,
        user_agent,
    }
}

/// Issues an access/refresh token pair for a user within the given
/// family, persists the refresh-token fingerprint, and registers the
/// access token's session. Shared by login and refresh.
pub(crate) async fn issue_token_pair(
    tokens: &TokenService,
    sessions: &dyn SessionStore,
    pool: &PgPool,
    settings: &AppSettings,
    user_id: i64,
    username: &str,
    family_id: &str,
    client: &ClientInfo,
) -> Result<TokenResponse, AppError> {
    let (access_token, jti) = tokens.issue_access_token(user_id, username)?;
    let refresh_token = tokens.issue_refresh_token(user_id, family_id)?;

    let token_hash = fingerprint_token(&settings.jwt.secret, &refresh_token)?;
    let refresh_repo = RefreshTokenRepository::new(pool.clone());
    refresh_repo
        .insert(
            user_id,
            &token_hash,
            family_id,
            &client.ip_address,
            &client.user_agent,
            Utc::now() + tokens.refresh_expiry(),
        )
        .await?;

    let session = SessionData::new(
        user_id,
        client.ip_address.clone(),
        client.user_agent.clone(),
    );
    let session_ttl = tokens
        .access_expiry()
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(15 * 60));

    // A dead session store must not block sign-in; the token stays valid
    // statelessly and simply cannot be revoked early.
    if let Err(e) = sessions.store_session(&jti, &session, session_ttl).await {
        warn!(
            "Failed to register session for user {} (jti {}): {}",
            user_id, jti, e
        );
    }

    Ok(TokenResponse {
        access_token,
        refresh_token,
        expires_in: tokens.access_expiry().num_seconds(),
        token_type: "Bearer".to_string(),
    })
}

/// Convenience alias used by the handler signatures below.
pub(crate) type SessionStoreData = web::Data<dyn SessionStore>;
