use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;
use sqlx::PgPool;

use super::SessionStoreData;
use crate::config::AppSettings;
use crate::db::repositories::RefreshTokenRepository;
use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::auth::fingerprint::fingerprint_token;
use crate::services::sessions::REVOCATION_TTL;

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    /// When supplied, the refresh-token family it belongs to is retired
    /// along with the access session.
    pub refresh_token: Option<String>,
}

pub async fn logout(
    user: web::ReqData<AuthenticatedUser>,
    payload: Option<web::Json<LogoutRequest>>,
    pool: web::Data<PgPool>,
    settings: web::Data<AppSettings>,
    sessions: SessionStoreData,
) -> Result<HttpResponse, AppError> {
    sessions
        .revoke_session(&user.jti, REVOCATION_TTL)
        .await
        .map_err(AppError::from)?;

    if let Some(refresh_token) = payload.as_ref().and_then(|p| p.refresh_token.as_deref()) {
        let token_hash = fingerprint_token(&settings.jwt.secret, refresh_token)?;
        let refresh_repo = RefreshTokenRepository::new(pool.get_ref().clone());

        if let Some(record) = refresh_repo.find_by_hash(&token_hash).await? {
            if record.user_id == user.user_id {
                refresh_repo.revoke_family(&record.family_id).await?;
            }
        }
    }

    info!("User {} logged out (jti {})", user.user_id, user.jti);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// "Log out everywhere": revokes every active session of the caller and
/// burns all their refresh tokens across every family.
pub async fn logout_all(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<PgPool>,
    sessions: SessionStoreData,
) -> Result<HttpResponse, AppError> {
    sessions
        .revoke_all_user_sessions(user.user_id)
        .await
        .map_err(AppError::from)?;

    let revoked = RefreshTokenRepository::new(pool.get_ref().clone())
        .revoke_all_for_user(user.user_id)
        .await?;

    info!(
        "User {} logged out everywhere ({} refresh tokens revoked)",
        user.user_id, revoked
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out of all sessions"
    })))
}
