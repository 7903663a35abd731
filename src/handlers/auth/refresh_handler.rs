use actix_web::{web, HttpRequest, HttpResponse};
use log::{info, warn};
use serde::Deserialize;
use sqlx::PgPool;

use super::{client_info, issue_token_pair, SessionStoreData};
use crate::config::AppSettings;
use crate::db::repositories::{RefreshTokenRepository, UserRepository};
use crate::error::AppError;
use crate::models::{RefreshTokenClaims, RefreshTokenRecord};
use crate::services::auth::fingerprint::{constant_time_equal, fingerprint_token};
use crate::services::auth::tokens::TokenService;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Outcome of checking a presented refresh token against its stored
/// fingerprint row.
#[derive(Debug, PartialEq, Eq)]
enum RefreshDecision {
    /// The row is live and bound to the presented claims: rotate.
    Rotate,
    /// No row, an already-retired row, or a row bound to a different
    /// user/family: burn the family.
    Replay,
}

fn classify_refresh(
    record: Option<&RefreshTokenRecord>,
    claims: &RefreshTokenClaims,
) -> RefreshDecision {
    match record {
        Some(record)
            if !record.is_revoked()
                && record.user_id == claims.user_id
                && constant_time_equal(&record.family_id, &claims.family_id) =>
        {
            RefreshDecision::Rotate
        }
        _ => RefreshDecision::Replay,
    }
}

/// Exchange a refresh token for a fresh access/refresh pair.
///
/// Every exchange retires the presented token and issues a successor in
/// the same family. Presenting a token whose row is missing or already
/// retired is treated as replay: the whole family is burned and every
/// session of the user is revoked.
pub async fn refresh(
    req: HttpRequest,
    payload: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    settings: web::Data<AppSettings>,
    tokens: web::Data<TokenService>,
    sessions: SessionStoreData,
) -> Result<HttpResponse, AppError> {
    let claims = tokens
        .validate_refresh_token(&payload.refresh_token)
        .map_err(AppError::from)?;

    let token_hash = fingerprint_token(&settings.jwt.secret, &payload.refresh_token)?;
    let refresh_repo = RefreshTokenRepository::new(pool.get_ref().clone());

    let record = refresh_repo.find_by_hash(&token_hash).await?;
    if classify_refresh(record.as_ref(), &claims) == RefreshDecision::Replay {
        warn!(
            "Refresh token replay detected for user {} (family {}); revoking family",
            claims.user_id, claims.family_id
        );
        refresh_repo.revoke_family(&claims.family_id).await?;
        if let Err(e) = sessions.revoke_all_user_sessions(claims.user_id).await {
            warn!(
                "Failed to revoke sessions of user {} after replay: {}",
                claims.user_id, e
            );
        }
        return Err(AppError::Auth("Refresh token is no longer valid".to_string()));
    }

    let user = UserRepository::new(pool.get_ref().clone())
        .get_by_id(claims.user_id)
        .await?;

    if !user.is_active {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    refresh_repo.revoke_by_hash(&token_hash).await?;

    let client = client_info(&req);
    let response = issue_token_pair(
        &tokens,
        sessions.get_ref(),
        pool.get_ref(),
        &settings,
        user.id,
        &user.username,
        &claims.family_id,
        &client,
    )
    .await?;

    info!(
        "Rotated refresh token for user {} (family {})",
        user.id, claims.family_id
    );

    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn claims(user_id: i64, family_id: &str) -> RefreshTokenClaims {
        let now = Utc::now().timestamp();
        RefreshTokenClaims {
            user_id,
            family_id: family_id.to_string(),
            jti: "jti-1".to_string(),
            iat: now,
            nbf: now,
            exp: now + 3600,
            iss: "gamedock".to_string(),
        }
    }

    fn record(user_id: i64, family_id: &str) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            id: 1,
            user_id,
            token_hash: "deadbeef".to_string(),
            family_id: family_id.to_string(),
            ip_address: String::new(),
            user_agent: String::new(),
            expires_at: now + Duration::days(7),
            revoked_at: None,
            created_at: now,
        }
    }

    #[test]
    fn live_matching_row_rotates() {
        let decision = classify_refresh(Some(&record(7, "fam-a")), &claims(7, "fam-a"));
        assert_eq!(decision, RefreshDecision::Rotate);
    }

    #[test]
    fn missing_row_is_replay() {
        assert_eq!(
            classify_refresh(None, &claims(7, "fam-a")),
            RefreshDecision::Replay
        );
    }

    #[test]
    fn retired_row_is_replay() {
        let mut retired = record(7, "fam-a");
        retired.revoked_at = Some(Utc::now());
        assert_eq!(
            classify_refresh(Some(&retired), &claims(7, "fam-a")),
            RefreshDecision::Replay
        );
    }

    #[test]
    fn row_bound_to_another_user_is_replay() {
        assert_eq!(
            classify_refresh(Some(&record(8, "fam-a")), &claims(7, "fam-a")),
            RefreshDecision::Replay
        );
    }

    #[test]
    fn row_bound_to_another_family_is_replay() {
        assert_eq!(
            classify_refresh(Some(&record(7, "fam-b")), &claims(7, "fam-a")),
            RefreshDecision::Replay
        );
    }
}
