use actix_web::{web, HttpResponse};
use log::info;
use sqlx::PgPool;

use crate::db::repositories::{RefreshTokenRepository, UserRepository};
use crate::error::AppError;
use crate::models::{AuthenticatedUser, UserResponse};
use crate::services::sessions::SessionStore;

pub async fn list_users(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let users = UserRepository::new(pool.get_ref().clone())
        .list_all()
        .await?;

    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

/// Administrative "log this user out everywhere": revokes every active
/// session of the target user and all their refresh tokens.
pub async fn revoke_user_sessions(
    caller: web::ReqData<AuthenticatedUser>,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    sessions: web::Data<dyn SessionStore>,
) -> Result<HttpResponse, AppError> {
    let target_id = path.into_inner();

    // 404 before revocation for ids that resolve to nothing
    UserRepository::new(pool.get_ref().clone())
        .get_by_id(target_id)
        .await?;

    sessions
        .revoke_all_user_sessions(target_id)
        .await
        .map_err(AppError::from)?;

    let revoked = RefreshTokenRepository::new(pool.get_ref().clone())
        .revoke_all_for_user(target_id)
        .await?;

    info!(
        "User {} revoked all sessions of user {} ({} refresh tokens)",
        caller.user_id, target_id, revoked
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "All sessions revoked",
        "user_id": target_id,
    })))
}
