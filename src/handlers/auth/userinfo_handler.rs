use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::db::repositories::UserRepository;
use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::auth::permissions::PermissionService;

/// Identity, role, and permission set of the calling user.
pub async fn get_user_info(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<PgPool>,
    permissions: web::Data<PermissionService>,
) -> Result<HttpResponse, AppError> {
    let record = UserRepository::new(pool.get_ref().clone())
        .get_by_id(user.user_id)
        .await?;

    let (role, permission_set) = permissions
        .role_and_permissions_of_user(user.user_id)
        .await
        .map_err(AppError::from)?;

    let permission_names: Vec<String> = permission_set
        .iter()
        .map(|p| format!("{}:{}", p.resource, p.action))
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "id": record.id,
        "username": record.username,
        "email": record.email,
        "role": role.name,
        "permissions": permission_names,
    })))
}
