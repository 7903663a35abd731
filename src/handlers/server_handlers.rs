use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;
use sqlx::PgPool;

use crate::db::repositories::GameServerRepository;
use crate::error::AppError;
use crate::models::{
    AuthenticatedUser, GameServer, ADMIN_BYPASS_ACTION, ADMIN_BYPASS_RESOURCE,
    SERVER_STATUS_RUNNING, SERVER_STATUS_STOPPED,
};
use crate::services::auth::permissions::PermissionService;

#[derive(Debug, Deserialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub image: String,
    pub port: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServerRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub port: Option<i32>,
}

fn validate_port(port: Option<i32>) -> Result<(), AppError> {
    if let Some(port) = port {
        if !(1..=65535).contains(&port) {
            return Err(AppError::Validation(
                "Port must be between 1 and 65535".to_string(),
            ));
        }
    }
    Ok(())
}

async fn is_admin(permissions: &PermissionService, user_id: i64) -> Result<bool, AppError> {
    permissions
        .has_permission(user_id, ADMIN_BYPASS_RESOURCE, ADMIN_BYPASS_ACTION)
        .await
        .map_err(AppError::from)
}

/// Loads a server and enforces that the caller owns it or is an admin.
async fn load_for_caller(
    repo: &GameServerRepository,
    permissions: &PermissionService,
    user: &AuthenticatedUser,
    id: i64,
) -> Result<GameServer, AppError> {
    let server = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Game server not found: {}", id)))?;

    if server.owner_id != user.user_id && !is_admin(permissions, user.user_id).await? {
        return Err(AppError::Forbidden(
            "Not the owner of this server".to_string(),
        ));
    }

    Ok(server)
}

/// Admins see every server; everyone else sees their own.
pub async fn list_servers(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<PgPool>,
    permissions: web::Data<PermissionService>,
) -> Result<HttpResponse, AppError> {
    let repo = GameServerRepository::new(pool.get_ref().clone());

    let servers = if is_admin(&permissions, user.user_id).await? {
        repo.list_all().await?
    } else {
        repo.list_by_owner(user.user_id).await?
    };

    Ok(HttpResponse::Ok().json(servers))
}

pub async fn create_server(
    user: web::ReqData<AuthenticatedUser>,
    payload: web::Json<CreateServerRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Server name is required".to_string()));
    }
    if payload.image.trim().is_empty() {
        return Err(AppError::Validation("Server image is required".to_string()));
    }
    validate_port(payload.port)?;

    let repo = GameServerRepository::new(pool.get_ref().clone());
    let server = repo
        .create(
            payload.name.trim(),
            payload.image.trim(),
            payload.port,
            user.user_id,
        )
        .await?;

    info!(
        "User {} created game server {} ({})",
        user.user_id, server.name, server.id
    );

    Ok(HttpResponse::Created().json(server))
}

pub async fn get_server(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    permissions: web::Data<PermissionService>,
) -> Result<HttpResponse, AppError> {
    let repo = GameServerRepository::new(pool.get_ref().clone());
    let server = load_for_caller(&repo, &permissions, &user, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(server))
}

pub async fn update_server(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<i64>,
    payload: web::Json<UpdateServerRequest>,
    pool: web::Data<PgPool>,
    permissions: web::Data<PermissionService>,
) -> Result<HttpResponse, AppError> {
    validate_port(payload.port)?;

    let repo = GameServerRepository::new(pool.get_ref().clone());
    let id = path.into_inner();
    load_for_caller(&repo, &permissions, &user, id).await?;

    let server = repo
        .update(
            id,
            payload.name.as_deref(),
            payload.image.as_deref(),
            payload.port,
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Game server not found: {}", id)))?;

    Ok(HttpResponse::Ok().json(server))
}

pub async fn delete_server(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    permissions: web::Data<PermissionService>,
) -> Result<HttpResponse, AppError> {
    let repo = GameServerRepository::new(pool.get_ref().clone());
    let id = path.into_inner();
    load_for_caller(&repo, &permissions, &user, id).await?;

    repo.delete(id).await?;
    info!("User {} deleted game server {}", user.user_id, id);

    Ok(HttpResponse::NoContent().finish())
}

async fn transition_status(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    permissions: web::Data<PermissionService>,
    status: &'static str,
) -> Result<HttpResponse, AppError> {
    let repo = GameServerRepository::new(pool.get_ref().clone());
    let id = path.into_inner();
    load_for_caller(&repo, &permissions, &user, id).await?;

    let server = repo
        .set_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Game server not found: {}", id)))?;

    info!(
        "User {} set game server {} status to {}",
        user.user_id, id, status
    );

    Ok(HttpResponse::Ok().json(server))
}

pub async fn start_server(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    permissions: web::Data<PermissionService>,
) -> Result<HttpResponse, AppError> {
    transition_status(user, path, pool, permissions, SERVER_STATUS_RUNNING).await
}

pub async fn stop_server(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    permissions: web::Data<PermissionService>,
) -> Result<HttpResponse, AppError> {
    transition_status(user, path, pool, permissions, SERVER_STATUS_STOPPED).await
}
