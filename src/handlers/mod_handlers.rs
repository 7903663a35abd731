use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;
use sqlx::PgPool;

use crate::db::repositories::ModRepository;
use crate::error::AppError;
use crate::models::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct CreateModRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateModRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub version: Option<String>,
}

fn validate_create(payload: &CreateModRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty() || payload.slug.trim().is_empty() {
        return Err(AppError::Validation(
            "Name and slug are required".to_string(),
        ));
    }
    Ok(())
}

/// The mod catalog is shared reference data; any caller holding the
/// `mod` permissions sees and edits the same entries.
pub async fn list_mods(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let mods = ModRepository::new(pool.get_ref().clone()).list_all().await?;
    Ok(HttpResponse::Ok().json(mods))
}

pub async fn get_mod(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let game_mod = ModRepository::new(pool.get_ref().clone())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Mod not found: {}", id)))?;

    Ok(HttpResponse::Ok().json(game_mod))
}

pub async fn create_mod(
    user: web::ReqData<AuthenticatedUser>,
    payload: web::Json<CreateModRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    validate_create(&payload)?;

    let game_mod = ModRepository::new(pool.get_ref().clone())
        .create(
            payload.name.trim(),
            payload.slug.trim(),
            payload.description.trim(),
            payload.source_url.trim(),
            payload.version.trim(),
        )
        .await?;

    info!(
        "User {} registered mod {} ({})",
        user.user_id, game_mod.slug, game_mod.id
    );

    Ok(HttpResponse::Created().json(game_mod))
}

pub async fn update_mod(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<i64>,
    payload: web::Json<UpdateModRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let game_mod = ModRepository::new(pool.get_ref().clone())
        .update(
            id,
            payload.name.as_deref(),
            payload.description.as_deref(),
            payload.source_url.as_deref(),
            payload.version.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Mod not found: {}", id)))?;

    info!("User {} updated mod {}", user.user_id, id);

    Ok(HttpResponse::Ok().json(game_mod))
}

pub async fn delete_mod(
    user: web::ReqData<AuthenticatedUser>,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let deleted = ModRepository::new(pool.get_ref().clone()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Mod not found: {}", id)));
    }

    info!("User {} deleted mod {}", user.user_id, id);

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(name: &str, slug: &str) -> CreateModRequest {
        CreateModRequest {
            name: name.to_string(),
            slug: slug.to_string(),
            description: String::new(),
            source_url: String::new(),
            version: String::new(),
        }
    }

    #[test]
    fn create_requires_name_and_slug() {
        assert!(validate_create(&request("EssentialsX", "essentialsx")).is_ok());

        for (name, slug) in [("", "essentialsx"), ("EssentialsX", ""), ("  ", "  ")] {
            let err = validate_create(&request(name, slug)).unwrap_err();
            match err {
                AppError::Validation(msg) => {
                    assert_eq!(msg, "Name and slug are required");
                }
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }
}
