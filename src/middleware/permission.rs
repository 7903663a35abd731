use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::{ok, ready, Ready};
use log::warn;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::{AppError, AuthError};
use crate::models::AuthenticatedUser;
use crate::services::auth::permissions::PermissionService;

/// Route guard requiring one exact (resource, action) permission.
///
/// Runs after [`AuthenticationGate`](crate::middleware::AuthenticationGate)
/// and consults the permission resolver on every request. Insufficient
/// permissions are 403; a resolver that cannot answer (store down,
/// unknown user) is 500, never a silent deny or allow.
#[derive(Clone)]
pub struct RequirePermission {
    permission_service: Arc<PermissionService>,
    resource: &'static str,
    action: &'static str,
}

impl RequirePermission {
    pub fn new(
        permission_service: Arc<PermissionService>,
        resource: &'static str,
        action: &'static str,
    ) -> Self {
        Self {
            permission_service,
            resource,
            action,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequirePermission
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequirePermissionMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequirePermissionMiddleware {
            service: Arc::new(service),
            permission_service: self.permission_service.clone(),
            resource: self.resource,
            action: self.action,
        })
    }
}

pub struct RequirePermissionMiddleware<S> {
    service: Arc<S>,
    permission_service: Arc<PermissionService>,
    resource: &'static str,
    action: &'static str,
}

impl<S, B> Service<ServiceRequest> for RequirePermissionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let permission_service = self.permission_service.clone();
        let resource = self.resource;
        let action = self.action;

        let user = match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => user,
            None => {
                warn!(
                    "Permission guard reached without authentication for path: {}",
                    req.path()
                );
                return Box::pin(ready(Err(
                    AppError::Unauthorized("Not authenticated".to_string()).into(),
                )));
            }
        };

        Box::pin(async move {
            let allowed = permission_service
                .has_permission(user.user_id, resource, action)
                .await
                .map_err(AppError::from)?;

            if !allowed {
                warn!(
                    "User {} denied {}:{} on path {}",
                    user.user_id,
                    resource,
                    action,
                    req.path()
                );
                return Err(AppError::from(AuthError::PermissionDenied(format!(
                    "{}:{}",
                    resource, action
                )))
                .into());
            }

            service.call(req).await
        })
    }
}

/// Route guard requiring an exact role name. Kept alongside
/// [`RequirePermission`] for checks that are about who the caller is
/// rather than what they may do.
#[derive(Clone)]
pub struct RequireRole {
    permission_service: Arc<PermissionService>,
    role_name: &'static str,
}

impl RequireRole {
    pub fn new(permission_service: Arc<PermissionService>, role_name: &'static str) -> Self {
        Self {
            permission_service,
            role_name,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireRoleMiddleware {
            service: Arc::new(service),
            permission_service: self.permission_service.clone(),
            role_name: self.role_name,
        })
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Arc<S>,
    permission_service: Arc<PermissionService>,
    role_name: &'static str,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let permission_service = self.permission_service.clone();
        let role_name = self.role_name;

        let user = match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => user,
            None => {
                return Box::pin(ready(Err(
                    AppError::Unauthorized("Not authenticated".to_string()).into(),
                )));
            }
        };

        Box::pin(async move {
            let matches = permission_service
                .has_role(user.user_id, role_name)
                .await
                .map_err(AppError::from)?;

            if !matches {
                warn!(
                    "User {} lacks role {} required by path {}",
                    user.user_id,
                    role_name,
                    req.path()
                );
                return Err(
                    AppError::Forbidden(format!("Requires role: {}", role_name)).into(),
                );
            }

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::RoleRepository;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};
    use sqlx::postgres::PgPoolOptions;

    use crate::middleware::test_harness;

    fn detached_permission_service() -> Arc<PermissionService> {
        // Lazy pool; never connects because the guard rejects before any
        // lookup when no identity is present.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        Arc::new(PermissionService::new(RoleRepository::new(pool)))
    }

    #[actix_web::test]
    async fn guard_rejects_unauthenticated_requests() {
        let app = test::init_service(
            App::new().service(
                web::resource("/guarded")
                    .wrap(RequirePermission::new(
                        detached_permission_service(),
                        "game_server",
                        "read",
                    ))
                    .route(web::get().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/guarded").to_request();
        let res = test_harness::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn role_guard_rejects_unauthenticated_requests() {
        let app = test::init_service(
            App::new().service(
                web::resource("/guarded")
                    .wrap(RequireRole::new(detached_permission_service(), "admin"))
                    .route(web::get().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/guarded").to_request();
        let res = test_harness::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
