use actix_web::web;
use std::sync::Arc;

use crate::handlers;
use crate::middleware::{AuthenticationGate, RequirePermission};
use crate::services::auth::permissions::PermissionService;
use crate::services::auth::tokens::TokenService;
use crate::services::sessions::SessionStore;

/// Service handles shared between route construction and the handlers.
/// The same Arcs registered here as middleware state are exposed to
/// handlers through `app_data` in `main`.
#[derive(Clone)]
pub struct AppContext {
    pub tokens: Arc<TokenService>,
    pub sessions: Arc<dyn SessionStore>,
    pub permissions: Arc<PermissionService>,
}

/// Wires the full route tree:
///
/// - public: `/health`, `/auth/{register,login,refresh}`
/// - authenticated: `/auth/{logout,logout-all,me}`
/// - authenticated + permission-guarded: everything under `/api`
pub fn configure_routes(cfg: &mut web::ServiceConfig, ctx: &AppContext) {
    let gate = AuthenticationGate::new(ctx.tokens.clone(), ctx.sessions.clone());
    let guard = |resource: &'static str, action: &'static str| {
        RequirePermission::new(ctx.permissions.clone(), resource, action)
    };

    cfg.route("/health", web::get().to(handlers::health::health_check));

    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(handlers::auth::register))
            .route("/login", web::post().to(handlers::auth::login))
            .route("/refresh", web::post().to(handlers::auth::refresh))
            .service(
                web::scope("")
                    .wrap(gate.clone())
                    .route("/logout", web::post().to(handlers::auth::logout))
                    .route("/logout-all", web::post().to(handlers::auth::logout_all))
                    .route("/me", web::get().to(handlers::auth::get_user_info)),
            ),
    );

    cfg.service(
        web::scope("/api")
            .wrap(gate)
            .service(
                web::resource("/servers")
                    .route(
                        web::get()
                            .to(handlers::server_handlers::list_servers)
                            .wrap(guard("game_server", "read")),
                    )
                    .route(
                        web::post()
                            .to(handlers::server_handlers::create_server)
                            .wrap(guard("game_server", "create")),
                    ),
            )
            .service(
                web::resource("/servers/{id}")
                    .route(
                        web::get()
                            .to(handlers::server_handlers::get_server)
                            .wrap(guard("game_server", "read")),
                    )
                    .route(
                        web::put()
                            .to(handlers::server_handlers::update_server)
                            .wrap(guard("game_server", "update")),
                    )
                    .route(
                        web::delete()
                            .to(handlers::server_handlers::delete_server)
                            .wrap(guard("game_server", "delete")),
                    ),
            )
            .route(
                "/servers/{id}/start",
                web::post()
                    .to(handlers::server_handlers::start_server)
                    .wrap(guard("game_server", "start")),
            )
            .route(
                "/servers/{id}/stop",
                web::post()
                    .to(handlers::server_handlers::stop_server)
                    .wrap(guard("game_server", "stop")),
            )
            .service(
                web::resource("/mods")
                    .route(
                        web::get()
                            .to(handlers::mod_handlers::list_mods)
                            .wrap(guard("mod", "read")),
                    )
                    .route(
                        web::post()
                            .to(handlers::mod_handlers::create_mod)
                            .wrap(guard("mod", "create")),
                    ),
            )
            .service(
                web::resource("/mods/{id}")
                    .route(
                        web::get()
                            .to(handlers::mod_handlers::get_mod)
                            .wrap(guard("mod", "read")),
                    )
                    .route(
                        web::put()
                            .to(handlers::mod_handlers::update_mod)
                            .wrap(guard("mod", "update")),
                    )
                    .route(
                        web::delete()
                            .to(handlers::mod_handlers::delete_mod)
                            .wrap(guard("mod", "delete")),
                    ),
            )
            .route(
                "/users",
                web::get()
                    .to(handlers::user_handlers::list_users)
                    .wrap(guard("user", "read")),
            )
            .route(
                "/users/{id}/revoke-sessions",
                web::post()
                    .to(handlers::user_handlers::revoke_user_sessions)
                    .wrap(guard("user", "update")),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::RoleRepository;
    use crate::services::sessions::NoopSessionStore;
    use actix_web::{http::StatusCode, test, App};
    use sqlx::postgres::PgPoolOptions;

    use crate::middleware::test_harness;

    fn test_context() -> AppContext {
        // Lazy pool: the routes exercised below never reach the database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();

        AppContext {
            tokens: Arc::new(TokenService::new(
                "a-test-secret-of-at-least-32-bytes!",
                "gamedock",
                15,
                7,
            )),
            sessions: Arc::new(NoopSessionStore),
            permissions: Arc::new(PermissionService::new(RoleRepository::new(pool))),
        }
    }

    #[actix_web::test]
    async fn health_is_public() {
        let ctx = test_context();
        let app =
            test::init_service(App::new().configure(|cfg| configure_routes(cfg, &ctx))).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn api_scope_requires_authentication() {
        let ctx = test_context();
        let app =
            test::init_service(App::new().configure(|cfg| configure_routes(cfg, &ctx))).await;

        let req = test::TestRequest::get().uri("/api/servers").to_request();
        let res = test_harness::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn mod_catalog_requires_authentication() {
        let ctx = test_context();
        let app =
            test::init_service(App::new().configure(|cfg| configure_routes(cfg, &ctx))).await;

        for uri in ["/api/mods", "/api/mods/1"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let res = test_harness::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_web::test]
    async fn authenticated_auth_scope_requires_a_token() {
        let ctx = test_context();
        let app =
            test::init_service(App::new().configure(|cfg| configure_routes(cfg, &ctx))).await;

        let req = test::TestRequest::post().uri("/auth/logout").to_request();
        let res = test_harness::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
