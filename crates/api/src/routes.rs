use crate::handlers;
use crate::middleware;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Auth routes
        .route(
            "/auth/register",
            post(handlers::auth::register).layer(from_fn_with_state(
                state.clone(),
                middleware::rate_limit_registration,
            )),
        )
        .route(
            "/auth/login",
            post(handlers::auth::login)
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit_login)),
        )
        .route("/auth/refresh", post(handlers::auth::refresh_token));

    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        // Users
        .route("/users/me", patch(handlers::users::update_me))
        .route("/users/me/password", post(handlers::users::change_password))
        // Organizations
        .route(
            "/organizations",
            post(handlers::organizations::create_organization)
                .get(handlers::organizations::list_organizations),
        )
        .route(
            "/organizations/invitations",
            get(handlers::organizations::list_invitations),
        )
        .route("/organizations/addUser", post(handlers::organizations::add_user))
        .route(
            "/organizations/:id",
            get(handlers::organizations::get_organization)
                .patch(handlers::organizations::update_organization)
                .delete(handlers::organizations::delete_organization),
        )
        .route(
            "/organizations/:id/accept",
            post(handlers::organizations::accept_invitation),
        )
        .route(
            "/organizations/:id/decline",
            post(handlers::organizations::decline_invitation),
        )
        .route(
            "/organizations/:id/leave",
            post(handlers::organizations::leave_organization),
        )
        .route(
            "/organizations/:id/members",
            get(handlers::organizations::list_members),
        )
        .route(
            "/organizations/:id/members/:user_id",
            patch(handlers::organizations::update_member_role)
                .delete(handlers::organizations::remove_member),
        )
        // Documents
        .route("/documents", post(handlers::documents::create_document))
        .route(
            "/documents/organization/:id",
            get(handlers::documents::list_documents),
        )
        .route(
            "/documents/organization/:id/trashed",
            get(handlers::documents::list_trashed_documents)
                .delete(handlers::documents::empty_trash),
        )
        .route(
            "/documents/:id",
            get(handlers::documents::get_document)
                .patch(handlers::documents::update_document)
                .delete(handlers::documents::delete_document),
        )
        .route("/documents/:id/trash", post(handlers::documents::trash_document))
        .route(
            "/documents/:id/restore",
            post(handlers::documents::restore_document),
        )
        // Document versions
        .route(
            "/document-versions",
            post(handlers::versions::upload_version)
                .layer(DefaultBodyLimit::max(state.upload_body_limit)),
        )
        .route(
            "/document-versions/document/:document_id",
            get(handlers::versions::list_versions),
        )
        .route(
            "/document-versions/:id",
            get(handlers::versions::get_version).delete(handlers::versions::delete_version),
        )
        .route(
            "/document-versions/:id/download",
            get(handlers::versions::download_version),
        )
        // Audit logs
        .route(
            "/audit-logs/organization/:id",
            get(handlers::audit::list_organization_logs),
        )
        .route(
            "/audit-logs/document/:id",
            get(handlers::audit::list_document_logs),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    public.merge(protected).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::ErrorResponse;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use docvault_auth::JwtService;
    use docvault_database::Database;
    use docvault_documents::{LocalStorage, Storage};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    // The pool never connects; these requests are answered before any query runs
    fn test_router() -> (Router, Config) {
        let config = Config::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .expect("Invalid database URL");
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(&config.storage_path));
        let state = Arc::new(AppState::new(
            &config,
            Database::from_pool(pool),
            None,
            storage,
        ));

        (create_router(state), config)
    }

    fn bearer(config: &Config) -> String {
        let token = JwtService::new(&config.jwt_secret)
            .generate_access_token(Uuid::new_v4(), "router@example.com")
            .unwrap();
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let (app, _) = test_router();

        for uri in ["/auth/me", "/organizations", "/documents/organization/x/trashed"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let (app, config) = test_router();
        let refresh = JwtService::new(&config.jwt_secret)
            .generate_refresh_token(Uuid::new_v4(), "router@example.com")
            .unwrap();

        let response = app
            .oneshot(
                Request::get("/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", refresh))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    async fn error_body(response: axum::response::Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).expect("error body should be JSON")
    }

    #[tokio::test]
    async fn test_malformed_ids_are_rejected() {
        let (app, config) = test_router();

        let response = app
            .oneshot(
                Request::get("/documents/not-a-uuid")
                    .header(header::AUTHORIZATION, bearer(&config))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.error, "validation_error");
    }

    #[tokio::test]
    async fn test_unknown_role_is_a_validation_error() {
        let (app, config) = test_router();
        let body = serde_json::json!({
            "organization_id": Uuid::new_v4(),
            "email": "someone@example.com",
            "role": "admin",
        });

        let response = app
            .oneshot(
                Request::post("/organizations/addUser")
                    .header(header::AUTHORIZATION, bearer(&config))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error = error_body(response).await;
        assert_eq!(error.error, "validation_error");
        assert!(error.message.contains("role"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let (app, config) = test_router();

        for (uri, body) in [
            ("/documents", "{\"title\": "),
            ("/organizations", "[]"),
            ("/auth/refresh", "{}"),
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::post(uri)
                        .header(header::AUTHORIZATION, bearer(&config))
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(error_body(response).await.error, "validation_error", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (app, config) = test_router();

        let response = app
            .oneshot(
                Request::get("/nope")
                    .header(header::AUTHORIZATION, bearer(&config))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
