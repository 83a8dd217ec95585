// src/routes.rs

use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas: login e o webhook chamado pela Meta
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/whatsapp/webhook",
            get(handlers::whatsapp::verify_webhook).post(handlers::whatsapp::receive_webhook),
        );

    let employee_routes = Router::new()
        .route(
            "/",
            post(handlers::employees::create_employee).get(handlers::employees::list_employees),
        )
        .route(
            "/{id}",
            get(handlers::employees::get_employee)
                .patch(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        );

    let role_routes = Router::new()
        .route("/", post(handlers::rbac::create_role).get(handlers::rbac::list_roles))
        .route("/{id}", delete(handlers::rbac::delete_role));

    let lead_routes = Router::new()
        .route("/", post(handlers::leads::create_lead).get(handlers::leads::list_leads))
        .route(
            "/{id}",
            get(handlers::leads::get_lead).delete(handlers::leads::delete_lead),
        )
        .route("/{id}/status", patch(handlers::leads::update_lead_status))
        .route("/{id}/disposition", patch(handlers::leads::update_lead_disposition))
        .route("/{id}/assign", patch(handlers::leads::assign_lead));

    let visit_routes = Router::new()
        .route("/", post(handlers::visits::create_visit).get(handlers::visits::list_visits))
        .route("/{id}", patch(handlers::visits::update_visit));

    let booking_routes = Router::new()
        .route(
            "/",
            post(handlers::bookings::create_booking).get(handlers::bookings::list_bookings),
        )
        .route(
            "/{id}",
            get(handlers::bookings::get_booking).delete(handlers::bookings::delete_booking),
        );

    let property_routes = Router::new()
        .route(
            "/",
            post(handlers::properties::create_property).get(handlers::properties::list_properties),
        )
        .route("/vsid/{vsid}", get(handlers::properties::get_property_by_vsid))
        .route(
            "/{id}",
            get(handlers::properties::get_property)
                .patch(handlers::properties::update_property)
                .delete(handlers::properties::delete_property),
        )
        .route("/{id}/boosters", post(handlers::properties::add_booster))
        .route(
            "/{id}/boosters/{booster_id}",
            patch(handlers::properties::patch_booster).delete(handlers::properties::remove_booster),
        );

    let invoice_routes = Router::new()
        .route(
            "/",
            post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
        )
        .route(
            "/{id}",
            get(handlers::invoices::get_invoice).delete(handlers::invoices::delete_invoice),
        )
        .route("/{id}/status", patch(handlers::invoices::update_invoice_status));

    let whatsapp_routes = Router::new()
        .route("/conversations", get(handlers::whatsapp::list_conversations))
        .route(
            "/conversations/{id}/messages",
            get(handlers::whatsapp::list_messages).post(handlers::whatsapp::send_message),
        )
        .route("/conversations/{id}/read", post(handlers::whatsapp::mark_read));

    let dashboard_routes = Router::new()
        .route("/summary", get(handlers::dashboard::get_summary))
        .route("/leads-by-status", get(handlers::dashboard::get_leads_by_status))
        .route("/leads-by-disposition", get(handlers::dashboard::get_leads_by_disposition))
        .route("/bookings-by-area", get(handlers::dashboard::get_bookings_by_area));

    // Tudo aqui passa pelo auth_guard (cookie ou Bearer)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .nest("/api/employees", employee_routes)
        .nest("/api/roles", role_routes)
        .nest("/api/leads", lead_routes)
        .nest("/api/visits", visit_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/properties", property_routes)
        .nest("/api/invoices", invoice_routes)
        .nest("/api/whatsapp", whatsapp_routes)
        .nest("/api/dashboard", dashboard_routes)
        .route("/api/realtime/ws", get(handlers::realtime::realtime_ws))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let cors = cors_layer(&app_state.config.cors_origins);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// Com origens explícitas o navegador pode enviar o cookie de sessão
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Origem CORS ignorada: '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{config::Config, models::employee::Employee};

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/estate_portal_test".into(),
            jwt_secret: "segredo-de-teste".into(),
            port: 0,
            database_max_connections: 1,
            cookie_name: "token".into(),
            cookie_secure: false,
            jwt_ttl_days: 1,
            dedup_window: Duration::from_secs(10),
            dedup_max_entries: 100,
            whatsapp_verify_token: Some("verifica-me".into()),
            whatsapp_access_token: None,
            whatsapp_phone_number_id: None,
            whatsapp_api_base: "http://localhost:9".into(),
            cors_origins: Vec::new(),
        }
    }

    // O pool é preguiçoso: nenhuma destas rotas chega ao banco
    fn test_state() -> AppState {
        let config = test_config();
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();
        AppState::from_parts(config, pool, None).unwrap()
    }

    fn token_for(state: &AppState, role: &str) -> String {
        let employee = Employee {
            id: Uuid::new_v4(),
            name: "Ana Souza".into(),
            email: "ana@estate.test".into(),
            password_hash: String::new(),
            phone: None,
            role: role.into(),
            department: None,
            alloted_area: vec!["goa".into()],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.auth_service.create_token(&employee).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/api/leads")
                    .header(header::ACCEPT_LANGUAGE, "pt-BR")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Token de autenticação inválido"));
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_rejected() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/api/dashboard/summary")
                    .header(header::AUTHORIZATION, "Bearer nao-e-um-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_cookie_reaches_me() {
        let state = test_state();
        let token = token_for(&state, "sales");
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::COOKIE, format!("token={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["role"], "sales");
    }

    #[tokio::test]
    async fn role_checks_run_before_the_body_is_read() {
        let state = test_state();
        let token = token_for(&state, "sales");
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::post("/api/roles")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn hr_cannot_reach_the_sales_pipeline() {
        let state = test_state();
        let token = token_for(&state, "hr");
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::get("/api/leads")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn webhook_verification_echoes_the_challenge() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/api/whatsapp/webhook?hub.mode=subscribe&hub.verify_token=verifica-me&hub.challenge=1158201444")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "1158201444");
    }

    #[tokio::test]
    async fn webhook_verification_rejects_a_wrong_token() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/api/whatsapp/webhook?hub.mode=subscribe&hub.verify_token=errado&hub.challenge=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_webhook_posts_are_still_acknowledged() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::post("/api/whatsapp/webhook")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("isto não é json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
