// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::{AppState, Config},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{AuthResponse, Claims, LoginPayload},
};

// Cookie de sessão HTTP-only: o JS do frontend nunca enxerga o token
fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login realizado; token também enviado no cookie", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (token, user) = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("🔑 Login de {}", user.email);
    let jar = jar.add(session_cookie(&app_state.config, token.clone()));

    Ok((jar, Json(AuthResponse { token, user })))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Cookie de sessão removido"))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build((app_state.config.cookie_name.clone(), "")).path("/"));
    let message = app_state.i18n_store.translate(&locale.0, "auth.logged_out");
    (StatusCode::OK, jar, Json(json!({ "message": message })))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Dados do usuário logado", body = Claims),
        (status = 401, description = "Não autenticado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn me(AuthenticatedUser(claims): AuthenticatedUser) -> Json<Claims> {
    Json(claims)
}
