// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::{AdminOnly, RequireRole}},
    models::rbac::{CreateRolePayload, Role},
};

// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "Roles",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Cargo criado", body = Role),
        (status = 400, description = "Dados inválidos ou combinação já existente"),
        (status = 403, description = "Somente admin")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let role = app_state
        .rbac_service
        .create_role(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(role)))
}

// GET /api/roles (Para o frontend montar os selects)
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Roles",
    responses((status = 200, description = "Todos os cargos", body = Vec<Role>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .rbac_service
        .list_roles()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(roles))
}

// DELETE /api/roles/{id}
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "ID do cargo")),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn delete_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .rbac_service
        .delete_role(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
