// src/handlers/visits.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, rbac::{RequireRole, SalesAccess}},
    models::visit::{CreateVisitPayload, UpdateVisitPayload, Visit, VisitFilter},
};

// POST /api/visits
#[utoipa::path(
    post,
    path = "/api/visits",
    tag = "Visits",
    request_body = CreateVisitPayload,
    responses(
        (status = 201, description = "Visita agendada", body = Visit),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn create_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Json(payload): Json<CreateVisitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let visit = app_state
        .visit_service
        .create(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(visit)))
}

// GET /api/visits?leadId=...&area=...
#[utoipa::path(
    get,
    path = "/api/visits",
    tag = "Visits",
    params(VisitFilter),
    responses((status = 200, description = "Visitas por data agendada", body = Vec<Visit>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn list_visits(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Query(filter): Query<VisitFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let visits = app_state
        .visit_service
        .list(&user, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(visits))
}

// PATCH /api/visits/{id}
#[utoipa::path(
    patch,
    path = "/api/visits/{id}",
    tag = "Visits",
    request_body = UpdateVisitPayload,
    params(("id" = Uuid, Path, description = "ID da visita")),
    responses(
        (status = 200, description = "Visita atualizada", body = Visit),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn update_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVisitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let visit = app_state
        .visit_service
        .update(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(visit))
}
