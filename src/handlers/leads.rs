// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::{ApiError, AppError}, pagination::Paginated},
    config::AppState,
    middleware::{i18n::Locale, rbac::{RequireRole, SalesAccess}},
    models::lead::{
        AssignLeadPayload, CreateLeadPayload, Lead, LeadFilter, UpdateDispositionPayload, UpdateLeadStatusPayload,
    },
};

// =============================================================================
//  CRUD
// =============================================================================

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Área fora do escopo do usuário")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .create(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(LeadFilter),
    responses((status = 200, description = "Leads das áreas do usuário, mais recentes primeiro", body = Paginated<Lead>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Query(filter): Query<LeadFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .lead_service
        .list(&user, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/leads/{id}
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead", body = Lead),
        (status = 404, description = "Não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .get(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// DELETE /api/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 204, description = "Removido"),
        (status = 400, description = "Lead com reservas não pode ser removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lead_service
        .delete(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  FLUXO DE VENDAS
// =============================================================================

// PATCH /api/leads/{id}/status
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/status",
    tag = "Leads",
    request_body = UpdateLeadStatusPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Status atualizado", body = Lead),
        (status = 400, description = "Lembrete ausente ou no passado"),
        (status = 404, description = "Não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn update_lead_status(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .update_status(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// PATCH /api/leads/{id}/disposition
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/disposition",
    tag = "Leads",
    request_body = UpdateDispositionPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Disposição atualizada", body = Lead),
        (status = 404, description = "Não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn update_lead_disposition(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDispositionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .update_disposition(&user, id, &payload.disposition)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// PATCH /api/leads/{id}/assign
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/assign",
    tag = "Leads",
    request_body = AssignLeadPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead atribuído", body = Lead),
        (status = 400, description = "Funcionário inexistente"),
        (status = 404, description = "Não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn assign_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .assign(&user, id, payload.employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}
