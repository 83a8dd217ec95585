// src/handlers/properties.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::{AdminOnly, RequireRole}},
    models::property::{
        AddBoosterPayload, CreatePropertyPayload, PatchBoosterPayload, Property, PropertyFilter,
        UpdatePropertyPayload,
    },
};

// =============================================================================
//  ÁREA 1: PROPRIEDADES
// =============================================================================

// POST /api/properties
#[utoipa::path(
    post,
    path = "/api/properties",
    tag = "Properties",
    request_body = CreatePropertyPayload,
    responses(
        (status = 201, description = "Propriedade criada com VSID", body = Property),
        (status = 400, description = "Dados inválidos")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn create_property(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreatePropertyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let property = app_state
        .property_service
        .create(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(property)))
}

// GET /api/properties
#[utoipa::path(
    get,
    path = "/api/properties",
    tag = "Properties",
    params(PropertyFilter),
    responses((status = 200, description = "Lista paginada", body = Paginated<Property>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn list_properties(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<PropertyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .property_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/properties/{id}
#[utoipa::path(
    get,
    path = "/api/properties/{id}",
    tag = "Properties",
    params(("id" = Uuid, Path, description = "ID da propriedade")),
    responses(
        (status = 200, description = "Propriedade", body = Property),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_property(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let property = app_state
        .property_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(property))
}

// GET /api/properties/vsid/{vsid}
#[utoipa::path(
    get,
    path = "/api/properties/vsid/{vsid}",
    tag = "Properties",
    params(("vsid" = String, Path, description = "VSID, ex: VS00042")),
    responses(
        (status = 200, description = "Propriedade", body = Property),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_property_by_vsid(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(vsid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let property = app_state
        .property_service
        .get_by_vsid(&vsid)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(property))
}

// PATCH /api/properties/{id}
#[utoipa::path(
    patch,
    path = "/api/properties/{id}",
    tag = "Properties",
    request_body = UpdatePropertyPayload,
    params(("id" = Uuid, Path, description = "ID da propriedade")),
    responses(
        (status = 200, description = "Propriedade atualizada", body = Property),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn update_property(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePropertyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let property = app_state
        .property_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(property))
}

// DELETE /api/properties/{id}
#[utoipa::path(
    delete,
    path = "/api/properties/{id}",
    tag = "Properties",
    params(("id" = Uuid, Path, description = "ID da propriedade")),
    responses(
        (status = 204, description = "Removida"),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn delete_property(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .property_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: BOOSTERS (array embutido na propriedade)
// =============================================================================

// POST /api/properties/{id}/boosters
#[utoipa::path(
    post,
    path = "/api/properties/{id}/boosters",
    tag = "Properties",
    request_body = AddBoosterPayload,
    params(("id" = Uuid, Path, description = "ID da propriedade")),
    responses(
        (status = 201, description = "Booster adicionado", body = Property),
        (status = 404, description = "Propriedade não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn add_booster(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddBoosterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let property = app_state
        .property_service
        .add_booster(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(property)))
}

// PATCH /api/properties/{id}/boosters/{booster_id}
#[utoipa::path(
    patch,
    path = "/api/properties/{id}/boosters/{booster_id}",
    tag = "Properties",
    request_body = PatchBoosterPayload,
    params(
        ("id" = Uuid, Path, description = "ID da propriedade"),
        ("booster_id" = Uuid, Path, description = "ID do booster")
    ),
    responses(
        (status = 200, description = "Campo do booster alterado", body = Property),
        (status = 400, description = "Campo não editável ou valor inválido"),
        (status = 404, description = "Propriedade ou booster não encontrados")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn patch_booster(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path((id, booster_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PatchBoosterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let property = app_state
        .property_service
        .patch_booster(id, booster_id, &payload.field, payload.value)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(property))
}

// DELETE /api/properties/{id}/boosters/{booster_id}
#[utoipa::path(
    delete,
    path = "/api/properties/{id}/boosters/{booster_id}",
    tag = "Properties",
    params(
        ("id" = Uuid, Path, description = "ID da propriedade"),
        ("booster_id" = Uuid, Path, description = "ID do booster")
    ),
    responses(
        (status = 200, description = "Booster removido", body = Property),
        (status = 404, description = "Propriedade ou booster não encontrados")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn remove_booster(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path((id, booster_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let property = app_state
        .property_service
        .remove_booster(id, booster_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(property))
}
