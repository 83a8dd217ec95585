// src/handlers/employees.rs

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
    middleware::{i18n::Locale, rbac::{HrAccess, RequireRole}},
    models::employee::{CreateEmployeePayload, Employee, EmployeeFilter, UpdateEmployeePayload},
};

// POST /api/employees
#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "Employees",
    request_body = CreateEmployeePayload,
    responses(
        (status = 201, description = "Funcionário criado", body = Employee),
        (status = 400, description = "Dados inválidos ou e-mail duplicado"),
        (status = 403, description = "Sem acesso ao RH")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<HrAccess>,
    Json(payload): Json<CreateEmployeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .employee_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(employee)))
}

// GET /api/employees
#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Employees",
    params(EmployeeFilter),
    responses((status = 200, description = "Lista paginada de funcionários", body = Paginated<Employee>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<HrAccess>,
    Query(filter): Query<EmployeeFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .employee_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/employees/{id}
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses(
        (status = 200, description = "Funcionário", body = Employee),
        (status = 404, description = "Não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<HrAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = app_state
        .employee_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employee))
}

// PATCH /api/employees/{id}
#[utoipa::path(
    patch,
    path = "/api/employees/{id}",
    tag = "Employees",
    request_body = UpdateEmployeePayload,
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses(
        (status = 200, description = "Funcionário atualizado", body = Employee),
        (status = 404, description = "Não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<HrAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .employee_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employee))
}

// DELETE /api/employees/{id}
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn delete_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<HrAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .employee_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
