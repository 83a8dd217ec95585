// src/handlers/invoices.rs

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
    middleware::{i18n::Locale, rbac::{AdminOnly, RequireRole}},
    models::invoice::{CreateInvoicePayload, Invoice, InvoiceFilter, UpdateInvoiceStatusPayload},
};

// POST /api/invoices
#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = CreateInvoicePayload,
    responses(
        (status = 201, description = "Fatura emitida com totais calculados", body = Invoice),
        (status = 400, description = "Linhas ou alíquota inválidas")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let invoice = app_state
        .invoice_service
        .create(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

// GET /api/invoices
#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    params(InvoiceFilter),
    responses((status = 200, description = "Lista paginada", body = Paginated<Invoice>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Query(filter): Query<InvoiceFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .invoice_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/invoices/{id}
#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura", body = Invoice),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(invoice))
}

// PATCH /api/invoices/{id}/status
#[utoipa::path(
    patch,
    path = "/api/invoices/{id}/status",
    tag = "Invoices",
    request_body = UpdateInvoiceStatusPayload,
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Status alterado", body = Invoice),
        (status = 400, description = "Fatura já paga ou cancelada"),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn update_invoice_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .update_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(invoice))
}

// DELETE /api/invoices/{id}
#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 204, description = "Rascunho removido"),
        (status = 400, description = "Só rascunhos podem ser removidos"),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn delete_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .invoice_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
