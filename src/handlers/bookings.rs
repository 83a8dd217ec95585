// src/handlers/bookings.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::ApiError, pagination::Paginated},
    config::AppState,
    middleware::{i18n::Locale, rbac::{RequireRole, SalesAccess}},
    models::booking::{Booking, BookingFilter, CreateBookingPayload},
};

// POST /api/bookings
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    request_body = CreateBookingPayload,
    responses(
        (status = 201, description = "Reserva criada e lead fechado", body = Booking),
        (status = 400, description = "Datas ou valor inválidos"),
        (status = 404, description = "Lead ou visita não encontrados")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .create(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings
#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    params(BookingFilter),
    responses((status = 200, description = "Reservas das áreas do usuário", body = Paginated<Booking>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn list_bookings(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Query(filter): Query<BookingFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .booking_service
        .list(&user, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/bookings/{id}
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva", body = Booking),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .get(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(booking))
}

// DELETE /api/bookings/{id}
#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 204, description = "Removida"),
        (status = 404, description = "Não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn delete_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(user, _): RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .booking_service
        .delete(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
