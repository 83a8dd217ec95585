// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::dashboard::{AreaBookings, DashboardSummary, DispositionCount, LeadStatusCount},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DispositionQuery {
    pub area: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses((status = 200, description = "Cards do topo", body = DashboardSummary)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .summary(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/leads-by-status",
    tag = "Dashboard",
    responses((status = 200, description = "Funil de leads", body = Vec<LeadStatusCount>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_leads_by_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let data = app_state
        .dashboard_service
        .leads_by_status(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/leads-by-disposition",
    tag = "Dashboard",
    params(DispositionQuery),
    responses((status = 200, description = "Leads por disposição", body = Vec<DispositionCount>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_leads_by_disposition(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<DispositionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let data = app_state
        .dashboard_service
        .leads_by_disposition(&user, query.area.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/bookings-by-area",
    tag = "Dashboard",
    responses((status = 200, description = "Reservas por área", body = Vec<AreaBookings>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn get_bookings_by_area(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let data = app_state
        .dashboard_service
        .bookings_by_area(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(data))
}
