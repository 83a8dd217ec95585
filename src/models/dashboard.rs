// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::lead::LeadStatus;

// 1. Contagem de leads por status (funil)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadStatusCount {
    pub status: LeadStatus,
    pub total: i64,
}

// 2. Contagem de leads por disposição ("sem disposição" vem como null)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispositionCount {
    pub disposition: Option<String>,
    pub total: i64,
}

// 3. Reservas agrupadas por área
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AreaBookings {
    pub area: String,
    pub bookings: i64,
    #[schema(value_type = f64)]
    pub amount: Decimal,
}

// 4. Cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_leads: i64,
    pub active_leads: i64,
    pub bookings_this_month: i64,
    #[schema(value_type = f64)]
    pub paid_revenue: Decimal, // Soma das faturas pagas
}
