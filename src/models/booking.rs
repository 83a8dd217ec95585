// src/models/booking.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub visit_id: Option<Uuid>,
    pub property_vsid: Option<String>,
    pub area: String,
    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub check_in: NaiveDate,
    #[schema(value_type = Option<String>, format = Date, example = "2025-03-05")]
    pub check_out: Option<NaiveDate>,
    #[schema(value_type = f64, example = 1200.0)]
    pub amount: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    pub lead_id: Uuid,
    pub visit_id: Option<Uuid>,
    pub property_vsid: Option<String>,
    #[schema(value_type = String, format = Date)]
    pub check_in: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub amount: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    pub area: Option<String>,
    pub lead_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
