// src/models/invoice.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    // Pago e cancelado não mudam mais
    pub fn is_final(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    #[validate(length(min = 1, message = "required"))]
    pub description: String,
    #[schema(value_type = f64, example = 2.0)]
    pub quantity: Decimal,
    #[schema(value_type = f64, example = 150.0)]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    #[schema(example = "INV-202503-00007")]
    pub invoice_number: String,
    pub booking_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    #[schema(value_type = Vec<InvoiceLine>)]
    pub lines: Json<Vec<InvoiceLine>>,
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
    #[schema(value_type = f64)]
    pub tax_rate: Decimal,
    #[schema(value_type = f64)]
    pub tax_amount: Decimal,
    #[schema(value_type = f64)]
    pub total: Decimal,
    pub status: InvoiceStatus,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoicePayload {
    pub booking_id: Option<Uuid>,
    #[validate(length(min = 1, message = "required"))]
    pub customer_name: String,
    #[validate(email(message = "invalid_email"))]
    pub customer_email: Option<String>,
    #[validate(nested)]
    pub lines: Vec<InvoiceLine>,
    #[serde(default)]
    #[schema(value_type = f64, example = 18.0)]
    pub tax_rate: Decimal,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceStatusPayload {
    pub status: InvoiceStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// Totais calculados no servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}
