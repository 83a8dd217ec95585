// src/models/lead.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Mapeia o CREATE TYPE lead_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Active,
    Reminder,
    Closed,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = "Carlos Lima")]
    pub name: String,
    pub email: Option<String>,
    #[schema(example = "+5511999990000")]
    pub phone: String,
    #[schema(example = "goa")]
    pub area: String,
    #[schema(example = "VS00042")]
    pub property_vsid: Option<String>,
    #[schema(value_type = Option<f64>, example = 250000.0)]
    pub budget: Option<Decimal>,
    #[schema(example = "website")]
    pub source: Option<String>,
    pub notes: Option<String>,
    pub status: LeadStatus,
    // Rótulo de resultado dado pelo corretor
    #[schema(example = "interested")]
    pub disposition: Option<String>,
    pub reminder_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "invalid_phone"))]
    pub phone: String,
    #[validate(length(min = 1, message = "required"))]
    pub area: String,
    pub property_vsid: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub budget: Option<Decimal>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadStatusPayload {
    pub status: LeadStatus,
    pub reminder_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDispositionPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "interested")]
    pub disposition: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignLeadPayload {
    pub employee_id: Uuid,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub area: Option<String>,
    pub disposition: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
