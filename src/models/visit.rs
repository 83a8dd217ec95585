// src/models/visit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "visit_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: Uuid,
    pub lead_id: Uuid,
    // Copiada do lead para o filtro por área
    pub area: String,
    pub property_vsid: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub agent_id: Option<Uuid>,
    pub status: VisitStatus,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitPayload {
    pub lead_id: Uuid,
    pub property_vsid: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub agent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisitPayload {
    pub status: Option<VisitStatus>,
    #[validate(length(max = 2000, message = "too_long"))]
    pub feedback: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct VisitFilter {
    pub lead_id: Option<Uuid>,
    pub area: Option<String>,
    pub status: Option<VisitStatus>,
}
