// src/models/employee.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Representa um funcionário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    #[schema(example = "Ana Souza")]
    pub name: String,
    #[schema(example = "ana@estate.test")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub phone: Option<String>,
    #[schema(example = "sales")]
    pub role: String,
    #[schema(example = "leads")]
    pub department: Option<String>,
    #[schema(example = json!(["goa"]))]
    pub alloted_area: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeePayload {
    #[validate(length(min = 2, message = "name_too_short"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub role: String,
    pub department: Option<String>,
    #[serde(default)]
    pub alloted_area: Vec<String>,
}

// Atualização parcial: só o que vier preenchido é alterado
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeePayload {
    #[validate(length(min = 2, message = "name_too_short"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub alloted_area: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub role: Option<String>,
    pub department: Option<String>,
    pub area: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
