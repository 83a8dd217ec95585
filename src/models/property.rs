// src/models/property.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "property_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Available,
    Booked,
    Inactive,
}

// Anúncio pago de destaque. Fica embutido na propriedade (JSONB).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booster {
    pub id: Uuid,
    #[schema(example = "Homepage highlight")]
    pub label: String,
    #[schema(value_type = f64, example = 49.9)]
    pub amount: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub active: bool,
}

// Campos de um booster que podem ser alterados individualmente
pub const PATCHABLE_BOOSTER_FIELDS: &[&str] = &["label", "amount", "startsAt", "endsAt", "active"];

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    #[schema(example = "VS00042")]
    pub vsid: String,
    #[schema(example = "Sea View Villa")]
    pub name: String,
    #[schema(example = "villa")]
    pub property_type: String,
    #[schema(example = "goa")]
    pub area: String,
    pub address: Option<String>,
    #[schema(value_type = f64, example = 350000.0)]
    pub price: Decimal,
    pub bedrooms: Option<i32>,
    #[schema(example = json!(["pool", "wifi"]))]
    pub amenities: Vec<String>,
    pub status: PropertyStatus,
    #[schema(value_type = Vec<Booster>)]
    pub boosters: Json<Vec<Booster>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(length(min = 1, message = "required"))]
    pub property_type: String,
    #[validate(length(min = 1, message = "required"))]
    pub area: String,
    pub address: Option<String>,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[validate(range(min = 0, max = 100, message = "invalid_number"))]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub property_type: Option<String>,
    pub area: Option<String>,
    pub address: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, max = 100, message = "invalid_number"))]
    pub bedrooms: Option<i32>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<PropertyStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddBoosterPayload {
    #[validate(length(min = 1, message = "required"))]
    pub label: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

// PATCH de um único campo de um booster
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchBoosterPayload {
    #[schema(example = "active")]
    pub field: String,
    #[schema(value_type = Object, example = json!(false))]
    pub value: Value,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    pub area: Option<String>,
    pub status: Option<PropertyStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// VSID a partir do valor da sequência: "VS" + 5 dígitos.
pub fn format_vsid(sequence: i64) -> String {
    format!("VS{:05}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_vsid_with_padding() {
        assert_eq!(format_vsid(1), "VS00001");
        assert_eq!(format_vsid(42), "VS00042");
        assert_eq!(format_vsid(123456), "VS123456");
    }

    #[test]
    fn booster_round_trips_with_camel_case_fields() {
        let raw = json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "label": "Top",
            "amount": 10.5,
            "startsAt": "2025-01-01T00:00:00Z",
            "endsAt": null,
            "active": true
        });
        let booster: Booster = serde_json::from_value(raw).unwrap();
        assert_eq!(booster.label, "Top");
        assert!(serde_json::to_value(&booster).unwrap().get("startsAt").is_some());
    }
}
