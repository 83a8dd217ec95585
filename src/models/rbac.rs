// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "sales")]
    pub role: String,

    #[schema(example = "leads")]
    pub department: String,

    // Canal de origem do cargo (ex: "web", "whatsapp")
    #[schema(example = "web")]
    pub origin: String,

    pub created_at: DateTime<Utc>,
}

// O Payload para criar um cargo. A combinação (role, department, origin) é única.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "sales")]
    pub role: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "leads")]
    pub department: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "web")]
    pub origin: String,
}

impl CreateRolePayload {
    /// Remove espaços e padroniza em minúsculas antes de gravar.
    pub fn normalized(&self) -> (String, String, String) {
        (
            self.role.trim().to_lowercase(),
            self.department.trim().to_lowercase(),
            self.origin.trim().to_lowercase(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_trims_and_lowercases_every_part() {
        let payload = CreateRolePayload {
            role: "  Sales ".into(),
            department: "LEADS".into(),
            origin: " Web".into(),
        };
        assert_eq!(
            payload.normalized(),
            ("sales".to_string(), "leads".to_string(), "web".to_string())
        );
    }
}
