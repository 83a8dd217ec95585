// src/models/auth.rs

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::employee::Employee;

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "ana@estate.test")]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// Resposta do login: o token também vai no cookie HTTP-only
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: Employee,
}

// Estrutura de dados ("claims") dentro do JWT.
// Tudo o que o backend precisa para autorizar a requisição, sem ir ao banco.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[schema(example = "sales")]
    pub role: String,
    #[schema(example = json!(["goa", "delhi"]))]
    pub alloted_area: Vec<String>,
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_HR: &str = "hr";
pub const ROLE_SALES: &str = "sales";
pub const ROLE_AGENT: &str = "agent";

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(ROLE_ADMIN)
    }

    // Admin e gerente enxergam todas as áreas
    pub fn sees_all_areas(&self) -> bool {
        self.is_admin() || self.role.eq_ignore_ascii_case(ROLE_MANAGER)
    }

    pub fn can_access_area(&self, area: &str) -> bool {
        self.sees_all_areas() || self.alloted_area.iter().any(|a| a.eq_ignore_ascii_case(area.trim()))
    }

    /// `None` quando não há restrição de área.
    pub fn area_scope(&self) -> Option<Vec<String>> {
        if self.sees_all_areas() {
            None
        } else {
            Some(self.alloted_area.iter().map(|a| a.trim().to_lowercase()).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str, areas: &[&str]) -> Claims {
        Claims {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@estate.test".into(),
            role: role.into(),
            alloted_area: areas.iter().map(|a| a.to_string()).collect(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn serializes_alloted_area_in_camel_case() {
        let json = serde_json::to_value(claims("sales", &["goa"])).unwrap();
        assert_eq!(json["allotedArea"][0], "goa");
    }

    #[test]
    fn area_access_depends_on_role() {
        let agent = claims("sales", &["Goa"]);
        assert!(agent.can_access_area("goa"));
        assert!(!agent.can_access_area("delhi"));
        assert_eq!(agent.area_scope(), Some(vec!["goa".to_string()]));

        let manager = claims("Manager", &[]);
        assert!(manager.can_access_area("delhi"));
        assert_eq!(manager.area_scope(), None);
    }
}
