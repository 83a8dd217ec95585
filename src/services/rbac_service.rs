// src/services/rbac_service.rs

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::RbacRepository;
use crate::models::rbac::{CreateRolePayload, Role};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
}

impl RbacService {
    pub fn new(repo: RbacRepository) -> Self {
        Self { repo }
    }

    pub async fn create_role(&self, payload: &CreateRolePayload) -> Result<Role, AppError> {
        let (role, department, origin) = payload.normalized();
        let created = self.repo.create_role(&role, &department, &origin).await?;
        tracing::info!("🔐 Cargo criado: {}/{}/{}", created.role, created.department, created.origin);
        Ok(created)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.repo.list_roles().await
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete_role(id).await? {
            return Err(AppError::NotFound("resource.role"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use sqlx::PgPool;

    fn payload(role: &str, department: &str, origin: &str) -> CreateRolePayload {
        CreateRolePayload {
            role: role.into(),
            department: department.into(),
            origin: origin.into(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_role_tuple_is_a_bad_request(pool: PgPool) {
        let service = RbacService::new(RbacRepository::new(pool));

        let created = service.create_role(&payload("Sales", "Leads", "Web")).await.unwrap();
        assert_eq!((created.role.as_str(), created.department.as_str()), ("sales", "leads"));

        // Mesmo trio depois de normalizado
        let err = service.create_role(&payload(" sales ", "LEADS", "web")).await.unwrap_err();
        assert!(matches!(&err, AppError::Duplicate(detail) if detail == "sales/leads/web"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        // Outra origem é outro cargo
        assert!(service.create_role(&payload("sales", "leads", "whatsapp")).await.is_ok());
        assert_eq!(service.list_roles().await.unwrap().len(), 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_a_missing_role_is_not_found(pool: PgPool) {
        let service = RbacService::new(RbacRepository::new(pool));
        let err = service.delete_role(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("resource.role")));
    }
}
