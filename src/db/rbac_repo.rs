// src/db/rbac_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::{map_constraint_error, AppError};
use crate::models::rbac::Role;

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Criar o Cargo. A UNIQUE (role, department, origin) barra duplicados.
    pub async fn create_role(&self, role: &str, department: &str, origin: &str) -> Result<Role, AppError> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (role, department, origin)
            VALUES ($1, $2, $3)
            RETURNING id, role, department, origin, created_at
            "#,
        )
        .bind(role)
        .bind(department)
        .bind(origin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, || format!("{}/{}/{}", role, department, origin)))
    }

    // 2. Listar todos os cargos (para o Frontend montar a tela)
    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, role, department, origin, created_at FROM roles ORDER BY department, role, origin",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    // 3. Remover
    pub async fn delete_role(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
