// src/db/employee_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::{map_constraint_error, AppError}, pagination::PageRequest},
    models::employee::{Employee, EmployeeFilter, UpdateEmployeePayload},
};

const EMPLOYEE_COLUMNS: &str = "id, name, email, password_hash, phone, role, department, \
                                alloted_area, is_active, created_at, updated_at";

// O repositório de funcionários, responsável por todas as interações com a tabela 'employees'
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

pub struct NewEmployee<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
    pub department: Option<&'a str>,
    pub alloted_area: &'a [String],
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, AppError> {
        let sql = format!("SELECT {} FROM employees WHERE lower(email) = lower($1)", EMPLOYEE_COLUMNS);
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let sql = format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS);
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn create(&self, new: NewEmployee<'_>) -> Result<Employee, AppError> {
        let sql = format!(
            r#"
            INSERT INTO employees (name, email, password_hash, phone, role, department, alloted_area)
            VALUES ($1, lower($2), $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, Employee>(&sql)
            .bind(new.name)
            .bind(new.email)
            .bind(new.password_hash)
            .bind(new.phone)
            .bind(new.role)
            .bind(new.department)
            .bind(new.alloted_area)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, || format!("email {}", new.email)))
    }

    pub async fn list(&self, filter: &EmployeeFilter, page: PageRequest) -> Result<(Vec<Employee>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employees WHERE TRUE");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM employees WHERE TRUE", EMPLOYEE_COLUMNS));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let employees = qb.build_query_as::<Employee>().fetch_all(&self.pool).await?;
        Ok((employees, total))
    }

    /// Atualização parcial com COALESCE: campos ausentes ficam como estão.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &UpdateEmployeePayload,
        password_hash: Option<&str>,
    ) -> Result<Option<Employee>, AppError> {
        let sql = format!(
            r#"
            UPDATE employees SET
                name = COALESCE($2, name),
                email = COALESCE(lower($3), email),
                password_hash = COALESCE($4, password_hash),
                phone = COALESCE($5, phone),
                role = COALESCE($6, role),
                department = COALESCE($7, department),
                alloted_area = COALESCE($8, alloted_area),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.email.as_deref())
            .bind(password_hash)
            .bind(changes.phone.as_deref())
            .bind(changes.role.as_deref())
            .bind(changes.department.as_deref())
            .bind(changes.alloted_area.as_deref())
            .bind(changes.is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, || format!("email {}", changes.email.as_deref().unwrap_or("?"))))
    }

    /// Retorna `false` se não havia registro com esse id.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &EmployeeFilter) {
    if let Some(role) = &filter.role {
        qb.push(" AND role = ").push_bind(role.trim().to_lowercase());
    }
    if let Some(department) = &filter.department {
        qb.push(" AND department = ").push_bind(department.trim().to_lowercase());
    }
    if let Some(area) = &filter.area {
        qb.push(" AND ").push_bind(area.trim().to_lowercase()).push(" = ANY(alloted_area)");
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let term = super::contains_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(term.clone())
            .push(" ESCAPE '\\' OR email ILIKE ")
            .push_bind(term)
            .push(" ESCAPE '\\')");
    }
}
