// src/services/employee_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::{PageRequest, Paginated}},
    db::{employee_repo::NewEmployee, EmployeeRepository},
    models::employee::{CreateEmployeePayload, Employee, EmployeeFilter, UpdateEmployeePayload},
    services::auth::hash_password,
};

// Cargo, departamento e áreas são comparados sempre em minúsculas
fn normalize_areas(areas: &[String]) -> Vec<String> {
    let mut out: Vec<String> = areas
        .iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

fn normalize_label(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Clone)]
pub struct EmployeeService {
    repo: EmployeeRepository,
}

impl EmployeeService {
    pub fn new(repo: EmployeeRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, payload: CreateEmployeePayload) -> Result<Employee, AppError> {
        let password_hash = hash_password(&payload.password).await?;
        let role = normalize_label(&payload.role);
        let department = payload.department.as_deref().map(normalize_label);
        let alloted_area = normalize_areas(&payload.alloted_area);

        let employee = self
            .repo
            .create(NewEmployee {
                name: payload.name.trim(),
                email: payload.email.trim(),
                password_hash: &password_hash,
                phone: payload.phone.as_deref(),
                role: &role,
                department: department.as_deref(),
                alloted_area: &alloted_area,
            })
            .await?;

        tracing::info!("👤 Funcionário criado: {} ({})", employee.email, employee.role);
        Ok(employee)
    }

    pub async fn list(&self, filter: &EmployeeFilter) -> Result<Paginated<Employee>, AppError> {
        let page = PageRequest::new(filter.page, filter.limit);
        let (data, total) = self.repo.list(filter, page).await?;
        Ok(Paginated::new(data, page, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Employee, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("resource.employee"))
    }

    pub async fn update(&self, id: Uuid, mut changes: UpdateEmployeePayload) -> Result<Employee, AppError> {
        let password_hash = match changes.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        changes.role = changes.role.as_deref().map(normalize_label);
        changes.department = changes.department.as_deref().map(normalize_label);
        changes.alloted_area = changes.alloted_area.as_deref().map(normalize_areas);
        changes.email = changes.email.map(|e| e.trim().to_string());

        self.repo
            .update(id, &changes, password_hash.as_deref())
            .await?
            .ok_or(AppError::NotFound("resource.employee"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("resource.employee"));
        }
        tracing::info!("👤 Funcionário removido: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_are_trimmed_lowercased_and_unique() {
        let areas = vec![" Goa".to_string(), "goa".into(), "DELHI ".into(), "  ".into()];
        assert_eq!(normalize_areas(&areas), vec!["delhi", "goa"]);
    }

    fn payload(email: &str) -> CreateEmployeePayload {
        CreateEmployeePayload {
            name: "Ana Souza".into(),
            email: email.into(),
            password: "segredo123".into(),
            phone: None,
            role: "Sales".into(),
            department: Some("Leads".into()),
            alloted_area: vec!["Goa".into()],
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_a_missing_employee_is_not_found(pool: sqlx::PgPool) {
        let service = EmployeeService::new(EmployeeRepository::new(pool));

        let err = service.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("resource.employee")));
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deletes_once_then_reports_not_found(pool: sqlx::PgPool) {
        let service = EmployeeService::new(EmployeeRepository::new(pool));

        let employee = service.create(payload("ana@estate.test")).await.unwrap();
        assert_eq!(employee.role, "sales");
        assert_eq!(employee.alloted_area, vec!["goa"]);

        service.delete(employee.id).await.unwrap();
        assert!(matches!(
            service.delete(employee.id).await,
            Err(AppError::NotFound("resource.employee"))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn search_treats_like_wildcards_literally(pool: sqlx::PgPool) {
        let service = EmployeeService::new(EmployeeRepository::new(pool));
        service.create(payload("ana_x@estate.test")).await.unwrap();
        service.create(payload("anabx@estate.test")).await.unwrap();

        let filter = EmployeeFilter {
            search: Some("ana_x".into()),
            ..Default::default()
        };
        let page = service.list(&filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].email, "ana_x@estate.test");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_email_is_rejected(pool: sqlx::PgPool) {
        let service = EmployeeService::new(EmployeeRepository::new(pool));

        service.create(payload("ana@estate.test")).await.unwrap();
        let err = service.create(payload("ana@estate.test")).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
    }
}
