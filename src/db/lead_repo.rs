// src/db/lead_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::{map_constraint_error, AppError}, pagination::PageRequest},
    models::lead::{Lead, LeadFilter, LeadStatus},
};

const LEAD_COLUMNS: &str = "id, name, email, phone, area, property_vsid, budget, source, notes, \
                            status, disposition, reminder_at, assigned_to, created_by, created_at, updated_at";

pub struct NewLead<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: &'a str,
    pub area: &'a str,
    pub property_vsid: Option<&'a str>,
    pub budget: Option<Decimal>,
    pub source: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
}

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewLead<'_>) -> Result<Lead, AppError> {
        let sql = format!(
            r#"
            INSERT INTO leads (name, email, phone, area, property_vsid, budget, source, notes, assigned_to, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            LEAD_COLUMNS
        );
        sqlx::query_as::<_, Lead>(&sql)
            .bind(new.name)
            .bind(new.email)
            .bind(new.phone)
            .bind(new.area)
            .bind(new.property_vsid)
            .bind(new.budget)
            .bind(new.source)
            .bind(new.notes)
            .bind(new.assigned_to)
            .bind(new.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, || format!("lead {}", new.phone)))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM leads WHERE id = $1", LEAD_COLUMNS);
        Ok(sqlx::query_as::<_, Lead>(&sql).bind(id).fetch_optional(executor).await?)
    }

    /// Lista paginada. `scope` restringe às áreas do usuário (None = todas).
    pub async fn list(
        &self,
        filter: &LeadFilter,
        scope: Option<&[String]>,
        page: PageRequest,
    ) -> Result<(Vec<Lead>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads WHERE TRUE");
        push_filters(&mut count_qb, filter, scope);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM leads WHERE TRUE", LEAD_COLUMNS));
        push_filters(&mut qb, filter, scope);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let leads = qb.build_query_as::<Lead>().fetch_all(&self.pool).await?;
        Ok((leads, total))
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: LeadStatus,
        reminder_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE leads SET status = $2, reminder_at = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
            LEAD_COLUMNS
        );
        Ok(sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(status)
            .bind(reminder_at)
            .fetch_optional(executor)
            .await?)
    }

    pub async fn update_disposition(&self, id: Uuid, disposition: &str) -> Result<Option<Lead>, AppError> {
        let sql = format!(
            "UPDATE leads SET disposition = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            LEAD_COLUMNS
        );
        Ok(sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(disposition)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn assign(&self, id: Uuid, employee_id: Uuid) -> Result<Option<Lead>, AppError> {
        let sql = format!(
            "UPDATE leads SET assigned_to = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            LEAD_COLUMNS
        );
        sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, || employee_id.to_string()))
    }

    /// Devolve o lead removido (o chamador precisa da área para notificar).
    pub async fn delete(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        let sql = format!("DELETE FROM leads WHERE id = $1 RETURNING {}", LEAD_COLUMNS);
        sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, || id.to_string()))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &LeadFilter, scope: Option<&[String]>) {
    if let Some(areas) = scope {
        qb.push(" AND area = ANY(").push_bind(areas.to_vec()).push(")");
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(area) = &filter.area {
        qb.push(" AND area = ").push_bind(area.trim().to_lowercase());
    }
    if let Some(disposition) = &filter.disposition {
        qb.push(" AND disposition = ").push_bind(disposition.trim().to_lowercase());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let term = super::contains_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(term.clone())
            .push(" ESCAPE '\\' OR phone ILIKE ")
            .push_bind(term.clone())
            .push(" ESCAPE '\\' OR email ILIKE ")
            .push_bind(term)
            .push(" ESCAPE '\\')");
    }
}
