// src/db/visit_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::{map_constraint_error, AppError},
    models::visit::{UpdateVisitPayload, Visit, VisitFilter},
};

const VISIT_COLUMNS: &str = "id, lead_id, area, property_vsid, scheduled_at, agent_id, status, feedback, \
                             created_at, updated_at";

#[derive(Clone)]
pub struct VisitRepository {
    pool: PgPool,
}

impl VisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        lead_id: Uuid,
        area: &str,
        property_vsid: Option<&str>,
        scheduled_at: DateTime<Utc>,
        agent_id: Option<Uuid>,
    ) -> Result<Visit, AppError> {
        let sql = format!(
            r#"
            INSERT INTO visits (lead_id, area, property_vsid, scheduled_at, agent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            VISIT_COLUMNS
        );
        sqlx::query_as::<_, Visit>(&sql)
            .bind(lead_id)
            .bind(area)
            .bind(property_vsid)
            .bind(scheduled_at)
            .bind(agent_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, || lead_id.to_string()))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM visits WHERE id = $1", VISIT_COLUMNS);
        Ok(sqlx::query_as::<_, Visit>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn list(&self, filter: &VisitFilter, scope: Option<&[String]>) -> Result<Vec<Visit>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM visits WHERE TRUE", VISIT_COLUMNS));
        if let Some(areas) = scope {
            qb.push(" AND area = ANY(").push_bind(areas.to_vec()).push(")");
        }
        if let Some(lead_id) = filter.lead_id {
            qb.push(" AND lead_id = ").push_bind(lead_id);
        }
        if let Some(area) = &filter.area {
            qb.push(" AND area = ").push_bind(area.trim().to_lowercase());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        qb.push(" ORDER BY scheduled_at ASC LIMIT 200");

        Ok(qb.build_query_as::<Visit>().fetch_all(&self.pool).await?)
    }

    pub async fn update(&self, id: Uuid, changes: &UpdateVisitPayload) -> Result<Option<Visit>, AppError> {
        let sql = format!(
            r#"
            UPDATE visits SET
                status = COALESCE($2, status),
                feedback = COALESCE($3, feedback),
                scheduled_at = COALESCE($4, scheduled_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VISIT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Visit>(&sql)
            .bind(id)
            .bind(changes.status)
            .bind(changes.feedback.as_deref())
            .bind(changes.scheduled_at)
            .fetch_optional(&self.pool)
            .await?)
    }
}
