// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::dashboard::{AreaBookings, DashboardSummary, DispositionCount, LeadStatusCount},
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

// Restrição de área como trecho de WHERE (None = sem restrição)
fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: Option<&[String]>) {
    if let Some(areas) = scope {
        qb.push(" AND area = ANY(").push_bind(areas.to_vec()).push(")");
    }
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Funil de leads
    pub async fn leads_by_status(&self, scope: Option<&[String]>) -> Result<Vec<LeadStatusCount>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT status, COUNT(*) AS total FROM leads WHERE TRUE");
        push_scope(&mut qb, scope);
        qb.push(" GROUP BY status ORDER BY status");

        Ok(qb.build_query_as::<LeadStatusCount>().fetch_all(&self.pool).await?)
    }

    // 2. Leads por disposição, opcionalmente de uma área só
    pub async fn leads_by_disposition(
        &self,
        scope: Option<&[String]>,
        area: Option<&str>,
    ) -> Result<Vec<DispositionCount>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT disposition, COUNT(*) AS total FROM leads WHERE TRUE");
        push_scope(&mut qb, scope);
        if let Some(area) = area {
            qb.push(" AND area = ").push_bind(area.trim().to_lowercase());
        }
        qb.push(" GROUP BY disposition ORDER BY total DESC");

        Ok(qb.build_query_as::<DispositionCount>().fetch_all(&self.pool).await?)
    }

    // 3. Reservas por área
    pub async fn bookings_by_area(&self, scope: Option<&[String]>) -> Result<Vec<AreaBookings>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT area, COUNT(*) AS bookings, COALESCE(SUM(amount), 0) AS amount FROM bookings WHERE TRUE",
        );
        push_scope(&mut qb, scope);
        qb.push(" GROUP BY area ORDER BY bookings DESC, area ASC");

        Ok(qb.build_query_as::<AreaBookings>().fetch_all(&self.pool).await?)
    }

    // 4. Resumo Geral
    pub async fn summary(&self, scope: Option<&[String]>) -> Result<DashboardSummary, AppError> {
        // Transação só de leitura: snapshot consistente entre as contagens
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'active') FROM leads WHERE TRUE",
        );
        push_scope(&mut qb, scope);
        let (total_leads, active_leads): (i64, i64) = qb.build_query_as().fetch_one(&mut *tx).await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM bookings WHERE created_at >= date_trunc('month', NOW())",
        );
        push_scope(&mut qb, scope);
        let bookings_this_month = qb.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        // Faturas não têm área: a receita é global
        let paid_revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0) FROM invoices WHERE status = 'paid'",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            total_leads,
            active_leads,
            bookings_this_month,
            paid_revenue,
        })
    }
}
