// src/db/booking_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::{map_constraint_error, AppError}, pagination::PageRequest},
    models::booking::{Booking, BookingFilter},
};

const BOOKING_COLUMNS: &str = "id, lead_id, visit_id, property_vsid, area, check_in, check_out, amount, \
                               created_by, created_at";

pub struct NewBooking<'a> {
    pub lead_id: Uuid,
    pub visit_id: Option<Uuid>,
    pub property_vsid: Option<&'a str>,
    pub area: &'a str,
    pub check_in: NaiveDate,
    pub check_out: Option<NaiveDate>,
    pub amount: Decimal,
    pub created_by: Uuid,
}

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, new: NewBooking<'_>) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO bookings (lead_id, visit_id, property_vsid, area, check_in, check_out, amount, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );
        sqlx::query_as::<_, Booking>(&sql)
            .bind(new.lead_id)
            .bind(new.visit_id)
            .bind(new.property_vsid)
            .bind(new.area)
            .bind(new.check_in)
            .bind(new.check_out)
            .bind(new.amount)
            .bind(new.created_by)
            .fetch_one(executor)
            .await
            .map_err(|e| map_constraint_error(e, || new.lead_id.to_string()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        Ok(sqlx::query_as::<_, Booking>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    pub async fn list(
        &self,
        filter: &BookingFilter,
        scope: Option<&[String]>,
        page: PageRequest,
    ) -> Result<(Vec<Booking>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM bookings WHERE TRUE");
        push_filters(&mut count_qb, filter, scope);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM bookings WHERE TRUE", BOOKING_COLUMNS));
        push_filters(&mut qb, filter, scope);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let bookings = qb.build_query_as::<Booking>().fetch_all(&self.pool).await?;
        Ok((bookings, total))
    }

    pub async fn delete(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let sql = format!("DELETE FROM bookings WHERE id = $1 RETURNING {}", BOOKING_COLUMNS);
        sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, || id.to_string()))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter, scope: Option<&[String]>) {
    if let Some(areas) = scope {
        qb.push(" AND area = ANY(").push_bind(areas.to_vec()).push(")");
    }
    if let Some(area) = &filter.area {
        qb.push(" AND area = ").push_bind(area.trim().to_lowercase());
    }
    if let Some(lead_id) = filter.lead_id {
        qb.push(" AND lead_id = ").push_bind(lead_id);
    }
}
