// src/db/property_repo.rs

use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::{map_constraint_error, AppError}, pagination::PageRequest},
    models::property::{format_vsid, Booster, Property, PropertyFilter, UpdatePropertyPayload},
};

const PROPERTY_COLUMNS: &str = "id, vsid, name, property_type, area, address, price, bedrooms, amenities, \
                                status, boosters, created_at, updated_at";

pub struct NewProperty<'a> {
    pub name: &'a str,
    pub property_type: &'a str,
    pub area: &'a str,
    pub address: Option<&'a str>,
    pub price: Decimal,
    pub bedrooms: Option<i32>,
    pub amenities: &'a [String],
}

#[derive(Clone)]
pub struct PropertyRepository {
    pool: PgPool,
}

impl PropertyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewProperty<'_>) -> Result<Property, AppError> {
        // A sequência não é transacional: buracos na numeração são aceitáveis
        let sequence: i64 = sqlx::query_scalar("SELECT nextval('property_vsid_seq')")
            .fetch_one(&self.pool)
            .await?;
        let vsid = format_vsid(sequence);

        let sql = format!(
            r#"
            INSERT INTO properties (vsid, name, property_type, area, address, price, bedrooms, amenities)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PROPERTY_COLUMNS
        );
        sqlx::query_as::<_, Property>(&sql)
            .bind(&vsid)
            .bind(new.name)
            .bind(new.property_type)
            .bind(new.area)
            .bind(new.address)
            .bind(new.price)
            .bind(new.bedrooms)
            .bind(new.amenities)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, || vsid.clone()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        let sql = format!("SELECT {} FROM properties WHERE id = $1", PROPERTY_COLUMNS);
        Ok(sqlx::query_as::<_, Property>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    pub async fn find_by_vsid(&self, vsid: &str) -> Result<Option<Property>, AppError> {
        let sql = format!("SELECT {} FROM properties WHERE vsid = upper($1)", PROPERTY_COLUMNS);
        Ok(sqlx::query_as::<_, Property>(&sql).bind(vsid).fetch_optional(&self.pool).await?)
    }

    /// Trava a linha até o fim da transação (edição dos boosters).
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Property>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM properties WHERE id = $1 FOR UPDATE", PROPERTY_COLUMNS);
        Ok(sqlx::query_as::<_, Property>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn list(&self, filter: &PropertyFilter, page: PageRequest) -> Result<(Vec<Property>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties WHERE TRUE");
        push_filters(&mut count_qb, filter);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM properties WHERE TRUE", PROPERTY_COLUMNS));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let properties = qb.build_query_as::<Property>().fetch_all(&self.pool).await?;
        Ok((properties, total))
    }

    pub async fn update(&self, id: Uuid, changes: &UpdatePropertyPayload) -> Result<Option<Property>, AppError> {
        let sql = format!(
            r#"
            UPDATE properties SET
                name = COALESCE($2, name),
                property_type = COALESCE($3, property_type),
                area = COALESCE($4, area),
                address = COALESCE($5, address),
                price = COALESCE($6, price),
                bedrooms = COALESCE($7, bedrooms),
                amenities = COALESCE($8, amenities),
                status = COALESCE($9, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROPERTY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Property>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.property_type.as_deref())
            .bind(changes.area.as_deref())
            .bind(changes.address.as_deref())
            .bind(changes.price)
            .bind(changes.bedrooms)
            .bind(changes.amenities.as_deref())
            .bind(changes.status)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn save_boosters<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        boosters: &[Booster],
    ) -> Result<Property, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE properties SET boosters = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            PROPERTY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Property>(&sql)
            .bind(id)
            .bind(Json(boosters))
            .fetch_one(executor)
            .await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PropertyFilter) {
    if let Some(area) = &filter.area {
        qb.push(" AND area = ").push_bind(area.trim().to_lowercase());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let term = super::contains_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(term.clone())
            .push(" ESCAPE '\\' OR vsid ILIKE ")
            .push_bind(term)
            .push(" ESCAPE '\\')");
    }
}
