// src/db/invoice_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::{map_constraint_error, AppError}, pagination::PageRequest},
    models::invoice::{Invoice, InvoiceFilter, InvoiceLine, InvoiceStatus, InvoiceTotals},
};

const INVOICE_COLUMNS: &str = "id, invoice_number, booking_id, customer_name, customer_email, lines, subtotal, \
                               tax_rate, tax_amount, total, status, due_date, created_at, updated_at";

pub struct NewInvoice<'a> {
    pub booking_id: Option<Uuid>,
    pub customer_name: &'a str,
    pub customer_email: Option<&'a str>,
    pub lines: &'a [InvoiceLine],
    pub tax_rate: Decimal,
    pub totals: InvoiceTotals,
    pub due_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn next_sequence(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT nextval('invoice_number_seq')")
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn create(&self, invoice_number: &str, new: NewInvoice<'_>) -> Result<Invoice, AppError> {
        let sql = format!(
            r#"
            INSERT INTO invoices (
                invoice_number, booking_id, customer_name, customer_email, lines,
                subtotal, tax_rate, tax_amount, total, due_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        );
        sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_number)
            .bind(new.booking_id)
            .bind(new.customer_name)
            .bind(new.customer_email)
            .bind(Json(new.lines))
            .bind(new.totals.subtotal)
            .bind(new.tax_rate)
            .bind(new.totals.tax_amount)
            .bind(new.totals.total)
            .bind(new.due_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, || invoice_number.to_string()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let sql = format!("SELECT {} FROM invoices WHERE id = $1", INVOICE_COLUMNS);
        Ok(sqlx::query_as::<_, Invoice>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    pub async fn list(&self, filter: &InvoiceFilter, page: PageRequest) -> Result<(Vec<Invoice>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM invoices WHERE TRUE");
        if let Some(status) = filter.status {
            count_qb.push(" AND status = ").push_bind(status);
        }
        let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM invoices WHERE TRUE", INVOICE_COLUMNS));
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let invoices = qb.build_query_as::<Invoice>().fetch_all(&self.pool).await?;
        Ok((invoices, total))
    }

    /// Só altera se o status atual ainda não for final.
    pub async fn update_status(&self, id: Uuid, status: InvoiceStatus) -> Result<Option<Invoice>, AppError> {
        let sql = format!(
            r#"
            UPDATE invoices SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('paid', 'cancelled')
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn delete_draft(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1 AND status = 'draft'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
