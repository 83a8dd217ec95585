// src/services/invoice_service.rs

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::{PageRequest, Paginated}},
    db::{invoice_repo::NewInvoice, InvoiceRepository},
    models::invoice::{
        CreateInvoicePayload, Invoice, InvoiceFilter, InvoiceLine, InvoiceStatus, InvoiceTotals,
    },
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// NUMERIC(14, 2): até 12 dígitos inteiros
fn max_money() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

fn line_overflow() -> AppError {
    AppError::BadRequest("invoice.invalid_line".into())
}

/// Subtotal, imposto e total. `tax_rate` é percentual (18 = 18%).
/// Valores que não cabem na coluna de dinheiro são rejeitados.
pub fn compute_totals(lines: &[InvoiceLine], tax_rate: Decimal) -> Result<InvoiceTotals, AppError> {
    let mut subtotal = Decimal::ZERO;
    for line in lines {
        let amount = line.quantity.checked_mul(line.unit_price).ok_or_else(line_overflow)?;
        subtotal = subtotal.checked_add(amount).ok_or_else(line_overflow)?;
    }
    let subtotal = round_money(subtotal);

    let tax_amount = subtotal
        .checked_mul(tax_rate)
        .and_then(|v| v.checked_div(HUNDRED))
        .map(round_money)
        .ok_or_else(line_overflow)?;
    let total = subtotal.checked_add(tax_amount).ok_or_else(line_overflow)?;

    if total >= max_money() {
        return Err(line_overflow());
    }

    Ok(InvoiceTotals {
        subtotal,
        tax_amount,
        total,
    })
}

/// "INV-202503-00007"
pub fn format_invoice_number(issued_at: DateTime<Utc>, sequence: i64) -> String {
    format!("INV-{:04}{:02}-{:05}", issued_at.year(), issued_at.month(), sequence)
}

pub fn validate_invoice(payload: &CreateInvoicePayload) -> Result<(), AppError> {
    if payload.lines.is_empty() {
        return Err(AppError::BadRequest("invoice.no_lines".into()));
    }
    if payload.tax_rate < Decimal::ZERO || payload.tax_rate > HUNDRED {
        return Err(AppError::BadRequest("invoice.invalid_tax_rate".into()));
    }
    if payload
        .lines
        .iter()
        .any(|l| l.quantity <= Decimal::ZERO || l.unit_price < Decimal::ZERO)
    {
        return Err(AppError::BadRequest("invoice.invalid_line".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct InvoiceService {
    repo: InvoiceRepository,
}

impl InvoiceService {
    pub fn new(repo: InvoiceRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, payload: &CreateInvoicePayload) -> Result<Invoice, AppError> {
        validate_invoice(payload)?;

        let totals = compute_totals(&payload.lines, payload.tax_rate)?;
        let sequence = self.repo.next_sequence().await?;
        let invoice_number = format_invoice_number(Utc::now(), sequence);

        let invoice = self
            .repo
            .create(
                &invoice_number,
                NewInvoice {
                    booking_id: payload.booking_id,
                    customer_name: payload.customer_name.trim(),
                    customer_email: payload.customer_email.as_deref(),
                    lines: &payload.lines,
                    tax_rate: payload.tax_rate,
                    totals,
                    due_date: payload.due_date,
                },
            )
            .await?;

        tracing::info!("🧾 Fatura {} emitida: total {}", invoice.invoice_number, invoice.total);
        Ok(invoice)
    }

    pub async fn list(&self, filter: &InvoiceFilter) -> Result<Paginated<Invoice>, AppError> {
        let page = PageRequest::new(filter.page, filter.limit);
        let (data, total) = self.repo.list(filter, page).await?;
        Ok(Paginated::new(data, page, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Invoice, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("resource.invoice"))
    }

    pub async fn update_status(&self, id: Uuid, status: InvoiceStatus) -> Result<Invoice, AppError> {
        let current = self.get(id).await?;
        if current.status.is_final() {
            return Err(AppError::BadRequest("invoice.final_status".into()));
        }

        // O UPDATE repete a checagem: outra requisição pode ter finalizado a fatura
        let invoice = self
            .repo
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::BadRequest("invoice.final_status".into()))?;

        tracing::info!("🧾 Fatura {}: {:?} -> {:?}", invoice.invoice_number, current.status, invoice.status);
        Ok(invoice)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let current = self.get(id).await?;
        if current.status != InvoiceStatus::Draft || !self.repo.delete_draft(id).await? {
            return Err(AppError::BadRequest("invoice.only_draft_deletable".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(quantity: &str, unit_price: &str) -> InvoiceLine {
        InvoiceLine {
            description: "Diária".into(),
            quantity: dec(quantity),
            unit_price: dec(unit_price),
        }
    }

    #[test]
    fn computes_totals_with_tax() {
        let totals = compute_totals(&[line("2", "150"), line("1", "99.90")], dec("18")).unwrap();
        assert_eq!(totals.subtotal, dec("399.90"));
        assert_eq!(totals.tax_amount, dec("71.98"));
        assert_eq!(totals.total, dec("471.88"));
    }

    #[test]
    fn rounds_tax_half_away_from_zero() {
        // 0.25 * 10% = 0.025 -> 0.03
        let totals = compute_totals(&[line("1", "0.25")], dec("10")).unwrap();
        assert_eq!(totals.tax_amount, dec("0.03"));
        assert_eq!(totals.total, dec("0.28"));
    }

    #[test]
    fn zero_rate_means_no_tax() {
        let totals = compute_totals(&[line("3", "10")], Decimal::ZERO).unwrap();
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total, dec("30"));
    }

    #[test]
    fn rejects_lines_whose_amount_overflows() {
        let huge = line("1000000000000000", "1000000000000000");
        assert!(matches!(
            compute_totals(&[huge], dec("18")),
            Err(AppError::BadRequest(key)) if key == "invoice.invalid_line"
        ));

        let max = Decimal::MAX;
        let lines = [
            InvoiceLine { description: "a".into(), quantity: Decimal::ONE, unit_price: max },
            InvoiceLine { description: "b".into(), quantity: Decimal::ONE, unit_price: max },
        ];
        assert!(compute_totals(&lines, Decimal::ZERO).is_err());
    }

    #[test]
    fn rejects_totals_beyond_the_money_column() {
        assert!(compute_totals(&[line("1", "999999999999.99")], Decimal::ZERO).is_ok());
        assert!(compute_totals(&[line("1", "999999999999.99")], dec("1")).is_err());
        assert!(compute_totals(&[line("2", "600000000000")], Decimal::ZERO).is_err());
    }

    #[test]
    fn formats_invoice_numbers() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
        assert_eq!(format_invoice_number(at, 7), "INV-202503-00007");
        assert_eq!(format_invoice_number(at, 123456), "INV-202503-123456");
    }

    #[test]
    fn validates_lines_and_rate() {
        let payload = |lines: Vec<InvoiceLine>, rate: &str| CreateInvoicePayload {
            booking_id: None,
            customer_name: "Carlos".into(),
            customer_email: None,
            lines,
            tax_rate: dec(rate),
            due_date: None,
        };

        assert!(validate_invoice(&payload(vec![line("1", "10")], "18")).is_ok());
        assert!(matches!(
            validate_invoice(&payload(vec![], "18")),
            Err(AppError::BadRequest(key)) if key == "invoice.no_lines"
        ));
        assert!(matches!(
            validate_invoice(&payload(vec![line("1", "10")], "120")),
            Err(AppError::BadRequest(key)) if key == "invoice.invalid_tax_rate"
        ));
        assert!(matches!(
            validate_invoice(&payload(vec![line("0", "10")], "0")),
            Err(AppError::BadRequest(key)) if key == "invoice.invalid_line"
        ));
    }
}
