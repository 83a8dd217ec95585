// src/services/booking_service.rs

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::{PageRequest, Paginated}},
    db::{booking_repo::NewBooking, BookingRepository, LeadRepository, VisitRepository},
    models::{
        auth::Claims,
        booking::{Booking, BookingFilter, CreateBookingPayload},
        lead::LeadStatus,
    },
    realtime::{lead_events, RealtimeHub},
    services::lead_service::ensure_area_access,
};

/// Saída não pode ser antes da entrada e o valor não pode ser negativo.
pub fn validate_booking(payload: &CreateBookingPayload) -> Result<(), AppError> {
    if payload.check_out.is_some_and(|out| out < payload.check_in) {
        return Err(AppError::BadRequest("booking.invalid_dates".into()));
    }
    if payload.amount < Decimal::ZERO {
        return Err(AppError::BadRequest("booking.negative_amount".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BookingService {
    repo: BookingRepository,
    lead_repo: LeadRepository,
    visit_repo: VisitRepository,
    pool: PgPool,
    hub: RealtimeHub,
}

impl BookingService {
    pub fn new(
        repo: BookingRepository,
        lead_repo: LeadRepository,
        visit_repo: VisitRepository,
        pool: PgPool,
        hub: RealtimeHub,
    ) -> Self {
        Self { repo, lead_repo, visit_repo, pool, hub }
    }

    /// Cria a reserva e fecha o lead na mesma transação.
    pub async fn create(&self, claims: &Claims, payload: &CreateBookingPayload) -> Result<Booking, AppError> {
        validate_booking(payload)?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let lead = self
            .lead_repo
            .find_by_id(&mut *tx, payload.lead_id)
            .await?
            .ok_or(AppError::NotFound("resource.lead"))?;
        ensure_area_access(claims, &lead.area, "resource.lead")?;

        if let Some(visit_id) = payload.visit_id {
            let visit = self
                .visit_repo
                .find_by_id(&mut *tx, visit_id)
                .await?
                .ok_or(AppError::NotFound("resource.visit"))?;
            if visit.lead_id != lead.id {
                return Err(AppError::BadRequest("booking.visit_mismatch".into()));
            }
        }

        let property_vsid = payload
            .property_vsid
            .as_deref()
            .or(lead.property_vsid.as_deref())
            .map(|v| v.trim().to_uppercase());

        let booking = self
            .repo
            .create(
                &mut *tx,
                NewBooking {
                    lead_id: lead.id,
                    visit_id: payload.visit_id,
                    property_vsid: property_vsid.as_deref(),
                    area: &lead.area,
                    check_in: payload.check_in,
                    check_out: payload.check_out,
                    amount: payload.amount,
                    created_by: claims.id,
                },
            )
            .await?;

        let closed_lead = self
            .lead_repo
            .update_status(&mut *tx, lead.id, LeadStatus::Closed, None)
            .await?
            .ok_or(AppError::NotFound("resource.lead"))?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("📅 Reserva {} criada; lead {} fechado", booking.id, lead.id);

        let disposition = closed_lead.disposition.as_deref();
        let mut events = lead_events(&closed_lead.area, disposition, "booking:created", json!(booking));
        events.extend(lead_events(&closed_lead.area, disposition, "lead:updated", json!(closed_lead)));
        self.hub.publish_all(events).await;

        Ok(booking)
    }

    pub async fn list(&self, claims: &Claims, filter: &BookingFilter) -> Result<Paginated<Booking>, AppError> {
        let page = PageRequest::new(filter.page, filter.limit);
        let scope = claims.area_scope();
        let (data, total) = self.repo.list(filter, scope.as_deref(), page).await?;
        Ok(Paginated::new(data, page, total))
    }

    pub async fn get(&self, claims: &Claims, id: Uuid) -> Result<Booking, AppError> {
        let booking = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("resource.booking"))?;
        ensure_area_access(claims, &booking.area, "resource.booking")?;
        Ok(booking)
    }

    pub async fn delete(&self, claims: &Claims, id: Uuid) -> Result<(), AppError> {
        self.get(claims, id).await?;
        self.repo
            .delete(id)
            .await?
            .ok_or(AppError::NotFound("resource.booking"))?;
        tracing::info!("📅 Reserva {} removida", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payload(check_in: (i32, u32, u32), check_out: Option<(i32, u32, u32)>, amount: i64) -> CreateBookingPayload {
        let date = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        CreateBookingPayload {
            lead_id: Uuid::new_v4(),
            visit_id: None,
            property_vsid: None,
            check_in: date(check_in),
            check_out: check_out.map(date),
            amount: Decimal::from(amount),
        }
    }

    #[test]
    fn accepts_open_and_ordered_stays() {
        assert!(validate_booking(&payload((2025, 3, 1), None, 0)).is_ok());
        assert!(validate_booking(&payload((2025, 3, 1), Some((2025, 3, 1)), 100)).is_ok());
        assert!(validate_booking(&payload((2025, 3, 1), Some((2025, 3, 5)), 1200)).is_ok());
    }

    #[test]
    fn rejects_inverted_dates_and_negative_amounts() {
        let err = validate_booking(&payload((2025, 3, 5), Some((2025, 3, 1)), 0)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(key) if key == "booking.invalid_dates"));

        let err = validate_booking(&payload((2025, 3, 1), None, -10)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(key) if key == "booking.negative_amount"));
    }
}
