// src/services/lead_service.rs

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::{PageRequest, Paginated}},
    db::{lead_repo::NewLead, LeadRepository},
    models::{
        auth::Claims,
        lead::{CreateLeadPayload, Lead, LeadFilter, LeadStatus, UpdateLeadStatusPayload},
    },
    realtime::{hub, lead_events, RealtimeEvent, RealtimeHub},
};

/// Regras de transição de status. Devolve o `reminder_at` a gravar.
///
/// `reminder` exige uma data futura; qualquer outro status limpa o lembrete.
pub fn resolve_reminder(
    status: LeadStatus,
    reminder_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    match (status, reminder_at) {
        (LeadStatus::Reminder, None) => Err(AppError::BadRequest("lead.reminder_required".into())),
        (LeadStatus::Reminder, Some(at)) if at <= now => Err(AppError::BadRequest("lead.reminder_in_past".into())),
        (LeadStatus::Reminder, Some(at)) => Ok(Some(at)),
        _ => Ok(None),
    }
}

/// Fora da área do usuário o lead "não existe" para ele.
pub(crate) fn ensure_area_access(claims: &Claims, area: &str, resource: &'static str) -> Result<(), AppError> {
    if claims.can_access_area(area) {
        Ok(())
    } else {
        Err(AppError::NotFound(resource))
    }
}

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
    pool: PgPool,
    hub: RealtimeHub,
}

impl LeadService {
    pub fn new(repo: LeadRepository, pool: PgPool, hub: RealtimeHub) -> Self {
        Self { repo, pool, hub }
    }

    async fn notify(&self, lead: &Lead, event: &str) {
        let payload = json!(lead);
        let delivered = self
            .hub
            .publish_all(lead_events(&lead.area, lead.disposition.as_deref(), event, payload))
            .await;
        tracing::debug!("{} do lead {} entregue a {} inscritos", event, lead.id, delivered);
    }

    pub async fn create(&self, claims: &Claims, payload: CreateLeadPayload) -> Result<Lead, AppError> {
        let area = payload.area.trim().to_lowercase();
        if !claims.can_access_area(&area) {
            return Err(AppError::Forbidden);
        }
        let property_vsid = payload.property_vsid.as_deref().map(|v| v.trim().to_uppercase());

        let lead = self
            .repo
            .create(NewLead {
                name: payload.name.trim(),
                email: payload.email.as_deref(),
                phone: payload.phone.trim(),
                area: &area,
                property_vsid: property_vsid.as_deref(),
                budget: payload.budget,
                source: payload.source.as_deref(),
                notes: payload.notes.as_deref(),
                assigned_to: payload.assigned_to,
                created_by: claims.id,
            })
            .await?;

        tracing::info!("📇 Lead {} criado em '{}' por {}", lead.id, lead.area, claims.email);
        self.notify(&lead, "lead:created").await;
        Ok(lead)
    }

    pub async fn list(&self, claims: &Claims, filter: &LeadFilter) -> Result<Paginated<Lead>, AppError> {
        let page = PageRequest::new(filter.page, filter.limit);
        let scope = claims.area_scope();
        let (data, total) = self.repo.list(filter, scope.as_deref(), page).await?;
        Ok(Paginated::new(data, page, total))
    }

    pub async fn get(&self, claims: &Claims, id: Uuid) -> Result<Lead, AppError> {
        let lead = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("resource.lead"))?;
        ensure_area_access(claims, &lead.area, "resource.lead")?;
        Ok(lead)
    }

    pub async fn update_status(
        &self,
        claims: &Claims,
        id: Uuid,
        payload: &UpdateLeadStatusPayload,
    ) -> Result<Lead, AppError> {
        let reminder_at = resolve_reminder(payload.status, payload.reminder_at, Utc::now())?;
        self.get(claims, id).await?;

        let lead = self
            .repo
            .update_status(&self.pool, id, payload.status, reminder_at)
            .await?
            .ok_or(AppError::NotFound("resource.lead"))?;

        self.notify(&lead, "lead:updated").await;
        Ok(lead)
    }

    pub async fn update_disposition(&self, claims: &Claims, id: Uuid, disposition: &str) -> Result<Lead, AppError> {
        let previous = self.get(claims, id).await?;
        let disposition = disposition.trim().to_lowercase();

        let lead = self
            .repo
            .update_disposition(id, &disposition)
            .await?
            .ok_or(AppError::NotFound("resource.lead"))?;

        // Quem acompanha a sala antiga também precisa saber que o lead saiu dela
        let mut events = lead_events(&lead.area, lead.disposition.as_deref(), "lead:updated", json!(lead));
        let old_room = hub::lead_room(&previous.area, previous.disposition.as_deref());
        if old_room != events[0].room {
            events.push(RealtimeEvent::with_id(events[0].id.clone(), old_room, "lead:updated", json!(lead)));
        }
        self.hub.publish_all(events).await;

        Ok(lead)
    }

    pub async fn assign(&self, claims: &Claims, id: Uuid, employee_id: Uuid) -> Result<Lead, AppError> {
        self.get(claims, id).await?;

        let lead = self
            .repo
            .assign(id, employee_id)
            .await?
            .ok_or(AppError::NotFound("resource.lead"))?;

        tracing::info!("📇 Lead {} atribuído a {}", lead.id, employee_id);
        self.notify(&lead, "lead:updated").await;
        Ok(lead)
    }

    pub async fn delete(&self, claims: &Claims, id: Uuid) -> Result<(), AppError> {
        self.get(claims, id).await?;

        let lead = self
            .repo
            .delete(id)
            .await?
            .ok_or(AppError::NotFound("resource.lead"))?;

        self.notify(&lead, "lead:deleted").await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(role: &str, areas: &[&str]) -> Claims {
        Claims {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@estate.test".into(),
            role: role.into(),
            alloted_area: areas.iter().map(|a| a.to_string()).collect(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn reminder_requires_a_future_date() {
        let now = Utc::now();

        let err = resolve_reminder(LeadStatus::Reminder, None, now).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(key) if key == "lead.reminder_required"));

        let err = resolve_reminder(LeadStatus::Reminder, Some(now - Duration::hours(1)), now).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(key) if key == "lead.reminder_in_past"));

        let at = now + Duration::days(2);
        assert_eq!(resolve_reminder(LeadStatus::Reminder, Some(at), now).unwrap(), Some(at));
    }

    #[test]
    fn other_statuses_clear_the_reminder() {
        let now = Utc::now();
        let at = Some(now + Duration::days(1));
        assert_eq!(resolve_reminder(LeadStatus::Active, at, now).unwrap(), None);
        assert_eq!(resolve_reminder(LeadStatus::Closed, None, now).unwrap(), None);
        assert_eq!(resolve_reminder(LeadStatus::Rejected, at, now).unwrap(), None);
    }

    #[test]
    fn out_of_area_leads_look_missing() {
        let agent = claims("sales", &["goa"]);
        assert!(ensure_area_access(&agent, "goa", "resource.lead").is_ok());
        assert!(matches!(
            ensure_area_access(&agent, "delhi", "resource.lead"),
            Err(AppError::NotFound("resource.lead"))
        ));
        assert!(ensure_area_access(&claims("manager", &[]), "delhi", "resource.lead").is_ok());
    }
}
