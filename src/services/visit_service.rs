// src/services/visit_service.rs

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadRepository, VisitRepository},
    models::{
        auth::Claims,
        lead::Lead,
        visit::{CreateVisitPayload, UpdateVisitPayload, Visit, VisitFilter},
    },
    realtime::{lead_events, RealtimeHub},
    services::lead_service::ensure_area_access,
};

#[derive(Clone)]
pub struct VisitService {
    repo: VisitRepository,
    lead_repo: LeadRepository,
    pool: PgPool,
    hub: RealtimeHub,
}

impl VisitService {
    pub fn new(repo: VisitRepository, lead_repo: LeadRepository, pool: PgPool, hub: RealtimeHub) -> Self {
        Self { repo, lead_repo, pool, hub }
    }

    async fn lead_in_scope(&self, claims: &Claims, lead_id: Uuid) -> Result<Lead, AppError> {
        let lead = self
            .lead_repo
            .find_by_id(&self.pool, lead_id)
            .await?
            .ok_or(AppError::NotFound("resource.lead"))?;
        ensure_area_access(claims, &lead.area, "resource.lead")?;
        Ok(lead)
    }

    // Visitas seguem nas mesmas salas do lead
    async fn notify(&self, lead: &Lead, visit: &Visit, event: &str) {
        self.hub
            .publish_all(lead_events(&lead.area, lead.disposition.as_deref(), event, json!(visit)))
            .await;
    }

    pub async fn create(&self, claims: &Claims, payload: &CreateVisitPayload) -> Result<Visit, AppError> {
        let lead = self.lead_in_scope(claims, payload.lead_id).await?;
        let property_vsid = payload.property_vsid.as_deref().map(|v| v.trim().to_uppercase());

        let visit = self
            .repo
            .create(
                lead.id,
                &lead.area,
                property_vsid.as_deref(),
                payload.scheduled_at,
                payload.agent_id.or(lead.assigned_to),
            )
            .await?;

        tracing::info!("🏠 Visita {} agendada para o lead {}", visit.id, lead.id);
        self.notify(&lead, &visit, "visit:created").await;
        Ok(visit)
    }

    pub async fn list(&self, claims: &Claims, filter: &VisitFilter) -> Result<Vec<Visit>, AppError> {
        let scope = claims.area_scope();
        self.repo.list(filter, scope.as_deref()).await
    }

    pub async fn update(&self, claims: &Claims, id: Uuid, changes: &UpdateVisitPayload) -> Result<Visit, AppError> {
        let existing = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("resource.visit"))?;
        ensure_area_access(claims, &existing.area, "resource.visit")?;

        let visit = self
            .repo
            .update(id, changes)
            .await?
            .ok_or(AppError::NotFound("resource.visit"))?;

        if let Some(lead) = self.lead_repo.find_by_id(&self.pool, visit.lead_id).await? {
            self.notify(&lead, &visit, "visit:updated").await;
        }
        Ok(visit)
    }
}
