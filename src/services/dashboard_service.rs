// src/services/dashboard_service.rs

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::{
        auth::Claims,
        dashboard::{AreaBookings, DashboardSummary, DispositionCount, LeadStatusCount},
    },
};

// Agregações respeitam as áreas do usuário (admin/gerente veem tudo)
#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn leads_by_status(&self, claims: &Claims) -> Result<Vec<LeadStatusCount>, AppError> {
        let scope = claims.area_scope();
        self.repo.leads_by_status(scope.as_deref()).await
    }

    pub async fn leads_by_disposition(
        &self,
        claims: &Claims,
        area: Option<&str>,
    ) -> Result<Vec<DispositionCount>, AppError> {
        let scope = claims.area_scope();
        self.repo.leads_by_disposition(scope.as_deref(), area).await
    }

    pub async fn bookings_by_area(&self, claims: &Claims) -> Result<Vec<AreaBookings>, AppError> {
        let scope = claims.area_scope();
        self.repo.bookings_by_area(scope.as_deref()).await
    }

    pub async fn summary(&self, claims: &Claims) -> Result<DashboardSummary, AppError> {
        let scope = claims.area_scope();
        self.repo.summary(scope.as_deref()).await
    }
}
