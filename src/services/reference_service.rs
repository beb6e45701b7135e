// src/services/reference_service.rs

use crate::{
    common::error::AppError,
    db::{AutomationRepository, ReferenceRepository},
    models::{
        automation::{AutomationPage, AutomationQuery},
        reference::{FollowUpTemplate, SupplyItem},
    },
};

/// Leituras de dados de referência e do log de automação.
#[derive(Clone)]
pub struct ReferenceService {
    reference_repo: ReferenceRepository,
    automation_repo: AutomationRepository,
}

impl ReferenceService {
    pub fn new(reference_repo: ReferenceRepository, automation_repo: AutomationRepository) -> Self {
        Self {
            reference_repo,
            automation_repo,
        }
    }

    pub async fn supplies(&self) -> Result<Vec<SupplyItem>, AppError> {
        self.reference_repo.list_supplies(self.reference_repo.pool()).await
    }

    pub async fn templates(&self) -> Result<Vec<FollowUpTemplate>, AppError> {
        self.reference_repo.list_templates(self.reference_repo.pool()).await
    }

    pub async fn automation_log(&self, query: &AutomationQuery) -> Result<AutomationPage, AppError> {
        let pool = self.automation_repo.pool();
        let (limit, offset) = query.page();

        let total = self.automation_repo.count(pool, query).await?;
        let events = self.automation_repo.page(pool, query).await?;
        let stats = self.automation_repo.classification_stats(pool).await?;

        Ok(AutomationPage {
            events,
            total,
            limit,
            offset,
            stats,
        })
    }
}
