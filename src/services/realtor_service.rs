// src/services/realtor_service.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{DropRepository, RealtorRepository},
    models::realtors::{CreateRealtorPayload, Realtor, RealtorPatch, RealtorWithDrops},
};

#[derive(Clone)]
pub struct RealtorService {
    realtor_repo: RealtorRepository,
    drop_repo: DropRepository,
}

impl RealtorService {
    pub fn new(realtor_repo: RealtorRepository, drop_repo: DropRepository) -> Self {
        Self { realtor_repo, drop_repo }
    }

    pub async fn list(&self) -> Result<Vec<Realtor>, AppError> {
        self.realtor_repo.list(self.realtor_repo.pool()).await
    }

    /// Corretor com os drops dele (mais novos primeiro).
    pub async fn get(&self, id: Uuid) -> Result<RealtorWithDrops, AppError> {
        let pool = self.realtor_repo.pool();
        let realtor = self
            .realtor_repo
            .find_by_id(pool, id)
            .await?
            .ok_or(AppError::NotFound("realtor"))?;
        let drops = self.drop_repo.list_for_realtor(pool, id).await?;

        Ok(RealtorWithDrops { realtor, drops })
    }

    pub async fn create(&self, payload: CreateRealtorPayload) -> Result<Realtor, AppError> {
        payload.validate()?;
        let realtor = self.realtor_repo.create(self.realtor_repo.pool(), &payload).await?;
        tracing::info!("Corretor {} cadastrado", realtor.id);
        Ok(realtor)
    }

    pub async fn update(&self, id: Uuid, patch: RealtorPatch) -> Result<Realtor, AppError> {
        if patch.is_empty() {
            return Err(AppError::BadRequest("No fields to update".into()));
        }
        patch.validate()?;

        self.realtor_repo
            .update(self.realtor_repo.pool(), id, &patch)
            .await?
            .ok_or(AppError::NotFound("realtor"))
    }
}
