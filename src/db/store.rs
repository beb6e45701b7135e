// src/db/store.rs
//
// Fronteira de persistência do ciclo de vida dos box drops. Os serviços só
// conhecem o trait; em produção quem responde é o Postgres, nos testes um
// store em memória com as mesmas regras.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DropRepository, RealtorRepository},
    models::{
        dashboard::DashboardCounts,
        drops::{BoxDrop, BoxDropDetail, DropFilter, NewBoxDrop, UpdatePlan},
        realtors::{Realtor, RealtorIntake},
    },
};

#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn find_drop(&self, id: Uuid) -> Result<Option<BoxDropDetail>, AppError>;

    /// Registro mais antigo com exatamente este endereço (inclui cancelados).
    async fn find_drop_by_address(&self, address: &str) -> Result<Option<BoxDrop>, AppError>;

    /// Insere o drop e credita `total_drops` do corretor na mesma transação.
    /// `guarded` ocupa a sequência 0 do endereço (ver índice único).
    async fn insert_drop(&self, drop: NewBoxDrop, guarded: bool) -> Result<BoxDrop, AppError>;

    /// `None` quando o id não existe. Crédito de conversão na mesma transação.
    async fn apply_update(&self, id: Uuid, plan: &UpdatePlan) -> Result<Option<BoxDrop>, AppError>;

    async fn delete_drop(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_drops(&self, filter: &DropFilter) -> Result<Vec<BoxDropDetail>, AppError>;

    async fn drops_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BoxDropDetail>, AppError>;

    async fn pending_followups(&self) -> Result<Vec<BoxDropDetail>, AppError>;

    /// Entrada automática: acha (por e-mail) ou cria o corretor, cria o drop
    /// sem guarda de duplicidade e credita o corretor. Tudo ou nada.
    async fn auto_intake(&self, intake: RealtorIntake, drop: NewBoxDrop) -> Result<(Realtor, BoxDrop), AppError>;

    async fn dashboard_counts(&self, week_start: NaiveDate, week_end: NaiveDate) -> Result<DashboardCounts, AppError>;
}

#[derive(Clone)]
pub struct PgDeliveryStore {
    pool: PgPool,
    drop_repo: DropRepository,
    realtor_repo: RealtorRepository,
}

impl PgDeliveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            drop_repo: DropRepository::new(pool.clone()),
            realtor_repo: RealtorRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl DeliveryStore for PgDeliveryStore {
    async fn find_drop(&self, id: Uuid) -> Result<Option<BoxDropDetail>, AppError> {
        self.drop_repo.find_detail(&self.pool, id).await
    }

    async fn find_drop_by_address(&self, address: &str) -> Result<Option<BoxDrop>, AppError> {
        self.drop_repo.find_by_address(&self.pool, address).await
    }

    async fn insert_drop(&self, drop: NewBoxDrop, guarded: bool) -> Result<BoxDrop, AppError> {
        let mut tx = self.pool.begin().await?;

        self.drop_repo.lock_address(&mut *tx, &drop.homeowner_address).await?;
        let created = self.drop_repo.insert(&mut *tx, &drop, guarded).await?;
        if let Some(realtor_id) = created.realtor_id {
            self.realtor_repo.increment_drops(&mut *tx, realtor_id).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn apply_update(&self, id: Uuid, plan: &UpdatePlan) -> Result<Option<BoxDrop>, AppError> {
        let mut tx = self.pool.begin().await?;

        if let Some(address) = &plan.patch.homeowner_address {
            self.drop_repo.lock_address(&mut *tx, address).await?;
        }
        let Some(updated) = self.drop_repo.apply_update(&mut *tx, id, plan).await? else {
            return Ok(None);
        };

        if plan.credit_conversion {
            if let Some(realtor_id) = updated.realtor_id {
                self.realtor_repo.increment_conversions(&mut *tx, realtor_id).await?;
            }
        }

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_drop(&self, id: Uuid) -> Result<bool, AppError> {
        self.drop_repo.delete(&self.pool, id).await
    }

    async fn list_drops(&self, filter: &DropFilter) -> Result<Vec<BoxDropDetail>, AppError> {
        self.drop_repo.list(&self.pool, filter).await
    }

    async fn drops_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BoxDropDetail>, AppError> {
        self.drop_repo.between(&self.pool, start, end).await
    }

    async fn pending_followups(&self) -> Result<Vec<BoxDropDetail>, AppError> {
        self.drop_repo.pending_followups(&self.pool).await
    }

    async fn auto_intake(&self, intake: RealtorIntake, mut drop: NewBoxDrop) -> Result<(Realtor, BoxDrop), AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = match intake.email.as_deref() {
            Some(email) => self.realtor_repo.find_by_email(&mut *tx, email).await?,
            None => None,
        };

        let realtor = match existing {
            Some(realtor) => {
                self.realtor_repo.fill_missing_contact(&mut *tx, realtor.id, &intake).await?;
                realtor
            }
            None => self.realtor_repo.insert_intake(&mut *tx, &intake).await?,
        };

        drop.realtor_id = Some(realtor.id);
        self.drop_repo.lock_address(&mut *tx, &drop.homeowner_address).await?;
        let created = self.drop_repo.insert(&mut *tx, &drop, false).await?;
        self.realtor_repo.increment_drops(&mut *tx, realtor.id).await?;

        tx.commit().await?;
        Ok((realtor, created))
    }

    async fn dashboard_counts(&self, week_start: NaiveDate, week_end: NaiveDate) -> Result<DashboardCounts, AppError> {
        self.drop_repo.dashboard_counts(&self.pool, week_start, week_end).await
    }
}
