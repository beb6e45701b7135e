// src/services/drop_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, serde_utils::non_blank},
    db::store::DeliveryStore,
    models::{
        drops::{
            AutoDropPayload, AutoDropResult, BoxDrop, BoxDropDetail, CreateDropPayload, DropFilter, DropPatch,
            NewBoxDrop, PendingFollowups, UpdatePlan, WeeklyQuery,
        },
        realtors::RealtorIntake,
    },
    services::duplicate_guard::{self, InsertMode},
};

const PENDING_ADDRESS: &str = "Address pending";
const AUTO_CAMPAIGN: &str = "instantly_webhook";
const AUTO_NOTE: &str = "Auto-created from email reply.";

#[derive(Clone)]
pub struct DropService {
    store: Arc<dyn DeliveryStore>,
}

impl DropService {
    pub fn new(store: Arc<dyn DeliveryStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list(&self, filter: &DropFilter) -> Result<Vec<BoxDropDetail>, AppError> {
        self.store.list_drops(filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<BoxDropDetail, AppError> {
        self.store.find_drop(id).await?.ok_or(AppError::NotFound("drop"))
    }

    /// Drops cuja data de agrupamento cai em [start, end], ambos obrigatórios.
    pub async fn weekly(&self, query: &WeeklyQuery) -> Result<Vec<BoxDropDetail>, AppError> {
        let (Some(start), Some(end)) = (query.start, query.end) else {
            return Err(AppError::BadRequest("start and end params required".into()));
        };
        if start > end {
            return Err(AppError::BadRequest("start must not be after end".into()));
        }
        self.store.drops_between(start, end).await
    }

    pub async fn pending_followups(&self) -> Result<PendingFollowups, AppError> {
        let drops = self.store.pending_followups().await?;
        Ok(PendingFollowups {
            count: drops.len(),
            drops,
        })
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create(&self, payload: CreateDropPayload, allow_duplicate: bool) -> Result<BoxDrop, AppError> {
        payload.validate()?;

        let new_drop = NewBoxDrop {
            realtor_id: payload.realtor_id,
            homeowner_address: non_blank(payload.homeowner_address).unwrap_or_default(),
            homeowner_name: non_blank(payload.homeowner_name),
            homeowner_email: non_blank(payload.homeowner_email),
            homeowner_phone: non_blank(payload.homeowner_phone),
            listing_status: payload.listing_status.unwrap_or_default(),
            campaign_source: non_blank(payload.campaign_source),
            status: payload.status.unwrap_or_default(),
            scheduled_date: payload.scheduled_date,
            notes: non_blank(payload.notes),
        };

        let address = new_drop.homeowner_address.clone();
        let mode = duplicate_guard::check_address(self.store.as_ref(), &address, allow_duplicate).await?;

        let created = match self.store.insert_drop(new_drop, mode == InsertMode::Guarded).await {
            Ok(drop) => drop,
            // Só o insert com guarda pode perder a corrida pelo endereço
            Err(e) if mode == InsertMode::Guarded => {
                return Err(duplicate_guard::resolve_race(self.store.as_ref(), &address, e).await);
            }
            Err(e) => return Err(e),
        };

        tracing::info!("📦 Box drop {} criado", created.id);
        if let Some(realtor_id) = created.realtor_id {
            tracing::info!("Corretor {} creditado com +1 drop", realtor_id);
        }
        Ok(created)
    }

    /// Atualização parcial. Só os campos da allow-list (e updated_at) mudam.
    pub async fn update(&self, id: Uuid, patch: DropPatch) -> Result<BoxDrop, AppError> {
        if patch.is_empty() {
            return Err(AppError::BadRequest("No fields to update".into()));
        }

        let plan = UpdatePlan::from_patch(patch, Utc::now().date_naive());
        let updated = self
            .store
            .apply_update(id, &plan)
            .await?
            .ok_or(AppError::NotFound("drop"))?;

        if plan.credit_conversion {
            match updated.realtor_id {
                Some(realtor_id) => tracing::info!("🎉 Conversão registrada para o corretor {}", realtor_id),
                None => tracing::info!("Drop {} convertido sem corretor vinculado", updated.id),
            }
        }
        Ok(updated)
    }

    /// Um passo à frente no fluxo. Convertidos e cancelados não avançam.
    pub async fn advance(&self, id: Uuid) -> Result<BoxDrop, AppError> {
        let current = self.get(id).await?.drop.status;
        let next = current.next().ok_or(AppError::InvalidTransition(current))?;
        self.update(id, DropPatch::status(next)).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_drop(id).await? {
            return Err(AppError::NotFound("drop"));
        }
        tracing::info!("Box drop {} removido", id);
        Ok(())
    }

    /// Entrada automática vinda do processo de e-mails.
    pub async fn auto_intake(&self, payload: AutoDropPayload) -> Result<AutoDropResult, AppError> {
        let realtor_email = non_blank(payload.realtor_email);
        let realtor_name = non_blank(payload.realtor_name);
        if realtor_email.is_none() && realtor_name.is_none() {
            return Err(AppError::BadRequest(
                "At least realtorEmail or realtorName is required".into(),
            ));
        }

        let (first_name, last_name) = RealtorIntake::split_name(realtor_name.as_deref());
        let intake = RealtorIntake {
            first_name,
            last_name,
            email: realtor_email,
            phone: non_blank(payload.phone),
            company: non_blank(payload.realtor_company),
        };

        let notes = [
            non_blank(payload.notes),
            non_blank(payload.scheduling_note).map(|s| format!("Scheduling: {s}")),
            Some(AUTO_NOTE.to_string()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n");

        let new_drop = NewBoxDrop {
            realtor_id: None,
            homeowner_address: non_blank(payload.address).unwrap_or_else(|| PENDING_ADDRESS.to_string()),
            homeowner_name: non_blank(payload.homeowner_name),
            homeowner_email: non_blank(payload.homeowner_email),
            homeowner_phone: None,
            listing_status: payload.listing_status.unwrap_or_default(),
            campaign_source: Some(non_blank(payload.campaign_source).unwrap_or_else(|| AUTO_CAMPAIGN.to_string())),
            status: Default::default(),
            scheduled_date: None,
            notes: Some(notes),
        };

        let (realtor, drop) = self.store.auto_intake(intake, new_drop).await?;
        tracing::info!("🤖 Drop automático {} criado para o corretor {}", drop.id, realtor.id);

        Ok(AutoDropResult {
            success: true,
            drop_id: drop.id,
            realtor_id: realtor.id,
            message: format!("Box drop {} created for realtor {}", drop.id, realtor.id),
        })
    }
}
