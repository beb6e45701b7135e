// src/db/memory_store.rs
//
// DeliveryStore em memória para os testes. Reproduz as regras do esquema:
// índice único (endereço, seq), FK do corretor e os contadores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::DeliveryStore,
    models::{
        dashboard::DashboardCounts,
        drops::{BoxDrop, BoxDropDetail, DropFilter, DropStatus, NewBoxDrop, UpdatePlan},
        realtors::{Realtor, RealtorIntake},
    },
};

#[derive(Default)]
struct Tables {
    drops: Vec<BoxDrop>,
    realtors: HashMap<Uuid, Realtor>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// Simula outra requisição vencendo a corrida entre a checagem e o insert.
    race_on_next_insert: Mutex<Option<NewBoxDrop>>,
    /// Próximo insert bate no índice único, qualquer que seja a guarda.
    conflict_on_next_insert: Mutex<bool>,
}

impl Tables {
    fn detail(&self, drop: &BoxDrop) -> BoxDropDetail {
        let realtor = drop.realtor_id.and_then(|id| self.realtors.get(&id));
        BoxDropDetail {
            drop: drop.clone(),
            realtor_first_name: realtor.map(|r| r.first_name.clone()),
            realtor_last_name: realtor.and_then(|r| r.last_name.clone()),
            realtor_email: realtor.and_then(|r| r.email.clone()),
            realtor_phone: realtor.and_then(|r| r.phone.clone()),
            realtor_company: realtor.and_then(|r| r.company.clone()),
        }
    }

    fn next_seq(&self, address: &str) -> i32 {
        self.drops
            .iter()
            .filter(|d| d.homeowner_address == address)
            .map(|d| d.address_seq + 1)
            .max()
            .unwrap_or(0)
    }

    fn insert(&mut self, new: &NewBoxDrop, guarded: bool) -> Result<BoxDrop, AppError> {
        if let Some(realtor_id) = new.realtor_id {
            if !self.realtors.contains_key(&realtor_id) {
                return Err(AppError::BadRequest("unknown_realtor".into()));
            }
        }

        let address_seq = if guarded { 0 } else { self.next_seq(&new.homeowner_address) };
        let taken = self
            .drops
            .iter()
            .any(|d| d.homeowner_address == new.homeowner_address && d.address_seq == address_seq);
        if taken {
            return Err(AppError::UniqueConstraintViolation(new.homeowner_address.clone()));
        }

        let now = Utc::now();
        let drop = BoxDrop {
            id: Uuid::new_v4(),
            realtor_id: new.realtor_id,
            homeowner_address: new.homeowner_address.clone(),
            address_seq,
            homeowner_name: new.homeowner_name.clone(),
            homeowner_email: new.homeowner_email.clone(),
            homeowner_phone: new.homeowner_phone.clone(),
            listing_status: Some(new.listing_status),
            campaign_source: new.campaign_source.clone(),
            status: new.status,
            requested_date: now.date_naive(),
            scheduled_date: new.scheduled_date,
            delivered_date: None,
            delivery_notes: None,
            followup_email_homeowner: false,
            followup_email_realtor: false,
            followup_text_homeowner: false,
            followup_call_homeowner: false,
            quote_requested: false,
            booked: false,
            revenue: None,
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        if let Some(realtor) = drop.realtor_id.and_then(|id| self.realtors.get_mut(&id)) {
            realtor.total_drops += 1;
        }
        self.drops.push(drop.clone());
        Ok(drop)
    }

    fn sorted_details<F>(&self, keep: F) -> Vec<BoxDropDetail>
    where
        F: Fn(&BoxDrop) -> bool,
    {
        let mut drops: Vec<&BoxDrop> = self.drops.iter().filter(|d| keep(d)).collect();
        drops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        drops.into_iter().map(|d| self.detail(d)).collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_realtor(&self, first_name: &str, email: Option<&str>) -> Realtor {
        let now = Utc::now();
        let realtor = Realtor {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: None,
            email: email.map(str::to_string),
            phone: None,
            company: None,
            total_drops: 0,
            total_conversions: 0,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.realtors.insert(realtor.id, realtor.clone());
        realtor
    }

    pub async fn realtor(&self, id: Uuid) -> Option<Realtor> {
        self.tables.lock().await.realtors.get(&id).cloned()
    }

    pub async fn realtor_count(&self) -> usize {
        self.tables.lock().await.realtors.len()
    }

    pub async fn drop_count(&self) -> usize {
        self.tables.lock().await.drops.len()
    }

    /// Ajusta datas/flags de um drop sem passar pelas regras do serviço.
    pub async fn edit_drop<F>(&self, id: Uuid, edit: F)
    where
        F: FnOnce(&mut BoxDrop),
    {
        let mut tables = self.tables.lock().await;
        if let Some(drop) = tables.drops.iter_mut().find(|d| d.id == id) {
            edit(drop);
        }
    }

    /// O próximo `insert_drop` encontra este registro já gravado.
    pub async fn race_next_insert(&self, winner: NewBoxDrop) {
        *self.race_on_next_insert.lock().await = Some(winner);
    }

    pub async fn conflict_next_insert(&self) {
        *self.conflict_on_next_insert.lock().await = true;
    }
}

#[async_trait]
impl DeliveryStore for MemoryStore {
    async fn find_drop(&self, id: Uuid) -> Result<Option<BoxDropDetail>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.drops.iter().find(|d| d.id == id).map(|d| tables.detail(d)))
    }

    async fn find_drop_by_address(&self, address: &str) -> Result<Option<BoxDrop>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .drops
            .iter()
            .filter(|d| d.homeowner_address == address)
            .min_by_key(|d| d.address_seq)
            .cloned())
    }

    async fn insert_drop(&self, drop: NewBoxDrop, guarded: bool) -> Result<BoxDrop, AppError> {
        let mut tables = self.tables.lock().await;
        if let Some(winner) = self.race_on_next_insert.lock().await.take() {
            tables.insert(&winner, true)?;
        }
        if std::mem::take(&mut *self.conflict_on_next_insert.lock().await) {
            return Err(AppError::UniqueConstraintViolation(drop.homeowner_address));
        }
        tables.insert(&drop, guarded)
    }

    async fn apply_update(&self, id: Uuid, plan: &UpdatePlan) -> Result<Option<BoxDrop>, AppError> {
        let mut tables = self.tables.lock().await;

        let new_seq = plan
            .patch
            .homeowner_address
            .as_deref()
            .map(|address| tables.next_seq(address));

        if let Some(realtor_id) = plan.patch.realtor_id.flatten() {
            if !tables.realtors.contains_key(&realtor_id) {
                return Err(AppError::BadRequest("unknown_realtor".into()));
            }
        }

        let Some(drop) = tables.drops.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };

        let p = &plan.patch;
        if let Some(v) = p.status {
            drop.status = v;
        }
        if let (Some(address), Some(seq)) = (&p.homeowner_address, new_seq) {
            drop.homeowner_address = address.clone();
            drop.address_seq = seq;
        }
        if let Some(v) = &p.homeowner_name {
            drop.homeowner_name = v.clone();
        }
        if let Some(v) = &p.homeowner_email {
            drop.homeowner_email = v.clone();
        }
        if let Some(v) = &p.homeowner_phone {
            drop.homeowner_phone = v.clone();
        }
        if let Some(v) = p.listing_status {
            drop.listing_status = v;
        }
        if let Some(v) = &p.campaign_source {
            drop.campaign_source = v.clone();
        }
        if let Some(v) = p.scheduled_date {
            drop.scheduled_date = v;
        }
        if let Some(v) = p.delivered_date {
            drop.delivered_date = v;
        }
        if let Some(v) = &p.delivery_notes {
            drop.delivery_notes = v.clone();
        }
        if let Some(v) = p.followup_email_homeowner {
            drop.followup_email_homeowner = v;
        }
        if let Some(v) = p.followup_email_realtor {
            drop.followup_email_realtor = v;
        }
        if let Some(v) = p.followup_text_homeowner {
            drop.followup_text_homeowner = v;
        }
        if let Some(v) = p.followup_call_homeowner {
            drop.followup_call_homeowner = v;
        }
        if let Some(v) = p.quote_requested {
            drop.quote_requested = v;
        }
        if let Some(v) = p.booked {
            drop.booked = v;
        }
        if let Some(v) = p.revenue {
            drop.revenue = v;
        }
        if let Some(v) = &p.notes {
            drop.notes = v.clone();
        }
        if let Some(v) = p.realtor_id {
            drop.realtor_id = v;
        }
        if let Some(today) = plan.stamp_delivered {
            drop.delivered_date.get_or_insert(today);
        }
        drop.updated_at = Utc::now();

        let updated = drop.clone();
        if plan.credit_conversion {
            if let Some(realtor) = updated.realtor_id.and_then(|rid| tables.realtors.get_mut(&rid)) {
                realtor.total_conversions += 1;
            }
        }
        Ok(Some(updated))
    }

    async fn delete_drop(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.drops.len();
        tables.drops.retain(|d| d.id != id);
        Ok(tables.drops.len() < before)
    }

    async fn list_drops(&self, filter: &DropFilter) -> Result<Vec<BoxDropDetail>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.sorted_details(|d| {
            filter.status.is_none_or(|s| d.status == s)
                && filter.realtor_id.is_none_or(|r| d.realtor_id == Some(r))
                && (!filter.needs_followup || d.needs_email_followup())
        }))
    }

    async fn drops_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BoxDropDetail>, AppError> {
        let tables = self.tables.lock().await;
        let mut drops: Vec<&BoxDrop> = tables
            .drops
            .iter()
            .filter(|d| (start..=end).contains(&d.bucket_date()))
            .collect();
        drops.sort_by_key(|d| (d.bucket_date(), d.created_at));
        Ok(drops.into_iter().map(|d| tables.detail(d)).collect())
    }

    async fn pending_followups(&self) -> Result<Vec<BoxDropDetail>, AppError> {
        let tables = self.tables.lock().await;
        let mut drops: Vec<&BoxDrop> = tables.drops.iter().filter(|d| d.needs_any_followup()).collect();
        // NULLS LAST
        drops.sort_by_key(|d| (d.delivered_date.is_none(), d.delivered_date));
        Ok(drops.into_iter().map(|d| tables.detail(d)).collect())
    }

    async fn auto_intake(&self, intake: RealtorIntake, mut drop: NewBoxDrop) -> Result<(Realtor, BoxDrop), AppError> {
        let mut tables = self.tables.lock().await;

        let existing_id = intake.email.as_deref().and_then(|email| {
            tables
                .realtors
                .values()
                .filter(|r| r.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
                .min_by_key(|r| r.created_at)
                .map(|r| r.id)
        });

        let realtor_id = match existing_id.and_then(|id| tables.realtors.get_mut(&id)) {
            Some(realtor) => {
                if realtor.last_name.is_none() {
                    realtor.last_name = intake.last_name.clone();
                }
                if realtor.phone.is_none() {
                    realtor.phone = intake.phone.clone();
                }
                if realtor.company.is_none() {
                    realtor.company = intake.company.clone();
                }
                realtor.id
            }
            None => {
                let now = Utc::now();
                let realtor = Realtor {
                    id: Uuid::new_v4(),
                    first_name: intake.first_name.clone(),
                    last_name: intake.last_name.clone(),
                    email: intake.email.clone(),
                    phone: intake.phone.clone(),
                    company: intake.company.clone(),
                    total_drops: 0,
                    total_conversions: 0,
                    created_at: now,
                    updated_at: now,
                };
                let id = realtor.id;
                tables.realtors.insert(id, realtor);
                id
            }
        };

        drop.realtor_id = Some(realtor_id);
        let created = tables.insert(&drop, false)?;
        let realtor = tables
            .realtors
            .get(&realtor_id)
            .cloned()
            .ok_or(AppError::NotFound("realtor"))?;
        Ok((realtor, created))
    }

    async fn dashboard_counts(&self, week_start: NaiveDate, week_end: NaiveDate) -> Result<DashboardCounts, AppError> {
        let tables = self.tables.lock().await;
        let count = |pred: fn(&BoxDrop, NaiveDate, NaiveDate) -> bool| {
            tables.drops.iter().filter(|d| pred(d, week_start, week_end)).count() as i64
        };

        Ok(DashboardCounts {
            total_active: count(|d, _, _| d.is_active()),
            this_week: count(|d, start, end| d.is_active() && (start..=end).contains(&d.bucket_date())),
            pending_followups: count(|d, _, _| d.needs_email_followup()),
            converted: count(|d, _, _| d.status == DropStatus::Converted),
            delivered_or_later: count(|d, _, _| d.status.is_delivered_or_later()),
            realtor_count: tables.realtors.len() as i64,
            total_revenue: tables
                .drops
                .iter()
                .filter(|d| d.booked)
                .filter_map(|d| d.revenue)
                .sum::<Decimal>(),
        })
    }
}
