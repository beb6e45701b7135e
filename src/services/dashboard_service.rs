// src/services/dashboard_service.rs

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{store::DeliveryStore, ReferenceRepository},
    models::{
        dashboard::{DashboardCounts, DashboardStats},
        reference::{SupplyItem, SupplyLine, SupplyPlan},
    },
};

/// Semana de segunda a domingo (inclusive) que contém `day`.
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    (start, start + Duration::days(6))
}

/// round(convertidos / entregues-ou-depois × 100), 0 sem denominador.
pub fn conversion_rate(converted: i64, delivered_or_later: i64) -> i64 {
    if delivered_or_later <= 0 {
        return 0;
    }
    (converted as f64 / delivered_or_later as f64 * 100.0).round() as i64
}

pub fn build_stats(counts: &DashboardCounts, week_start: NaiveDate, week_end: NaiveDate) -> DashboardStats {
    DashboardStats {
        total_drops: counts.total_active,
        this_week: counts.this_week,
        pending_followups: counts.pending_followups,
        conversion_rate: conversion_rate(counts.converted, counts.delivered_or_later),
        total_converted: counts.converted,
        total_revenue: counts.total_revenue,
        realtor_count: counts.realtor_count,
        week_start,
        week_end,
    }
}

/// Quantidades escalam linearmente com o número de drops da semana.
pub fn build_supply_plan(
    week_start: NaiveDate,
    week_end: NaiveDate,
    drop_count: i64,
    items: Vec<SupplyItem>,
) -> SupplyPlan {
    let lines: Vec<SupplyLine> = items
        .into_iter()
        .map(|item| {
            let total_needed = item.qty_per_kit as i64 * drop_count;
            let total_cost = item.unit_cost * Decimal::from(total_needed);
            SupplyLine {
                item,
                total_needed,
                total_cost,
            }
        })
        .collect();
    let total_cost = lines.iter().map(|l| l.total_cost).sum();

    SupplyPlan {
        week_start,
        week_end,
        drop_count,
        items: lines,
        total_cost,
    }
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn DeliveryStore>,
    reference_repo: ReferenceRepository,
}

impl DashboardService {
    pub fn new(store: Arc<dyn DeliveryStore>, reference_repo: ReferenceRepository) -> Self {
        Self { store, reference_repo }
    }

    /// Recalculado a cada chamada.
    pub async fn stats_for(&self, today: NaiveDate) -> Result<DashboardStats, AppError> {
        let (week_start, week_end) = week_bounds(today);
        let counts = self.store.dashboard_counts(week_start, week_end).await?;
        Ok(build_stats(&counts, week_start, week_end))
    }

    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        self.stats_for(Utc::now().date_naive()).await
    }

    pub async fn supply_plan(&self, week_of: Option<NaiveDate>) -> Result<SupplyPlan, AppError> {
        let (week_start, week_end) = week_bounds(week_of.unwrap_or_else(|| Utc::now().date_naive()));
        let counts = self.store.dashboard_counts(week_start, week_end).await?;
        let items = self.reference_repo.list_supplies(self.reference_repo.pool()).await?;
        Ok(build_supply_plan(week_start, week_end, counts.this_week, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use crate::{
        db::memory_store::MemoryStore,
        models::drops::{DropPatch, DropStatus, NewBoxDrop},
        services::drop_service::DropService,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lazy_repo() -> ReferenceRepository {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/box_drop_test")
            .unwrap();
        ReferenceRepository::new(pool)
    }

    #[test]
    fn week_starts_on_monday_and_sunday_belongs_to_the_previous_week() {
        // 2024-03-04 é segunda
        assert_eq!(week_bounds(date(2024, 3, 4)), (date(2024, 3, 4), date(2024, 3, 10)));
        assert_eq!(week_bounds(date(2024, 3, 7)), (date(2024, 3, 4), date(2024, 3, 10)));
        assert_eq!(week_bounds(date(2024, 3, 10)), (date(2024, 3, 4), date(2024, 3, 10)));
        assert_eq!(week_bounds(date(2024, 3, 11)), (date(2024, 3, 11), date(2024, 3, 17)));
    }

    #[test]
    fn conversion_rate_handles_the_empty_denominator() {
        assert_eq!(conversion_rate(0, 0), 0);
        assert_eq!(conversion_rate(1, 4), 25);
        assert_eq!(conversion_rate(2, 3), 67);
        assert_eq!(conversion_rate(3, 3), 100);
    }

    #[test]
    fn supply_plan_scales_with_the_drop_count() {
        let items = vec![
            SupplyItem {
                id: Uuid::new_v4(),
                name: "Medium moving box".into(),
                qty_per_kit: 10,
                unit_cost: Decimal::new(185, 2),
            },
            SupplyItem {
                id: Uuid::new_v4(),
                name: "Packing tape".into(),
                qty_per_kit: 2,
                unit_cost: Decimal::new(350, 2),
            },
        ];
        let plan = build_supply_plan(date(2024, 3, 4), date(2024, 3, 10), 3, items);

        assert_eq!(plan.items[0].total_needed, 30);
        assert_eq!(plan.items[0].total_cost, Decimal::new(5550, 2));
        assert_eq!(plan.items[1].total_needed, 6);
        assert_eq!(plan.items[1].total_cost, Decimal::new(2100, 2));
        assert_eq!(plan.total_cost, Decimal::new(7650, 2));
    }

    #[tokio::test]
    async fn stats_follow_the_dashboard_rules() {
        let store = Arc::new(MemoryStore::new());
        let drops = DropService::new(store.clone());
        let service = DashboardService::new(store.clone(), lazy_repo());
        store.add_realtor("Jane", None).await;

        let today = date(2024, 3, 6);
        let mut ids = Vec::new();
        for i in 0..6 {
            let created = store
                .insert_drop(
                    NewBoxDrop {
                        homeowner_address: format!("{i} Elm St"),
                        ..NewBoxDrop::default()
                    },
                    true,
                )
                .await
                .unwrap();
            store.edit_drop(created.id, |d| d.requested_date = date(2024, 3, 5)).await;
            ids.push(created.id);
        }

        // 0: entregue sem follow-up; 1: entregue com os dois e-mails;
        // 2 e 3: convertidos com receita; 4: cancelado; 5: agendado para outra semana
        drops.update(ids[0], DropPatch::status(DropStatus::Delivered)).await.unwrap();
        store
            .edit_drop(ids[1], |d| {
                d.status = DropStatus::Delivered;
                d.followup_email_homeowner = true;
                d.followup_email_realtor = true;
            })
            .await;
        for id in [ids[2], ids[3]] {
            store
                .edit_drop(id, |d| {
                    d.status = DropStatus::Converted;
                    d.booked = true;
                    d.revenue = Some(Decimal::new(45000, 2));
                })
                .await;
        }
        // Receita sem booked não conta
        store.edit_drop(ids[0], |d| d.revenue = Some(Decimal::new(999, 0))).await;
        store.edit_drop(ids[4], |d| d.status = DropStatus::Cancelled).await;
        store.edit_drop(ids[5], |d| d.scheduled_date = Some(date(2024, 3, 20))).await;

        let stats = service.stats_for(today).await.unwrap();
        assert_eq!(stats.total_drops, 5);
        assert_eq!(stats.this_week, 4);
        assert_eq!(stats.pending_followups, 1);
        assert_eq!(stats.total_converted, 2);
        // 2 convertidos / 4 entregues-ou-depois
        assert_eq!(stats.conversion_rate, 50);
        assert_eq!(stats.total_revenue, Decimal::new(90000, 2));
        assert_eq!(stats.realtor_count, 1);
        assert_eq!((stats.week_start, stats.week_end), (date(2024, 3, 4), date(2024, 3, 10)));
    }

    #[tokio::test]
    async fn empty_store_reports_zero_rate() {
        let store = Arc::new(MemoryStore::new());
        let service = DashboardService::new(store, lazy_repo());
        let stats = service.stats_for(date(2024, 3, 6)).await.unwrap();
        assert_eq!(stats.conversion_rate, 0);
        assert_eq!(stats.total_revenue, Decimal::ZERO);
    }
}
