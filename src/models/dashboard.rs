// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Contagens brutas vindas do banco (uma única consulta)
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct DashboardCounts {
    pub total_active: i64,
    pub this_week: i64,
    pub pending_followups: i64,
    pub converted: i64,
    pub delivered_or_later: i64,
    pub realtor_count: i64,
    pub total_revenue: Decimal,
}

// Os cards do topo do painel
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_drops: i64,
    pub this_week: i64,
    pub pending_followups: i64,
    #[schema(example = 25)]
    pub conversion_rate: i64,
    pub total_converted: i64,
    pub total_revenue: Decimal,
    pub realtor_count: i64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}
