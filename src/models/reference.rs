// src/models/reference.rs
//
// Dados de referência: só leitura pela aplicação.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::serde_utils::optional_date;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SupplyItem {
    pub id: Uuid,
    #[schema(example = "Medium moving box")]
    pub name: String,
    #[schema(example = 10)]
    pub qty_per_kit: i32,
    #[schema(example = "1.85")]
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "template_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    EmailHomeowner,
    EmailRealtor,
    TextHomeowner,
    TextRealtor,
    Voicemail,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FollowUpTemplate {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    pub subject: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// --- Checklist semanal de suprimentos ---

#[derive(Debug, Deserialize)]
pub struct SupplyPlanQuery {
    #[serde(default, deserialize_with = "optional_date")]
    pub week_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyLine {
    #[serde(flatten)]
    pub item: SupplyItem,
    pub total_needed: i64,
    pub total_cost: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyPlan {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub drop_count: i64,
    pub items: Vec<SupplyLine>,
    pub total_cost: Decimal,
}
