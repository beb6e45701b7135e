// src/models/automation.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::serde_utils::optional_date;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AutomationEvent {
    pub id: Uuid,
    #[schema(example = "reply_received")]
    pub event_type: String,
    pub email: Option<String>,
    #[schema(example = "interested")]
    pub classification: Option<String>,
    pub details: Option<String>,
    pub action_taken: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ClassificationCount {
    pub classification: Option<String>,
    pub count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct AutomationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub classification: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub date_to: Option<NaiveDate>,
}

impl AutomationQuery {
    /// (limit, offset) já normalizados.
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AutomationPage {
    pub events: Vec<AutomationEvent>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub stats: Vec<ClassificationCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(AutomationQuery::default().page(), (50, 0));

        let big = AutomationQuery { limit: Some(5000), offset: Some(-3), ..Default::default() };
        assert_eq!(big.page(), (200, 0));

        let zero = AutomationQuery { limit: Some(0), offset: Some(40), ..Default::default() };
        assert_eq!(zero.page(), (1, 40));
    }
}
