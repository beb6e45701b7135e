// src/db/reference_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::reference::{FollowUpTemplate, SupplyItem},
};

#[derive(Clone)]
pub struct ReferenceRepository {
    pool: PgPool,
}

impl ReferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list_supplies<'e, E>(&self, executor: E) -> Result<Vec<SupplyItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SupplyItem>(
            "SELECT id, name, qty_per_kit, unit_cost FROM supply_items ORDER BY position ASC, name ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_templates<'e, E>(&self, executor: E) -> Result<Vec<FollowUpTemplate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let templates = sqlx::query_as::<_, FollowUpTemplate>(
            "SELECT id, name, type, subject, body, created_at FROM follow_up_templates ORDER BY name ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(templates)
    }
}
