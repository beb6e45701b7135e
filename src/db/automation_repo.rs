// src/db/automation_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::automation::{AutomationEvent, AutomationQuery, ClassificationCount},
};

#[derive(Clone)]
pub struct AutomationRepository {
    pool: PgPool,
}

// Os mesmos filtros valem para a página e para o total
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &AutomationQuery) {
    qb.push(" WHERE 1=1");
    if let Some(classification) = query.classification.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND classification = ").push_bind(classification.to_string());
    }
    if let Some(from) = query.date_from {
        qb.push(" AND created_at::date >= ").push_bind(from);
    }
    if let Some(to) = query.date_to {
        // date_to é inclusivo: o dia inteiro entra
        qb.push(" AND created_at::date <= ").push_bind(to);
    }
}

impl AutomationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn page<'e, E>(&self, executor: E, query: &AutomationQuery) -> Result<Vec<AutomationEvent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (limit, offset) = query.page();

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, event_type, email, classification, details, action_taken, created_at FROM automation_log",
        );
        push_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let events = qb.build_query_as::<AutomationEvent>().fetch_all(executor).await?;
        Ok(events)
    }

    pub async fn count<'e, E>(&self, executor: E, query: &AutomationQuery) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM automation_log");
        push_filters(&mut qb, query);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }

    /// Quebra por classificação sobre o log inteiro (ignora os filtros).
    pub async fn classification_stats<'e, E>(&self, executor: E) -> Result<Vec<ClassificationCount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stats = sqlx::query_as::<_, ClassificationCount>(
            r#"
            SELECT classification, COUNT(*) AS count
            FROM automation_log
            GROUP BY classification
            ORDER BY count DESC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(stats)
    }
}
