// src/db/realtor_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::realtors::{CreateRealtorPayload, Realtor, RealtorIntake, RealtorPatch},
};

#[derive(Clone)]
pub struct RealtorRepository {
    pool: PgPool,
}

impl RealtorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Realtor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let realtors = sqlx::query_as::<_, Realtor>(
            "SELECT * FROM realtors ORDER BY first_name ASC, last_name ASC NULLS FIRST",
        )
        .fetch_all(executor)
        .await?;
        Ok(realtors)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Realtor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let realtor = sqlx::query_as::<_, Realtor>("SELECT * FROM realtors WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(realtor)
    }

    /// Comparação sem diferenciar maiúsculas (e-mails de webhook chegam de todo jeito).
    pub async fn find_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<Realtor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let realtor = sqlx::query_as::<_, Realtor>(
            "SELECT * FROM realtors WHERE LOWER(email) = LOWER($1) ORDER BY created_at ASC LIMIT 1",
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;
        Ok(realtor)
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &CreateRealtorPayload) -> Result<Realtor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let realtor = sqlx::query_as::<_, Realtor>(
            r#"
            INSERT INTO realtors (first_name, last_name, email, phone, company)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.company)
        .fetch_one(executor)
        .await?;
        Ok(realtor)
    }

    pub async fn insert_intake<'e, E>(&self, executor: E, intake: &RealtorIntake) -> Result<Realtor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let realtor = sqlx::query_as::<_, Realtor>(
            r#"
            INSERT INTO realtors (first_name, last_name, email, phone, company)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&intake.first_name)
        .bind(&intake.last_name)
        .bind(&intake.email)
        .bind(&intake.phone)
        .bind(&intake.company)
        .fetch_one(executor)
        .await?;
        Ok(realtor)
    }

    /// Preenche sobrenome/telefone/empresa só onde ainda estão vazios.
    pub async fn fill_missing_contact<'e, E>(&self, executor: E, id: Uuid, intake: &RealtorIntake) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE realtors
            SET last_name = COALESCE(last_name, $2),
                phone = COALESCE(phone, $3),
                company = COALESCE(company, $4),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&intake.last_name)
        .bind(&intake.phone)
        .bind(&intake.company)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, patch: &RealtorPatch) -> Result<Option<Realtor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE realtors SET updated_at = NOW()");

        if let Some(v) = &patch.first_name {
            qb.push(", first_name = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.last_name {
            qb.push(", last_name = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.email {
            qb.push(", email = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.phone {
            qb.push(", phone = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.company {
            qb.push(", company = ").push_bind(v.clone());
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let realtor = qb.build_query_as::<Realtor>().fetch_optional(executor).await?;
        Ok(realtor)
    }

    // --- Contadores (sempre chamados dentro da transação do drop) ---

    pub async fn increment_drops<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE realtors SET total_drops = total_drops + 1, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn increment_conversions<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE realtors SET total_conversions = total_conversions + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM realtors")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
