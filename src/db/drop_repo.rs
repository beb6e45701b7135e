// src/db/drop_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        dashboard::DashboardCounts,
        drops::{BoxDrop, BoxDropDetail, DropFilter, NewBoxDrop, UpdatePlan},
    },
};

// SELECT base com o LEFT JOIN no corretor
const DETAIL_SELECT: &str = r#"
    SELECT bd.*,
           r.first_name AS realtor_first_name,
           r.last_name  AS realtor_last_name,
           r.email      AS realtor_email,
           r.phone      AS realtor_phone,
           r.company    AS realtor_company
    FROM box_drops bd
    LEFT JOIN realtors r ON bd.realtor_id = r.id
"#;

#[derive(Clone)]
pub struct DropRepository {
    pool: PgPool,
}

impl DropRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list<'e, E>(&self, executor: E, filter: &DropFilter) -> Result<Vec<BoxDropDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
        qb.push(" WHERE 1=1");

        if let Some(status) = filter.status {
            qb.push(" AND bd.status = ").push_bind(status);
        }
        if let Some(realtor_id) = filter.realtor_id {
            qb.push(" AND bd.realtor_id = ").push_bind(realtor_id);
        }
        if filter.needs_followup {
            qb.push(
                " AND bd.status = 'delivered' \
                  AND (NOT bd.followup_email_homeowner OR NOT bd.followup_email_realtor)",
            );
        }
        qb.push(" ORDER BY bd.created_at DESC");

        let drops = qb.build_query_as::<BoxDropDetail>().fetch_all(executor).await?;
        Ok(drops)
    }

    pub async fn find_detail<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<BoxDropDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{DETAIL_SELECT} WHERE bd.id = $1");
        let drop = sqlx::query_as::<_, BoxDropDetail>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(drop)
    }

    pub async fn list_for_realtor<'e, E>(&self, executor: E, realtor_id: Uuid) -> Result<Vec<BoxDrop>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let drops = sqlx::query_as::<_, BoxDrop>(
            "SELECT * FROM box_drops WHERE realtor_id = $1 ORDER BY created_at DESC",
        )
        .bind(realtor_id)
        .fetch_all(executor)
        .await?;
        Ok(drops)
    }

    /// Busca exata (case-sensitive), incluindo cancelados. Retorna o mais antigo.
    pub async fn find_by_address<'e, E>(&self, executor: E, address: &str) -> Result<Option<BoxDrop>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let drop = sqlx::query_as::<_, BoxDrop>(
            "SELECT * FROM box_drops WHERE homeowner_address = $1 ORDER BY address_seq ASC LIMIT 1",
        )
        .bind(address)
        .fetch_optional(executor)
        .await?;
        Ok(drop)
    }

    /// Drops cuja data de agrupamento cai em [start, end].
    pub async fn between<'e, E>(
        &self,
        executor: E,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BoxDropDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{DETAIL_SELECT} \
             WHERE COALESCE(bd.scheduled_date, bd.requested_date) BETWEEN $1 AND $2 \
             ORDER BY COALESCE(bd.scheduled_date, bd.requested_date) ASC, bd.created_at ASC"
        );
        let drops = sqlx::query_as::<_, BoxDropDetail>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?;
        Ok(drops)
    }

    pub async fn pending_followups<'e, E>(&self, executor: E) -> Result<Vec<BoxDropDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{DETAIL_SELECT} \
             WHERE bd.status = 'delivered' \
               AND (NOT bd.followup_email_homeowner \
                    OR NOT bd.followup_email_realtor \
                    OR NOT bd.followup_text_homeowner \
                    OR NOT bd.followup_call_homeowner) \
             ORDER BY bd.delivered_date ASC NULLS LAST"
        );
        let drops = sqlx::query_as::<_, BoxDropDetail>(&sql).fetch_all(executor).await?;
        Ok(drops)
    }

    /// Todas as contagens do painel em uma única consulta (mesmo snapshot).
    pub async fn dashboard_counts<'e, E>(
        &self,
        executor: E,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<DashboardCounts, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status <> 'cancelled') AS total_active,
                COUNT(*) FILTER (
                    WHERE status <> 'cancelled'
                      AND COALESCE(scheduled_date, requested_date) BETWEEN $1 AND $2
                ) AS this_week,
                COUNT(*) FILTER (
                    WHERE status = 'delivered'
                      AND (NOT followup_email_homeowner OR NOT followup_email_realtor)
                ) AS pending_followups,
                COUNT(*) FILTER (WHERE status = 'converted') AS converted,
                COUNT(*) FILTER (WHERE status IN ('delivered', 'followed_up', 'converted')) AS delivered_or_later,
                (SELECT COUNT(*) FROM realtors) AS realtor_count,
                COALESCE(SUM(revenue) FILTER (WHERE booked), 0) AS total_revenue
            FROM box_drops
            "#,
        )
        .bind(week_start)
        .bind(week_end)
        .fetch_one(executor)
        .await?;

        Ok(counts)
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM box_drops")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    /// Trava as sequências do endereço até o fim da transação. Com a trava,
    /// o `MAX(address_seq) + 1` de inserts concorrentes não se repete.
    pub async fn lock_address<'e, E>(&self, executor: E, address: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(address)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// `guarded = true` ocupa a sequência 0 do endereço; se ela já existir,
    /// o índice único dispara e devolvemos `UniqueConstraintViolation`.
    /// Sem guarda, pega a próxima sequência livre.
    pub async fn insert<'e, E>(&self, executor: E, drop: &NewBoxDrop, guarded: bool) -> Result<BoxDrop, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, BoxDrop>(
            r#"
            INSERT INTO box_drops (
                realtor_id, homeowner_address, address_seq,
                homeowner_name, homeowner_email, homeowner_phone,
                listing_status, campaign_source, status, scheduled_date, notes
            )
            VALUES (
                $1, $2,
                CASE WHEN $3 THEN 0
                     ELSE (SELECT COALESCE(MAX(address_seq) + 1, 0) FROM box_drops WHERE homeowner_address = $2)
                END,
                $4, $5, $6, $7, $8, $9, $10, $11
            )
            RETURNING *
            "#,
        )
        .bind(drop.realtor_id)
        .bind(&drop.homeowner_address)
        .bind(guarded)
        .bind(&drop.homeowner_name)
        .bind(&drop.homeowner_email)
        .bind(&drop.homeowner_phone)
        .bind(drop.listing_status)
        .bind(&drop.campaign_source)
        .bind(drop.status)
        .bind(drop.scheduled_date)
        .bind(&drop.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, &drop.homeowner_address))?;

        Ok(created)
    }

    /// Aplica só os campos presentes no patch (mais updated_at).
    pub async fn apply_update<'e, E>(&self, executor: E, id: Uuid, plan: &UpdatePlan) -> Result<Option<BoxDrop>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let patch = &plan.patch;
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE box_drops SET updated_at = NOW()");

        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(address) = &patch.homeowner_address {
            // Novo endereço entra no fim da fila de sequências dele
            qb.push(", homeowner_address = ").push_bind(address.clone());
            qb.push(", address_seq = (SELECT COALESCE(MAX(address_seq) + 1, 0) FROM box_drops WHERE homeowner_address = ")
                .push_bind(address.clone())
                .push(")");
        }
        if let Some(v) = &patch.homeowner_name {
            qb.push(", homeowner_name = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.homeowner_email {
            qb.push(", homeowner_email = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.homeowner_phone {
            qb.push(", homeowner_phone = ").push_bind(v.clone());
        }
        if let Some(v) = patch.listing_status {
            qb.push(", listing_status = ").push_bind(v);
        }
        if let Some(v) = &patch.campaign_source {
            qb.push(", campaign_source = ").push_bind(v.clone());
        }
        if let Some(v) = patch.scheduled_date {
            qb.push(", scheduled_date = ").push_bind(v);
        }
        if let Some(v) = patch.delivered_date {
            qb.push(", delivered_date = ").push_bind(v);
        }
        if let Some(v) = &patch.delivery_notes {
            qb.push(", delivery_notes = ").push_bind(v.clone());
        }
        if let Some(v) = patch.followup_email_homeowner {
            qb.push(", followup_email_homeowner = ").push_bind(v);
        }
        if let Some(v) = patch.followup_email_realtor {
            qb.push(", followup_email_realtor = ").push_bind(v);
        }
        if let Some(v) = patch.followup_text_homeowner {
            qb.push(", followup_text_homeowner = ").push_bind(v);
        }
        if let Some(v) = patch.followup_call_homeowner {
            qb.push(", followup_call_homeowner = ").push_bind(v);
        }
        if let Some(v) = patch.quote_requested {
            qb.push(", quote_requested = ").push_bind(v);
        }
        if let Some(v) = patch.booked {
            qb.push(", booked = ").push_bind(v);
        }
        if let Some(v) = patch.revenue {
            qb.push(", revenue = ").push_bind(v);
        }
        if let Some(v) = &patch.notes {
            qb.push(", notes = ").push_bind(v.clone());
        }
        if let Some(v) = patch.realtor_id {
            qb.push(", realtor_id = ").push_bind(v);
        }
        if let Some(today) = plan.stamp_delivered {
            qb.push(", delivered_date = COALESCE(delivered_date, ")
                .push_bind(today)
                .push(")");
        }

        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let address = patch.homeowner_address.clone().unwrap_or_default();
        let updated = qb
            .build_query_as::<BoxDrop>()
            .fetch_optional(executor)
            .await
            .map_err(|e| map_write_error(e, &address))?;

        Ok(updated)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM box_drops WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// Converte erros de constraint em algo que os serviços entendem
fn map_write_error(e: sqlx::Error, address: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(format!("Endereço '{}' já cadastrado.", address));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::BadRequest("unknown_realtor".into());
        }
    }
    e.into()
}
