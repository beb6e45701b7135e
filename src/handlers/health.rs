// src/handlers/health.rs

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCounts {
    pub drops: i64,
    pub realtors: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(value_type = String, example = "ok")]
    pub status: &'static str,
    #[schema(value_type = String, example = "box-drop-crm")]
    pub service: &'static str,
    #[schema(value_type = String, example = "connected")]
    pub database: &'static str,
    pub counts: HealthCounts,
    pub timestamp: DateTime<Utc>,
}

// GET /api/webhook/health (público)
#[utoipa::path(
    get,
    path = "/api/webhook/health",
    tag = "Health",
    responses((status = 200, description = "Processo no ar; estado do banco e contagens", body = HealthResponse))
)]
pub async fn health(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let pool = &app_state.db_pool;
    let counts = async {
        let drops = app_state.drop_repo.count(pool).await?;
        let realtors = app_state.realtor_repo.count(pool).await?;
        Ok::<_, crate::common::error::AppError>(HealthCounts { drops, realtors })
    }
    .await;

    let (database, counts) = match counts {
        Ok(counts) => ("connected", counts),
        Err(e) => {
            tracing::error!("❌ Health check sem banco: {:?}", e);
            ("error", HealthCounts { drops: 0, realtors: 0 })
        }
    };

    Json(HealthResponse {
        status: "ok",
        service: "box-drop-crm",
        database,
        counts,
        timestamp: Utc::now(),
    })
}
