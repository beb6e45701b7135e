// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        dashboard::DashboardStats,
        reference::{SupplyPlan, SupplyPlanQuery},
    },
};

// GET /api/stats
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Cards do painel para a semana corrente", body = DashboardStats)
    ),
    security(("session" = []))
)]
pub async fn get_stats(State(app_state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(app_state.dashboard_service.stats().await?))
}

// GET /api/supplies/plan
#[utoipa::path(
    get,
    path = "/api/supplies/plan",
    tag = "Dashboard",
    params(
        ("week_of" = Option<String>, Query, description = "Qualquer dia da semana desejada (YYYY-MM-DD); padrão hoje")
    ),
    responses(
        (status = 200, description = "Checklist de suprimentos da semana", body = SupplyPlan)
    ),
    security(("session" = []))
)]
pub async fn get_supply_plan(
    State(app_state): State<AppState>,
    Query(query): Query<SupplyPlanQuery>,
) -> Result<Json<SupplyPlan>, AppError> {
    Ok(Json(app_state.dashboard_service.supply_plan(query.week_of).await?))
}
