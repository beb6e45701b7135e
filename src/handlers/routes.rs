// src/handlers/routes.rs

use axum::{extract::State, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    models::routes::{OptimizeRouteRequest, RoutePlan},
};

// POST /api/routes/optimize
#[utoipa::path(
    post,
    path = "/api/routes/optimize",
    tag = "Routes",
    request_body = OptimizeRouteRequest,
    responses(
        (status = 200, description = "Rota otimizada ou na ordem original", body = RoutePlan),
        (status = 400, description = "Lista de endereços ausente ou inválida")
    ),
    security(("session" = []))
)]
pub async fn optimize_route(
    State(app_state): State<AppState>,
    Json(request): Json<OptimizeRouteRequest>,
) -> Result<Json<RoutePlan>, AppError> {
    Ok(Json(app_state.route_sequencer.plan(request).await?))
}
