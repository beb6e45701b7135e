// src/handlers/reference.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        automation::{AutomationPage, AutomationQuery},
        reference::{FollowUpTemplate, SupplyItem},
    },
};

// GET /api/supplies
#[utoipa::path(
    get,
    path = "/api/supplies",
    tag = "Reference",
    responses((status = 200, description = "Itens do kit", body = Vec<SupplyItem>)),
    security(("session" = []))
)]
pub async fn list_supplies(State(app_state): State<AppState>) -> Result<Json<Vec<SupplyItem>>, AppError> {
    Ok(Json(app_state.reference_service.supplies().await?))
}

// GET /api/templates
#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Reference",
    responses((status = 200, description = "Modelos de follow-up", body = Vec<FollowUpTemplate>)),
    security(("session" = []))
)]
pub async fn list_templates(State(app_state): State<AppState>) -> Result<Json<Vec<FollowUpTemplate>>, AppError> {
    Ok(Json(app_state.reference_service.templates().await?))
}

// GET /api/automation
#[utoipa::path(
    get,
    path = "/api/automation",
    tag = "Reference",
    params(
        ("limit" = Option<i64>, Query, description = "Padrão 50, máximo 200"),
        ("offset" = Option<i64>, Query, description = "Padrão 0"),
        ("classification" = Option<String>, Query, description = "Filtra pela classificação"),
        ("date_from" = Option<String>, Query, description = "YYYY-MM-DD, inclusivo"),
        ("date_to" = Option<String>, Query, description = "YYYY-MM-DD, inclusivo (dia inteiro)")
    ),
    responses((status = 200, description = "Página do log de automação", body = AutomationPage)),
    security(("session" = []))
)]
pub async fn automation_log(
    State(app_state): State<AppState>,
    Query(query): Query<AutomationQuery>,
) -> Result<Json<AutomationPage>, AppError> {
    Ok(Json(app_state.reference_service.automation_log(&query).await?))
}
