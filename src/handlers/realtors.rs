// src/handlers/realtors.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::realtors::{CreateRealtorPayload, Realtor, RealtorPatch, RealtorWithDrops},
};

// GET /api/realtors
#[utoipa::path(
    get,
    path = "/api/realtors",
    tag = "Realtors",
    responses(
        (status = 200, description = "Corretores por primeiro nome", body = Vec<Realtor>)
    ),
    security(("session" = []))
)]
pub async fn list_realtors(State(app_state): State<AppState>) -> Result<Json<Vec<Realtor>>, AppError> {
    Ok(Json(app_state.realtor_service.list().await?))
}

// POST /api/realtors
#[utoipa::path(
    post,
    path = "/api/realtors",
    tag = "Realtors",
    request_body = CreateRealtorPayload,
    responses(
        (status = 201, description = "Corretor criado", body = Realtor),
        (status = 400, description = "Dados inválidos")
    ),
    security(("session" = []))
)]
pub async fn create_realtor(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateRealtorPayload>,
) -> Result<impl IntoResponse, AppError> {
    let realtor = app_state.realtor_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(realtor)))
}

// GET /api/realtors/{id}
#[utoipa::path(
    get,
    path = "/api/realtors/{id}",
    tag = "Realtors",
    params(("id" = Uuid, Path, description = "ID do corretor")),
    responses(
        (status = 200, description = "Corretor com seus drops", body = RealtorWithDrops),
        (status = 404, description = "Não encontrado")
    ),
    security(("session" = []))
)]
pub async fn get_realtor(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RealtorWithDrops>, AppError> {
    Ok(Json(app_state.realtor_service.get(id).await?))
}

// PATCH /api/realtors/{id}
#[utoipa::path(
    patch,
    path = "/api/realtors/{id}",
    tag = "Realtors",
    params(("id" = Uuid, Path, description = "ID do corretor")),
    request_body = RealtorPatch,
    responses(
        (status = 200, description = "Corretor atualizado", body = Realtor),
        (status = 400, description = "Nenhum campo permitido no corpo"),
        (status = 404, description = "Não encontrado")
    ),
    security(("session" = []))
)]
pub async fn update_realtor(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<RealtorPatch>,
) -> Result<Json<Realtor>, AppError> {
    Ok(Json(app_state.realtor_service.update(id, patch).await?))
}
