// src/handlers/drops.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::Session,
    models::drops::{
        AutoDropPayload, AutoDropResult, BoxDrop, BoxDropDetail, CreateDropPayload, CreateDropQuery, DropFilter,
        DropPatch, PendingFollowups, WeeklyQuery,
    },
};

// GET /api/drops
#[utoipa::path(
    get,
    path = "/api/drops",
    tag = "Drops",
    params(
        ("status" = Option<String>, Query, description = "Filtra pelo status"),
        ("realtor_id" = Option<Uuid>, Query, description = "Filtra pelo corretor"),
        ("needs_followup" = Option<bool>, Query, description = "Entregues sem os dois e-mails de follow-up")
    ),
    responses(
        (status = 200, description = "Drops, mais recentes primeiro", body = Vec<BoxDropDetail>)
    ),
    security(("session" = []))
)]
pub async fn list_drops(
    State(app_state): State<AppState>,
    Query(filter): Query<DropFilter>,
) -> Result<Json<Vec<BoxDropDetail>>, AppError> {
    let drops = app_state.drop_service.list(&filter).await?;
    Ok(Json(drops))
}

// POST /api/drops
#[utoipa::path(
    post,
    path = "/api/drops",
    tag = "Drops",
    request_body = CreateDropPayload,
    params(
        ("allow_duplicate" = Option<bool>, Query, description = "Cria mesmo se o endereço já tiver um drop")
    ),
    responses(
        (status = 201, description = "Drop criado", body = BoxDrop),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Endereço duplicado")
    ),
    security(("session" = []))
)]
pub async fn create_drop(
    State(app_state): State<AppState>,
    Query(query): Query<CreateDropQuery>,
    Json(payload): Json<CreateDropPayload>,
) -> Result<impl IntoResponse, AppError> {
    let drop = app_state.drop_service.create(payload, query.allow_duplicate).await?;
    Ok((StatusCode::CREATED, Json(drop)))
}

// GET /api/drops/{id}
#[utoipa::path(
    get,
    path = "/api/drops/{id}",
    tag = "Drops",
    params(("id" = Uuid, Path, description = "ID do drop")),
    responses(
        (status = 200, description = "Drop com os dados do corretor", body = BoxDropDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("session" = []))
)]
pub async fn get_drop(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoxDropDetail>, AppError> {
    Ok(Json(app_state.drop_service.get(id).await?))
}

// PATCH /api/drops/{id}
#[utoipa::path(
    patch,
    path = "/api/drops/{id}",
    tag = "Drops",
    params(("id" = Uuid, Path, description = "ID do drop")),
    request_body = DropPatch,
    responses(
        (status = 200, description = "Drop atualizado", body = BoxDrop),
        (status = 400, description = "Nenhum campo permitido no corpo"),
        (status = 404, description = "Não encontrado")
    ),
    security(("session" = []))
)]
pub async fn update_drop(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<DropPatch>,
) -> Result<Json<BoxDrop>, AppError> {
    Ok(Json(app_state.drop_service.update(id, patch).await?))
}

// DELETE /api/drops/{id}
#[utoipa::path(
    delete,
    path = "/api/drops/{id}",
    tag = "Drops",
    params(("id" = Uuid, Path, description = "ID do drop")),
    responses(
        (status = 200, description = "Drop removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("session" = []))
)]
pub async fn delete_drop(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.drop_service.delete(id).await?;
    Ok(Json(json!({ "success": true })))
}

// POST /api/drops/{id}/advance
#[utoipa::path(
    post,
    path = "/api/drops/{id}/advance",
    tag = "Drops",
    params(("id" = Uuid, Path, description = "ID do drop")),
    responses(
        (status = 200, description = "Drop no próximo status", body = BoxDrop),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Status terminal")
    ),
    security(("session" = []))
)]
pub async fn advance_drop(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoxDrop>, AppError> {
    Ok(Json(app_state.drop_service.advance(id).await?))
}

// POST /api/drops/auto
#[utoipa::path(
    post,
    path = "/api/drops/auto",
    tag = "Drops",
    request_body = AutoDropPayload,
    responses(
        (status = 201, description = "Corretor encontrado/criado e drop criado", body = AutoDropResult),
        (status = 400, description = "Sem e-mail nem nome do corretor")
    ),
    security(("session" = []))
)]
pub async fn auto_drop(
    State(app_state): State<AppState>,
    Session(claims): Session,
    Json(payload): Json<AutoDropPayload>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!("Entrada automática de drop (sessão {})", claims.sub);
    let result = app_state.drop_service.auto_intake(payload).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

// GET /api/drops/weekly
#[utoipa::path(
    get,
    path = "/api/drops/weekly",
    tag = "Drops",
    params(
        ("start" = String, Query, description = "Início (YYYY-MM-DD, inclusivo)"),
        ("end" = String, Query, description = "Fim (YYYY-MM-DD, inclusivo)")
    ),
    responses(
        (status = 200, description = "Drops da janela pela data agendada/solicitada", body = Vec<BoxDropDetail>),
        (status = 400, description = "Datas ausentes ou invertidas")
    ),
    security(("session" = []))
)]
pub async fn weekly_drops(
    State(app_state): State<AppState>,
    Query(query): Query<WeeklyQuery>,
) -> Result<Json<Vec<BoxDropDetail>>, AppError> {
    Ok(Json(app_state.drop_service.weekly(&query).await?))
}

// GET /api/drops/pending-followups
#[utoipa::path(
    get,
    path = "/api/drops/pending-followups",
    tag = "Drops",
    responses(
        (status = 200, description = "Entregues com algum follow-up pendente", body = PendingFollowups)
    ),
    security(("session" = []))
)]
pub async fn pending_followups(State(app_state): State<AppState>) -> Result<Json<PendingFollowups>, AppError> {
    Ok(Json(app_state.drop_service.pending_followups().await?))
}
