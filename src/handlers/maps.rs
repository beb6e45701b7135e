// src/handlers/maps.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::routes::{AutocompleteQuery, AutocompleteResponse, MapsConfigResponse, StaticMapRequest},
};

// GET /api/config/maps-key
#[utoipa::path(
    get,
    path = "/api/config/maps-key",
    tag = "Maps",
    responses((status = 200, description = "Se a integração de mapas está ativa", body = MapsConfigResponse)),
    security(("session" = []))
)]
pub async fn maps_config(State(app_state): State<AppState>) -> Json<MapsConfigResponse> {
    Json(MapsConfigResponse {
        configured: app_state.maps_proxy.is_configured(),
    })
}

// GET /api/maps/autocomplete
#[utoipa::path(
    get,
    path = "/api/maps/autocomplete",
    tag = "Maps",
    params(("input" = String, Query, description = "Texto digitado")),
    responses(
        (status = 200, description = "Sugestões de endereço", body = AutocompleteResponse),
        (status = 502, description = "Falha no provedor"),
        (status = 503, description = "Mapas não configurados")
    ),
    security(("session" = []))
)]
pub async fn autocomplete(
    State(app_state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> Result<Json<AutocompleteResponse>, AppError> {
    let input = query.input.unwrap_or_default();
    Ok(Json(app_state.maps_proxy.autocomplete(&input).await?))
}

// POST /api/maps/static
#[utoipa::path(
    post,
    path = "/api/maps/static",
    tag = "Maps",
    request_body = StaticMapRequest,
    responses(
        (status = 200, description = "PNG da rota", content_type = "image/png"),
        (status = 400, description = "Sem paradas"),
        (status = 502, description = "Falha no provedor"),
        (status = 503, description = "Mapas não configurados")
    ),
    security(("session" = []))
)]
pub async fn static_map(
    State(app_state): State<AppState>,
    Json(request): Json<StaticMapRequest>,
) -> Result<impl IntoResponse, AppError> {
    let png = app_state.maps_proxy.static_map(&request).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
