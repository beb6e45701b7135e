// src/router.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::session_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/webhook/health", get(handlers::health::health));

    let drop_routes = Router::new()
        .route("/", get(handlers::drops::list_drops).post(handlers::drops::create_drop))
        .route("/auto", post(handlers::drops::auto_drop))
        .route("/weekly", get(handlers::drops::weekly_drops))
        .route("/pending-followups", get(handlers::drops::pending_followups))
        .route(
            "/{id}",
            get(handlers::drops::get_drop)
                .patch(handlers::drops::update_drop)
                .delete(handlers::drops::delete_drop),
        )
        .route("/{id}/advance", post(handlers::drops::advance_drop));

    let realtor_routes = Router::new()
        .route("/", get(handlers::realtors::list_realtors).post(handlers::realtors::create_realtor))
        .route(
            "/{id}",
            get(handlers::realtors::get_realtor).patch(handlers::realtors::update_realtor),
        );

    // Tudo aqui exige a sessão (cookie ou Bearer)
    let protected_routes = Router::new()
        .nest("/drops", drop_routes)
        .nest("/realtors", realtor_routes)
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/supplies", get(handlers::reference::list_supplies))
        .route("/supplies/plan", get(handlers::dashboard::get_supply_plan))
        .route("/templates", get(handlers::reference::list_templates))
        .route("/automation", get(handlers::reference::automation_log))
        .route("/routes/optimize", post(handlers::routes::optimize_route))
        .route("/config/maps-key", get(handlers::maps::maps_config))
        .route("/maps/autocomplete", get(handlers::maps::autocomplete))
        .route("/maps/static", post(handlers::maps::static_map))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), session_guard));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
