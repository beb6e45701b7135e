// src/docs.rs

use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,

        // --- Drops ---
        handlers::drops::list_drops,
        handlers::drops::create_drop,
        handlers::drops::get_drop,
        handlers::drops::update_drop,
        handlers::drops::delete_drop,
        handlers::drops::advance_drop,
        handlers::drops::auto_drop,
        handlers::drops::weekly_drops,
        handlers::drops::pending_followups,

        // --- Realtors ---
        handlers::realtors::list_realtors,
        handlers::realtors::create_realtor,
        handlers::realtors::get_realtor,
        handlers::realtors::update_realtor,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::get_supply_plan,

        // --- Reference ---
        handlers::reference::list_supplies,
        handlers::reference::list_templates,
        handlers::reference::automation_log,

        // --- Routes / Maps ---
        handlers::routes::optimize_route,
        handlers::maps::maps_config,
        handlers::maps::autocomplete,
        handlers::maps::static_map,

        // --- Health ---
        handlers::health::health,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::LoginPayload,
            models::auth::LoginResponse,

            // --- Drops ---
            models::drops::DropStatus,
            models::drops::ListingStatus,
            models::drops::BoxDrop,
            models::drops::BoxDropDetail,
            models::drops::ExistingDrop,
            models::drops::CreateDropPayload,
            models::drops::DropPatch,
            models::drops::PendingFollowups,
            models::drops::AutoDropPayload,
            models::drops::AutoDropResult,

            // --- Realtors ---
            models::realtors::Realtor,
            models::realtors::RealtorWithDrops,
            models::realtors::CreateRealtorPayload,
            models::realtors::RealtorPatch,

            // --- Dashboard / Reference ---
            models::dashboard::DashboardStats,
            models::reference::SupplyItem,
            models::reference::SupplyLine,
            models::reference::SupplyPlan,
            models::reference::TemplateType,
            models::reference::FollowUpTemplate,
            models::automation::AutomationEvent,
            models::automation::ClassificationCount,
            models::automation::AutomationPage,

            // --- Routes / Maps ---
            models::routes::OptimizeRouteRequest,
            models::routes::RouteMetrics,
            models::routes::RouteLeg,
            models::routes::RoutePlan,
            models::routes::AddressPrediction,
            models::routes::AutocompleteResponse,
            models::routes::StaticMapRequest,
            models::routes::MapsConfigResponse,

            // --- Health ---
            handlers::health::HealthCounts,
            handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Senha compartilhada e cookie de sessão"),
        (name = "Drops", description = "Ciclo de vida dos box drops"),
        (name = "Realtors", description = "Corretores parceiros"),
        (name = "Dashboard", description = "Indicadores da semana e checklist de suprimentos"),
        (name = "Reference", description = "Suprimentos, modelos e log de automação"),
        (name = "Routes", description = "Sequenciamento da rota de entrega"),
        (name = "Maps", description = "Proxy das chamadas de mapas"),
        (name = "Health", description = "Liveness do serviço")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        // Navegador: cookie; processo de automação: Bearer com o mesmo token
        components.add_security_scheme(
            "session",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("box-drop-auth"))),
        );
        components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
