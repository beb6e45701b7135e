// src/models/routes.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Corpo do POST /routes/optimize. `addresses` chega como `Value` para
/// respondermos 400 (e não 422) quando não for um array.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRouteRequest {
    #[serde(default)]
    #[schema(value_type = Vec<String>, example = json!(["12 Elm St, Colorado Springs, CO", "88 Oak Ave, Colorado Springs, CO"]))]
    pub addresses: Option<Value>,
    pub start_address: Option<String>,
    pub end_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    #[schema(example = 23.4)]
    pub total_distance_miles: f64,
    pub driving_minutes: i64,
    pub stop_time_minutes: i64,
    pub total_duration_minutes: i64,
    pub stop_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub distance_miles: f64,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub success: bool,
    pub optimized: bool,
    /// Paradas na ordem de visita (otimizada ou a original).
    pub stops: Vec<String>,
    pub original_order: Vec<String>,
    pub start_address: String,
    pub end_address: String,
    pub stop_count: usize,
    pub maps_url: String,
    pub maps_api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RouteMetrics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legs: Vec<RouteLeg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_polyline: Option<String>,
    pub note: String,
}

// --- Proxy de mapas ---

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    pub input: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressPrediction {
    pub description: String,
    pub place_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AutocompleteResponse {
    pub predictions: Vec<AddressPrediction>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaticMapRequest {
    #[serde(default)]
    pub stops: Vec<String>,
    pub start_address: Option<String>,
    pub end_address: Option<String>,
    pub encoded_polyline: Option<String>,
    pub current_stop_index: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MapsConfigResponse {
    /// A chave nunca sai do servidor; o cliente só sabe se o proxy está ativo.
    pub configured: bool,
}
