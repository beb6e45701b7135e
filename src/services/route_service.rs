// src/services/route_service.rs
//
// Sequenciador de rotas: pede ao provedor externo a melhor ordem das paradas e,
// se ele não estiver disponível ou falhar, devolve a ordem original.
// Nunca falha para uma lista de paradas válida.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::{error::AppError, serde_utils::non_blank},
    models::routes::{OptimizeRouteRequest, RouteLeg, RouteMetrics, RoutePlan},
};

pub const METERS_PER_MILE: f64 = 1609.344;
pub const DWELL_MINUTES_PER_STOP: i64 = 5;

const FIELD_MASK: &str = "routes.duration,routes.distanceMeters,routes.polyline.encodedPolyline,\
routes.optimizedIntermediateWaypointIndex,routes.legs.distanceMeters,routes.legs.duration";

// --- Provedor ---

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("falha de transporte: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provedor respondeu {status}: {body}")]
    Status { status: u16, body: String },

    #[error("resposta inválida: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegEstimate {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Resultado bruto do provedor. `order[i]` é o índice original da i-ésima parada visitada.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedRoute {
    pub order: Vec<usize>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub legs: Vec<LegEstimate>,
    pub encoded_polyline: Option<String>,
}

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn optimize(&self, origin: &str, destination: &str, stops: &[String]) -> Result<OptimizedRoute, RoutingError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRoutesResponse {
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRoute {
    #[serde(default)]
    distance_meters: f64,
    duration: Option<String>,
    polyline: Option<ApiPolyline>,
    #[serde(default)]
    optimized_intermediate_waypoint_index: Vec<i64>,
    #[serde(default)]
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPolyline {
    encoded_polyline: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiLeg {
    #[serde(default)]
    distance_meters: f64,
    duration: Option<String>,
}

/// "1234s" -> 1234.0 (formato de Duration do protobuf).
fn parse_seconds(raw: Option<&str>) -> Result<f64, RoutingError> {
    let Some(raw) = raw else {
        return Ok(0.0);
    };
    raw.trim_end_matches('s')
        .parse::<f64>()
        .map_err(|_| RoutingError::InvalidResponse(format!("duração inválida '{raw}'")))
}

/// A ordem devolvida tem que ser uma permutação de 0..n.
fn validate_order(raw: &[i64], stop_count: usize) -> Result<Vec<usize>, RoutingError> {
    if raw.is_empty() {
        return Ok((0..stop_count).collect());
    }
    if raw.len() != stop_count {
        return Err(RoutingError::InvalidResponse(format!(
            "ordem com {} índices para {} paradas",
            raw.len(),
            stop_count
        )));
    }

    let mut seen = vec![false; stop_count];
    let mut order = Vec::with_capacity(stop_count);
    for &idx in raw {
        let valid = usize::try_from(idx).ok().filter(|&i| i < stop_count && !seen[i]);
        let Some(i) = valid else {
            return Err(RoutingError::InvalidResponse(format!("índice de parada inválido {idx}")));
        };
        seen[i] = true;
        order.push(i);
    }
    Ok(order)
}

/// Cliente da Google Routes API (computeRoutes com otimização de waypoints).
#[derive(Clone)]
pub struct GoogleRoutesClient {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl GoogleRoutesClient {
    pub fn new(api_key: String, url: String, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Falha ao criar o cliente HTTP: {}", e))?;
        Ok(Self { http, api_key, url })
    }
}

#[async_trait]
impl RoutingProvider for GoogleRoutesClient {
    async fn optimize(&self, origin: &str, destination: &str, stops: &[String]) -> Result<OptimizedRoute, RoutingError> {
        let intermediates: Vec<Value> = stops.iter().map(|s| json!({ "address": s })).collect();
        let body = json!({
            "origin": { "address": origin },
            "destination": { "address": destination },
            "intermediates": intermediates,
            "travelMode": "DRIVE",
            "optimizeWaypointOrder": true,
        });

        let response = self
            .http
            .post(&self.url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ComputeRoutesResponse = response.json().await?;
        let route = parsed
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::InvalidResponse("nenhuma rota retornada".into()))?;

        let legs = route
            .legs
            .iter()
            .map(|leg| {
                Ok(LegEstimate {
                    distance_meters: leg.distance_meters,
                    duration_seconds: parse_seconds(leg.duration.as_deref())?,
                })
            })
            .collect::<Result<Vec<_>, RoutingError>>()?;

        Ok(OptimizedRoute {
            order: validate_order(&route.optimized_intermediate_waypoint_index, stops.len())?,
            distance_meters: route.distance_meters,
            duration_seconds: parse_seconds(route.duration.as_deref())?,
            legs,
            encoded_polyline: route.polyline.and_then(|p| p.encoded_polyline),
        })
    }
}

// --- Deep links ---

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// https://www.google.com/maps/dir/início/parada1/.../fim/
pub fn directions_url(start: &str, stops: &[String], end: &str) -> String {
    let path: Vec<String> = std::iter::once(start)
        .chain(stops.iter().map(String::as_str))
        .chain(std::iter::once(end))
        .map(encode)
        .collect();
    format!("https://www.google.com/maps/dir/{}/", path.join("/"))
}

pub fn directions_api_url(start: &str, stops: &[String], end: &str) -> String {
    let waypoints: Vec<String> = stops.iter().map(|s| encode(s)).collect();
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={}&destination={}&waypoints={}",
        encode(start),
        encode(end),
        waypoints.join("|")
    )
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn meters_to_miles(meters: f64) -> f64 {
    round_one_decimal(meters / METERS_PER_MILE)
}

fn seconds_to_minutes(seconds: f64) -> i64 {
    (seconds / 60.0).round() as i64
}

/// Lê `addresses`: entradas vazias ou que não são texto são descartadas;
/// erro só se não sobrar nenhuma.
fn parse_addresses(raw: Option<&Value>) -> Result<Vec<String>, AppError> {
    let Some(Value::Array(items)) = raw else {
        return Err(AppError::BadRequest("addresses array is required".into()));
    };

    let stops: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if stops.is_empty() {
        return Err(AppError::BadRequest("addresses array is required".into()));
    }
    Ok(stops)
}

// --- Sequenciador ---

#[derive(Clone)]
pub struct RouteSequencer {
    provider: Option<Arc<dyn RoutingProvider>>,
    home_base: String,
}

impl RouteSequencer {
    pub fn new(provider: Option<Arc<dyn RoutingProvider>>, home_base: String) -> Self {
        Self { provider, home_base }
    }

    pub async fn plan(&self, request: OptimizeRouteRequest) -> Result<RoutePlan, AppError> {
        let stops = parse_addresses(request.addresses.as_ref())?;
        let start = non_blank(request.start_address)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| self.home_base.clone());
        let end = non_blank(request.end_address)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| start.clone());

        let Some(provider) = &self.provider else {
            tracing::debug!("Sem chave de mapas; rota na ordem original");
            return Ok(fallback(start, stops, end, "Add GOOGLE_MAPS_API_KEY env var to enable route optimization"));
        };

        if stops.len() < 2 {
            return Ok(fallback(start, stops, end, "Only one stop; optimization skipped"));
        }

        match provider.optimize(&start, &end, &stops).await {
            Ok(route) => Ok(optimized(start, stops, end, route)),
            Err(e) => {
                tracing::warn!("Otimização de rota falhou, usando a ordem original: {}", e);
                Ok(fallback(
                    start,
                    stops,
                    end,
                    "Route optimization unavailable; using original order",
                ))
            }
        }
    }
}

fn fallback(start: String, stops: Vec<String>, end: String, note: &str) -> RoutePlan {
    RoutePlan {
        success: true,
        optimized: false,
        maps_url: directions_url(&start, &stops, &end),
        maps_api_url: directions_api_url(&start, &stops, &end),
        stop_count: stops.len(),
        original_order: stops.clone(),
        stops,
        start_address: start,
        end_address: end,
        metrics: None,
        legs: Vec::new(),
        encoded_polyline: None,
        note: note.to_string(),
    }
}

fn optimized(start: String, original: Vec<String>, end: String, route: OptimizedRoute) -> RoutePlan {
    let stops: Vec<String> = route.order.iter().map(|&i| original[i].clone()).collect();

    let driving_minutes = seconds_to_minutes(route.duration_seconds);
    let stop_time_minutes = DWELL_MINUTES_PER_STOP * stops.len() as i64;
    let metrics = RouteMetrics {
        total_distance_miles: meters_to_miles(route.distance_meters),
        driving_minutes,
        stop_time_minutes,
        total_duration_minutes: driving_minutes + stop_time_minutes,
        stop_count: stops.len(),
    };
    let legs = route
        .legs
        .iter()
        .map(|leg| RouteLeg {
            distance_miles: meters_to_miles(leg.distance_meters),
            duration_minutes: seconds_to_minutes(leg.duration_seconds),
        })
        .collect();

    RoutePlan {
        success: true,
        optimized: true,
        maps_url: directions_url(&start, &stops, &end),
        maps_api_url: directions_api_url(&start, &stops, &end),
        stop_count: stops.len(),
        original_order: original,
        stops,
        start_address: start,
        end_address: end,
        metrics: Some(metrics),
        legs,
        encoded_polyline: route.encoded_polyline,
        note: "Route optimized with Google Routes API".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HOME: &str = "iHaul iMove, Colorado Springs, CO";

    struct FakeProvider {
        calls: AtomicUsize,
        result: Result<OptimizedRoute, String>,
    }

    impl FakeProvider {
        fn ok(route: OptimizedRoute) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Ok(route),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Err("connection refused".into()),
            })
        }
    }

    #[async_trait]
    impl RoutingProvider for FakeProvider {
        async fn optimize(&self, _o: &str, _d: &str, _s: &[String]) -> Result<OptimizedRoute, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(RoutingError::InvalidResponse)
        }
    }

    fn request(addresses: Value) -> OptimizeRouteRequest {
        OptimizeRouteRequest {
            addresses: Some(addresses),
            ..OptimizeRouteRequest::default()
        }
    }

    fn sequencer(provider: Option<Arc<FakeProvider>>) -> RouteSequencer {
        RouteSequencer::new(provider.map(|p| p as Arc<dyn RoutingProvider>), HOME.to_string())
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack.find(needle).unwrap_or_else(|| panic!("'{needle}' ausente em {haystack}"))
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back_to_input_order() {
        let provider = FakeProvider::unreachable();
        let plan = sequencer(Some(provider.clone()))
            .plan(request(json!(["A", "B"])))
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(plan.success);
        assert!(!plan.optimized);
        assert_eq!(plan.stops, vec!["A", "B"]);
        assert_eq!(plan.start_address, HOME);
        assert_eq!(plan.end_address, HOME);

        let home = encode(HOME);
        let url = &plan.maps_url;
        let first_home = position(url, &home);
        let a = position(url, "/A/");
        let b = position(url, "/B/");
        let last_home = url.rfind(&home).unwrap();
        assert!(first_home < a && a < b && b < last_home);
        assert!(url.ends_with('/'));
    }

    #[tokio::test]
    async fn single_stop_skips_a_reachable_provider() {
        let provider = FakeProvider::ok(OptimizedRoute {
            order: vec![0],
            distance_meters: 1000.0,
            duration_seconds: 60.0,
            legs: vec![],
            encoded_polyline: None,
        });
        let plan = sequencer(Some(provider.clone()))
            .plan(request(json!(["12 Elm St"])))
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(!plan.optimized);
        assert_eq!(plan.stops, vec!["12 Elm St"]);
    }

    #[tokio::test]
    async fn missing_key_still_builds_links() {
        let plan = sequencer(None)
            .plan(OptimizeRouteRequest {
                addresses: Some(json!(["A", "B"])),
                start_address: Some("Depot".into()),
                end_address: None,
            })
            .await
            .unwrap();

        assert!(!plan.optimized);
        assert_eq!(plan.end_address, "Depot");
        assert_eq!(
            plan.maps_api_url,
            "https://www.google.com/maps/dir/?api=1&origin=Depot&destination=Depot&waypoints=A|B"
        );
        assert!(plan.note.contains("GOOGLE_MAPS_API_KEY"));
    }

    #[tokio::test]
    async fn optimized_route_reorders_and_computes_metrics() {
        let provider = FakeProvider::ok(OptimizedRoute {
            order: vec![2, 0, 1],
            distance_meters: 37_657.0,
            duration_seconds: 2_710.0,
            legs: vec![
                LegEstimate { distance_meters: 1609.344, duration_seconds: 90.0 },
                LegEstimate { distance_meters: 3218.688, duration_seconds: 600.0 },
            ],
            encoded_polyline: Some("_p~iF~ps|U".into()),
        });
        let plan = sequencer(Some(provider))
            .plan(request(json!(["A", "B", "C"])))
            .await
            .unwrap();

        assert!(plan.optimized);
        assert_eq!(plan.stops, vec!["C", "A", "B"]);
        assert_eq!(plan.original_order, vec!["A", "B", "C"]);

        let metrics = plan.metrics.unwrap();
        // 37657 m = 23.399 mi
        assert_eq!(metrics.total_distance_miles, 23.4);
        assert_eq!(metrics.driving_minutes, 45);
        assert_eq!(metrics.stop_time_minutes, 15);
        assert_eq!(metrics.total_duration_minutes, 60);
        assert_eq!(metrics.stop_count, 3);

        assert_eq!(plan.legs[0], RouteLeg { distance_miles: 1.0, duration_minutes: 2 });
        assert_eq!(plan.legs[1], RouteLeg { distance_miles: 2.0, duration_minutes: 10 });
        assert_eq!(plan.encoded_polyline.as_deref(), Some("_p~iF~ps|U"));
    }

    #[tokio::test]
    async fn malformed_addresses_are_rejected() {
        let seq = sequencer(None);
        for bad in [json!("A"), json!([]), json!({"0": "A"}), json!([1, 2])] {
            assert!(matches!(seq.plan(request(bad)).await, Err(AppError::BadRequest(_))));
        }
        let missing = seq.plan(OptimizeRouteRequest::default()).await;
        assert!(matches!(missing, Err(AppError::BadRequest(ref m)) if m == "addresses array is required"));
    }

    #[tokio::test]
    async fn blank_and_non_text_entries_are_dropped() {
        let seq = sequencer(None);
        let plan = seq
            .plan(request(json!(["  12 Elm St ", "", null, 7, "   ", "9 Oak Ave"])))
            .await
            .unwrap();
        assert_eq!(plan.stops, vec!["12 Elm St", "9 Oak Ave"]);

        let nothing_left = seq.plan(request(json!(["", " ", null]))).await;
        assert!(matches!(nothing_left, Err(AppError::BadRequest(ref m)) if m == "addresses array is required"));
    }

    #[test]
    fn order_must_be_a_permutation() {
        assert_eq!(validate_order(&[1, 0], 2).unwrap(), vec![1, 0]);
        assert_eq!(validate_order(&[], 2).unwrap(), vec![0, 1]);
        assert!(validate_order(&[0, 0], 2).is_err());
        assert!(validate_order(&[0, 5], 2).is_err());
        assert!(validate_order(&[-1], 1).is_err());
        assert!(validate_order(&[0], 2).is_err());
    }

    #[test]
    fn durations_use_the_protobuf_suffix() {
        assert_eq!(parse_seconds(Some("1234s")).unwrap(), 1234.0);
        assert_eq!(parse_seconds(Some("12.5s")).unwrap(), 12.5);
        assert_eq!(parse_seconds(None).unwrap(), 0.0);
        assert!(parse_seconds(Some("soon")).is_err());
    }

    // --- Cliente HTTP contra um servidor falso ---

    fn client_for(server: &mockito::Server) -> GoogleRoutesClient {
        GoogleRoutesClient::new(
            "test-key".into(),
            format!("{}/directions/v2:computeRoutes", server.url()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn google_client_sends_the_key_and_parses_the_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/directions/v2:computeRoutes")
            .match_header("x-goog-api-key", "test-key")
            .match_header("x-goog-fieldmask", mockito::Matcher::Regex("optimizedIntermediateWaypointIndex".into()))
            .match_body(mockito::Matcher::PartialJson(json!({
                "travelMode": "DRIVE",
                "optimizeWaypointOrder": true,
                "intermediates": [{ "address": "A" }, { "address": "B" }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "routes": [{
                        "distanceMeters": 8046,
                        "duration": "900s",
                        "polyline": { "encodedPolyline": "abc" },
                        "optimizedIntermediateWaypointIndex": [1, 0],
                        "legs": [
                            { "distanceMeters": 4000, "duration": "400s" },
                            { "distanceMeters": 4046, "duration": "500s" }
                        ]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let stops = vec!["A".to_string(), "B".to_string()];
        let route = client_for(&server).optimize("Depot", "Depot", &stops).await.unwrap();

        mock.assert_async().await;
        assert_eq!(route.order, vec![1, 0]);
        assert_eq!(route.distance_meters, 8046.0);
        assert_eq!(route.duration_seconds, 900.0);
        assert_eq!(route.legs.len(), 2);
        assert_eq!(route.encoded_polyline.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn google_client_reports_upstream_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/directions/v2:computeRoutes")
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let stops = vec!["A".to_string(), "B".to_string()];
        let err = client_for(&server).optimize("Depot", "Depot", &stops).await.unwrap_err();
        assert!(matches!(err, RoutingError::Status { status: 403, .. }));

        // E o sequenciador degrada para a ordem original
        let sequencer = RouteSequencer::new(Some(Arc::new(client_for(&server))), HOME.to_string());
        let plan = sequencer.plan(request(json!(["A", "B"]))).await.unwrap();
        assert!(!plan.optimized);
        assert_eq!(plan.stops, vec!["A", "B"]);
    }
}
