// src/services/maps_service.rs
//
// Proxy das chamadas que precisam da chave de mapas. A chave fica no servidor.

use std::time::Duration;

use serde::Deserialize;

use crate::{
    common::error::AppError,
    models::routes::{AddressPrediction, AutocompleteResponse, StaticMapRequest},
};

/// Endereço completo da base, usado para geocodificar marcadores.
pub const HOME_BASE_GEOCODE: &str = "3110 Boychuk Ave #470g, Colorado Springs, CO 80910";

const PATH_STYLE: &str = "color:0x1e3a5f|weight:4";
const END_MARKER_COLOR: &str = "0xC5A059";

#[derive(Debug, Deserialize)]
struct AutocompleteApiResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<AddressPrediction>,
    error_message: Option<String>,
}

/// Endereços que citam a base do iHaul em Colorado Springs viram o endereço completo.
pub fn geocoding_address(address: &str) -> &str {
    let lower = address.to_lowercase();
    if lower.contains("ihaul") && lower.contains("colorado springs") {
        HOME_BASE_GEOCODE
    } else {
        address
    }
}

// A URL leva a chave na query string: o texto do erro não pode carregá-la
fn upstream_error(e: reqwest::Error) -> AppError {
    AppError::UpstreamError(e.without_url().to_string())
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[derive(Clone)]
pub struct MapsProxy {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    home_base: String,
}

impl MapsProxy {
    pub fn new(api_key: Option<String>, base_url: String, home_base: String, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Falha ao criar o cliente HTTP: {}", e))?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            home_base,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn key(&self) -> Result<&str, AppError> {
        self.api_key.as_deref().ok_or(AppError::MapsUnavailable)
    }

    /// Sugestões de endereços nos EUA.
    pub async fn autocomplete(&self, input: &str) -> Result<AutocompleteResponse, AppError> {
        let key = self.key()?;
        let input = input.trim();
        if input.is_empty() {
            return Ok(AutocompleteResponse { predictions: Vec::new() });
        }

        let url = format!(
            "{}/maps/api/place/autocomplete/json?input={}&types=address&components=country:us&key={}",
            self.base_url,
            encode(input),
            encode(key)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(upstream_error)?;
        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!("autocomplete HTTP {}", response.status())));
        }

        let parsed: AutocompleteApiResponse = response
            .json()
            .await
            .map_err(upstream_error)?;

        match parsed.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(AutocompleteResponse {
                predictions: parsed.predictions,
            }),
            other => Err(AppError::UpstreamError(format!(
                "autocomplete {}: {}",
                other,
                parsed.error_message.unwrap_or_default()
            ))),
        }
    }

    /// Monta a URL do Static Maps. Exige a chave.
    pub fn static_map_url(&self, request: &StaticMapRequest) -> Result<String, AppError> {
        let key = self.key()?;
        if request.stops.is_empty() {
            return Err(AppError::BadRequest("stops array is required".into()));
        }

        let start = request
            .start_address
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(self.home_base.as_str());
        let end = request
            .end_address
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(start);
        let start_geo = geocoding_address(start);
        let end_geo = geocoding_address(end);

        let mut params = vec![
            "size=640x400".to_string(),
            "scale=2".to_string(),
            "maptype=roadmap".to_string(),
            format!("markers=color:green|label:S|{}", encode(start_geo)),
        ];
        for (index, stop) in request.stops.iter().enumerate() {
            let color = if request.current_stop_index == Some(index) { "blue" } else { "red" };
            params.push(format!("markers=color:{}|label:{}|{}", color, index + 1, encode(stop)));
        }
        if end != start {
            params.push(format!("markers=color:{}|label:E|{}", END_MARKER_COLOR, encode(end_geo)));
        }

        match request.encoded_polyline.as_deref().filter(|p| !p.is_empty()) {
            Some(polyline) => params.push(format!("path={}|enc:{}", PATH_STYLE, encode(polyline))),
            None => {
                let points: Vec<String> = std::iter::once(start_geo)
                    .chain(request.stops.iter().map(String::as_str))
                    .chain(std::iter::once(end_geo))
                    .map(encode)
                    .collect();
                params.push(format!("path={}|{}", PATH_STYLE, points.join("|")));
            }
        }
        params.push(format!("key={}", encode(key)));

        Ok(format!("{}/maps/api/staticmap?{}", self.base_url, params.join("&")))
    }

    /// PNG renderizado da rota.
    pub async fn static_map(&self, request: &StaticMapRequest) -> Result<Vec<u8>, AppError> {
        let url = self.static_map_url(request)?;

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(upstream_error)?;
        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!("static map HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(upstream_error)?;
        Ok(bytes.to_vec())
    }
}
