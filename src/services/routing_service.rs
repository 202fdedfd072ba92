//! Cliente del routing provider (Mapbox)
//!
//! Este módulo maneja la comunicación con las APIs de Directions y
//! Map Matching de Mapbox. El trait `RoutingProvider` es el seam que
//! permite inyectar un provider falso en los tests del motor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::models::Coordinates;
use crate::utils::errors::AppError;

/// Ruta punto-a-punto devuelta por el provider
#[derive(Debug, Clone)]
pub struct RouteSummary {
    pub distance_m: f64,
    pub duration_s: f64,
    /// Geometría codificada polyline6
    pub geometry: String,
}

/// Ruta ajustada a la red vial por map matching
#[derive(Debug, Clone)]
pub struct MapMatchedRoute {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: String,
    pub confidence: f64,
}

/// Seam del routing provider externo. Ningún método reintenta
/// internamente; la política de retry no pertenece al motor.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Ruta por la cadena ordenada de waypoints.
    async fn get_route(&self, waypoints: &[Coordinates]) -> Result<RouteSummary, AppError>;

    /// Geometría ajustada a la red vial para la secuencia de puntos.
    async fn get_map_matched_route(
        &self,
        points: &[Coordinates],
    ) -> Result<MapMatchedRoute, AppError>;
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    distance: f64,
    duration: f64,
    geometry: String,
}

#[derive(Debug, Deserialize)]
struct MatchingResponse {
    matchings: Vec<Matching>,
}

#[derive(Debug, Deserialize)]
struct Matching {
    distance: f64,
    duration: f64,
    geometry: String,
    confidence: f64,
}

pub struct MapboxRoutingService {
    mapbox_token: String,
    client: Client,
    profile: String,
}

impl MapboxRoutingService {
    pub fn new(mapbox_token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            mapbox_token,
            client,
            profile: "driving-traffic".to_string(),
        }
    }

    /// Mapbox espera los waypoints como `lng,lat;lng,lat;...`
    fn coordinates_path(points: &[Coordinates]) -> String {
        points
            .iter()
            .map(|p| format!("{},{}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";")
    }

    async fn get_json(&self, url: &str) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", "RideshareMatching/1.0")
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Mapbox request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Mapbox response read failed: {}", e)))?;

        log::debug!("📡 Mapbox response status: {}", status);

        if !status.is_success() {
            return Err(AppError::ExternalApi(format!(
                "Mapbox API error {}: {}",
                status, response_text
            )));
        }

        Ok(response_text)
    }
}

#[async_trait]
impl RoutingProvider for MapboxRoutingService {
    async fn get_route(&self, waypoints: &[Coordinates]) -> Result<RouteSummary, AppError> {
        if waypoints.len() < 2 {
            return Err(AppError::BadRequest(
                "A route needs at least two waypoints".to_string(),
            ));
        }

        log::info!("🗺️ Pidiendo directions para {} waypoints", waypoints.len());

        let url = format!(
            "https://api.mapbox.com/directions/v5/mapbox/{}/{}?alternatives=false&geometries=polyline6&overview=full&access_token={}",
            self.profile,
            Self::coordinates_path(waypoints),
            self.mapbox_token
        );

        let body = self.get_json(&url).await?;
        let parsed: DirectionsResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::ExternalApi(format!("Error parsing directions response: {}", e)))?;

        let route = parsed
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ExternalApi("Mapbox returned no routes".to_string()))?;

        log::info!("✅ Directions: {:.0}m, {:.0}s", route.distance, route.duration);

        Ok(RouteSummary {
            distance_m: route.distance,
            duration_s: route.duration,
            geometry: route.geometry,
        })
    }

    async fn get_map_matched_route(
        &self,
        points: &[Coordinates],
    ) -> Result<MapMatchedRoute, AppError> {
        if points.len() < 2 {
            return Err(AppError::BadRequest(
                "Map matching needs at least two points".to_string(),
            ));
        }

        log::info!("🧲 Map-matching de {} puntos", points.len());

        let url = format!(
            "https://api.mapbox.com/matching/v5/mapbox/{}/{}?geometries=polyline6&overview=full&access_token={}",
            self.profile,
            Self::coordinates_path(points),
            self.mapbox_token
        );

        let body = self.get_json(&url).await?;
        let parsed: MatchingResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::ExternalApi(format!("Error parsing matching response: {}", e)))?;

        let matching = parsed
            .matchings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ExternalApi("Mapbox returned no matchings".to_string()))?;

        log::info!(
            "✅ Map-matched: {:.0}m, confidence {:.2}",
            matching.distance,
            matching.confidence
        );

        Ok(MapMatchedRoute {
            distance_m: matching.distance,
            duration_s: matching.duration,
            geometry: matching.geometry,
            confidence: matching.confidence,
        })
    }
}
