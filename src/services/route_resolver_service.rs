//! Resolución perezosa de rutas
//!
//! Un trip nace sin geometría; la primera vez que el motor la necesita se
//! pide al provider (directions + map matching), se persiste sobre el trip
//! y de ahí en adelante se sirve del cache. Un registro de resoluciones
//! en vuelo por trip evita llamadas duplicadas al provider cuando dos
//! búsquedas concurrentes tocan el mismo trip.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::models::Trip;
use crate::repositories::TripStore;
use crate::services::routing_service::RoutingProvider;
use crate::utils::errors::AppError;
use crate::utils::geo::decode_points;

pub struct RouteResolverService {
    provider: Arc<dyn RoutingProvider>,
    trips: Arc<dyn TripStore>,
    in_flight: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl RouteResolverService {
    pub fn new(provider: Arc<dyn RoutingProvider>, trips: Arc<dyn TripStore>) -> Self {
        Self {
            provider,
            trips,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Devuelve el trip con su ruta resuelta. Cache hit: ninguna llamada
    /// externa, ninguna escritura. Cache miss: una llamada de directions,
    /// una de map matching y una escritura de persistencia.
    pub async fn resolve_route(&self, trip: &Trip) -> Result<Trip, AppError> {
        if trip.has_route() {
            return Ok(trip.clone());
        }

        let lock = self.lock_for(trip.id);
        let _guard = lock.lock().await;

        // Releer después de adquirir el lock: otra resolución concurrente
        // pudo haber completado mientras esperábamos.
        let current = self
            .trips
            .find_by_id(trip.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trip {} not found", trip.id)))?;

        if current.has_route() {
            self.release(trip.id);
            return Ok(current);
        }

        let result = self.fetch_and_persist(&current).await;
        self.release(trip.id);
        result
    }

    async fn fetch_and_persist(&self, trip: &Trip) -> Result<Trip, AppError> {
        log::info!(
            "🗺️ Resolviendo ruta de trip {}: {},{} → {},{}",
            trip.id,
            trip.pickup_lat,
            trip.pickup_lng,
            trip.drop_off_lat,
            trip.drop_off_lng
        );

        let route = self
            .provider
            .get_route(&[trip.pickup(), trip.drop_off()])
            .await
            .map_err(|e| AppError::RouteResolution(e.to_string()))?;

        let path = decode_points(&route.geometry)
            .map_err(|e| AppError::RouteResolution(format!("undecodable geometry: {}", e)))?;

        if path.is_empty() {
            return Err(AppError::RouteResolution("empty route geometry".to_string()));
        }

        let matched = self
            .provider
            .get_map_matched_route(&path)
            .await
            .map_err(|e| AppError::RouteResolution(e.to_string()))?;

        log::info!(
            "✅ Ruta de trip {} resuelta: {:.0}m, {:.0}s, confidence {:.2}",
            trip.id,
            matched.distance_m,
            matched.duration_s,
            matched.confidence
        );

        let updated = self
            .trips
            .set_route(trip.id, &matched.geometry, matched.distance_m, matched.duration_s)
            .await?;

        Ok(updated)
    }

    fn lock_for(&self, trip_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.in_flight.lock().expect("in_flight lock poisoned");
        map.entry(trip_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    // La entrada se borra al completar; los que ya esperan conservan su
    // clone del Arc y al despertar releen el trip y encuentran el cache.
    fn release(&self, trip_id: Uuid) {
        let mut map = self.in_flight.lock().expect("in_flight lock poisoned");
        map.remove(&trip_id);
    }
}
