//! Motor de matching
//!
//! Flujo de una búsqueda: resolver la ruta del trip → prefiltrar
//! candidatos baratos en SQL → filtro Haversine exacto → evaluar cada
//! candidato (ruta, overlap, desvío) por lotes con paralelismo acotado →
//! upsert del match propuesto sobre el par canónico → lista ordenada por
//! score. Los fallos de un candidato individual se loguean y excluyen a
//! ese candidato sin abortar la búsqueda.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use uuid::Uuid;

use crate::config::MatchingConfig;
use crate::dto::match_dto::{ExistingMatch, MatchResult};
use crate::dto::trip_dto::TripSummary;
use crate::models::{MatchStatus, Trip, TripMatch, TripStatus};
use crate::repositories::{CandidateFilter, MatchStore, TripStore, UserStore};
use crate::services::route_resolver_service::RouteResolverService;
use crate::services::scoring_service::{overlap_percentage, DeviationScorer};
use crate::utils::errors::AppError;
use crate::utils::geo::distance_meters;

pub struct MatchingService {
    trips: Arc<dyn TripStore>,
    matches: Arc<dyn MatchStore>,
    users: Arc<dyn UserStore>,
    resolver: Arc<RouteResolverService>,
    deviation: DeviationScorer,
    config: MatchingConfig,
}

impl MatchingService {
    pub fn new(
        trips: Arc<dyn TripStore>,
        matches: Arc<dyn MatchStore>,
        users: Arc<dyn UserStore>,
        resolver: Arc<RouteResolverService>,
        deviation: DeviationScorer,
        config: MatchingConfig,
    ) -> Self {
        Self {
            trips,
            matches,
            users,
            resolver,
            deviation,
            config,
        }
    }

    /// Busca, puntúa y persiste matches para un trip. La lista vuelve
    /// ordenada por score descendente (sort estable: empates conservan el
    /// orden de evaluación).
    pub async fn find_matches(&self, trip_id: Uuid) -> Result<Vec<MatchResult>, AppError> {
        let trip = self
            .trips
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        // Fallo aquí aborta toda la búsqueda (es el trip primario).
        let trip = self.resolver.resolve_route(&trip).await?;

        let candidates = self.find_candidates(&trip).await?;
        log::info!(
            "🔍 Trip {}: {} candidatos tras el prefiltro",
            trip.id,
            candidates.len()
        );

        let mut results: Vec<MatchResult> = Vec::new();
        let batch_size = self.config.candidate_concurrency.max(1);

        for chunk in candidates.chunks(batch_size) {
            let evaluations: Vec<_> = chunk
                .iter()
                .map(|candidate| self.evaluate_candidate(&trip, candidate))
                .collect();

            for outcome in join_all(evaluations).await {
                if let Some(result) = outcome {
                    results.push(result);
                }
            }
        }

        results.sort_by(|a, b| {
            b.match_percentage
                .partial_cmp(&a.match_percentage)
                .unwrap_or(Ordering::Equal)
        });

        log::info!("✅ Trip {}: {} matches encontrados", trip.id, results.len());
        Ok(results)
    }

    /// Prefiltro: predicados baratos en SQL, después el filtro Haversine
    /// exacto pickup-a-pickup.
    async fn find_candidates(&self, trip: &Trip) -> Result<Vec<Trip>, AppError> {
        let window = Duration::minutes(self.config.time_window_minutes);
        let degrees = self.config.proximity_threshold_degrees();

        let filter = CandidateFilter {
            exclude_trip_id: trip.id,
            departure_from: trip.departure_time - window,
            departure_to: trip.departure_time + window,
            min_seats_offered: trip.seats_required,
            max_seats_required: trip.seats_offered,
            pickup_lat_min: trip.pickup_lat - degrees,
            pickup_lat_max: trip.pickup_lat + degrees,
            pickup_lng_min: trip.pickup_lng - degrees,
            pickup_lng_max: trip.pickup_lng + degrees,
        };

        let coarse = self.trips.find_candidates(&filter).await?;

        Ok(coarse
            .into_iter()
            .filter(|candidate| {
                distance_meters(
                    trip.pickup_lat,
                    trip.pickup_lng,
                    candidate.pickup_lat,
                    candidate.pickup_lng,
                ) <= self.config.proximity_threshold_m
            })
            .collect())
    }

    /// Un fallo de routing en un candidato lo excluye sin abortar el lote.
    async fn evaluate_candidate(&self, trip: &Trip, candidate: &Trip) -> Option<MatchResult> {
        match self.try_evaluate(trip, candidate).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("⚠️ Candidato {} excluido: {}", candidate.id, e);
                None
            }
        }
    }

    async fn try_evaluate(
        &self,
        trip: &Trip,
        candidate: &Trip,
    ) -> Result<Option<MatchResult>, AppError> {
        let candidate = self.resolver.resolve_route(candidate).await?;

        let overlap = overlap_percentage(
            trip.polyline.as_deref().unwrap_or(""),
            candidate.polyline.as_deref().unwrap_or(""),
            self.config.point_match_threshold_m,
        );

        if overlap < self.config.min_overlap_pct {
            log::debug!(
                "🚫 Candidato {} descartado: overlap {:.1}%",
                candidate.id,
                overlap
            );
            return Ok(None);
        }

        let deviation = self.deviation.deviation(trip, &candidate).await?;

        if deviation.deviation_percentage > self.config.max_deviation_pct {
            log::debug!(
                "🚫 Candidato {} descartado: desvío {:.1}%",
                candidate.id,
                deviation.deviation_percentage
            );
            return Ok(None);
        }

        let score = self.config.overlap_weight * overlap
            + self.config.deviation_weight * (100.0 - deviation.deviation_percentage);

        self.matches
            .upsert_proposed(trip.id, candidate.id, score)
            .await?;

        let route_length = trip.route_length_m.unwrap_or(0.0);
        let route_duration = trip.route_duration_s.unwrap_or(0.0);

        Ok(Some(MatchResult {
            matching_trip_id: candidate.id,
            match_percentage: round2(score),
            overlap_percentage: round2(overlap),
            additional_distance_meters: (deviation.combined_distance_m - route_length).round(),
            additional_time_seconds: (deviation.combined_duration_s - route_duration).round(),
            trip: self.trip_summary(&candidate).await,
        }))
    }

    /// Matches persistidos (proposed o accepted) que involucran al trip,
    /// cada uno resuelto al "otro trip", ordenados por score descendente.
    pub async fn get_existing_matches(&self, trip_id: Uuid) -> Result<Vec<ExistingMatch>, AppError> {
        self.trips
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        let rows = self.matches.find_active_involving(trip_id).await?;
        let mut results = Vec::with_capacity(rows.len());

        for row in rows {
            let other_id = row.other_trip_id(trip_id);
            let Some(other) = self.trips.find_by_id(other_id).await? else {
                log::warn!("⚠️ Match {} apunta a un trip inexistente {}", row.id, other_id);
                continue;
            };

            results.push(ExistingMatch {
                match_id: row.id,
                matching_trip_id: other_id,
                match_percentage: round2(row.match_score),
                status: row.status,
                trip: self.trip_summary(&other).await,
            });
        }

        Ok(results)
    }

    /// Transiciona un match a accepted/rejected. Aceptar fuerza ambos
    /// trips a `matched`.
    ///
    /// Nada impide que un trip acumule más de un match aceptado: el
    /// consumo de asientos entre matches aceptados no se trackea
    /// (decisión de producto pendiente).
    pub async fn update_match_status(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<TripMatch, AppError> {
        if status == MatchStatus::Proposed {
            return Err(AppError::BadRequest(
                "Status must be either 'accepted' or 'rejected'".to_string(),
            ));
        }

        let row = self
            .matches
            .find_by_id(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Match not found".to_string()))?;

        let updated = self.matches.set_status(match_id, status).await?;

        if status == MatchStatus::Accepted {
            self.trips.set_status(row.trip_a_id, TripStatus::Matched).await?;
            self.trips.set_status(row.trip_b_id, TripStatus::Matched).await?;
            log::info!(
                "🤝 Match {} aceptado: trips {} y {} pasan a matched",
                match_id,
                row.trip_a_id,
                row.trip_b_id
            );
        }

        Ok(updated)
    }

    async fn trip_summary(&self, trip: &Trip) -> TripSummary {
        let driver_name = match self.users.find_by_id(trip.driver_id).await {
            Ok(Some(user)) => user.full_name,
            Ok(None) => "Unknown driver".to_string(),
            Err(e) => {
                log::warn!("⚠️ No se pudo cargar el driver {}: {}", trip.driver_id, e);
                "Unknown driver".to_string()
            }
        };

        TripSummary::from_trip(trip, driver_name)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round2;
    use crate::config::MatchingConfig;
    use crate::models::{MatchStatus, TripStatus};
    use crate::repositories::MatchStore;
    use crate::services::test_support::{make_trip, make_user, EngineHarness};
    use crate::utils::errors::AppError;
    use crate::utils::geo::canonical_pair;
    use chrono::{Duration, Utc};

    #[test]
    fn test_round2() {
        assert_eq!(round2(87.654321), 87.65);
        assert_eq!(round2(99.999), 100.0);
        assert_eq!(round2(0.005), 0.01);
    }

    // Dos trips casi idénticos: pickups a ~44m, misma salida, rutas
    // superpuestas por completo.
    #[tokio::test]
    async fn test_near_identical_trips_match_with_high_score() {
        let h = EngineHarness::new(MatchingConfig::default());
        let departure = Utc::now();
        let trip_a = make_trip((40.0, -74.0), (40.09, -74.0), departure);
        let trip_b = make_trip((40.0004, -74.0), (40.0904, -74.0), departure);
        h.users.insert(make_user(trip_b.driver_id, "Ana Torres"));
        h.trips.insert(trip_a.clone());
        h.trips.insert(trip_b.clone());

        let results = h.matching.find_matches(trip_a.id).await.unwrap();

        assert_eq!(results.len(), 1);
        let found = &results[0];
        assert_eq!(found.matching_trip_id, trip_b.id);
        assert!(found.match_percentage > 99.0, "score = {}", found.match_percentage);
        assert_eq!(found.overlap_percentage, 100.0);
        assert_eq!(found.trip.driver_name, "Ana Torres");

        let rows = h.matches.all();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, MatchStatus::Proposed);
        let (first, second) = canonical_pair(trip_a.id, trip_b.id);
        assert_eq!((rows[0].trip_a_id, rows[0].trip_b_id), (first, second));
    }

    // El prefiltro descarta sin llamar al provider: pickup lejano,
    // salida fuera de ventana, y la esquina de la caja que la distancia
    // exacta rechaza (~220m > 175m).
    #[tokio::test]
    async fn test_prefilter_excludes_far_and_off_window_candidates() {
        let h = EngineHarness::new(MatchingConfig::default());
        let departure = Utc::now();
        let trip = make_trip((40.0, -74.0), (40.09, -74.0), departure);
        let far = make_trip((68.0, 20.0), (68.09, 20.0), departure);
        let late = make_trip(
            (40.0004, -74.0),
            (40.0904, -74.0),
            departure + Duration::hours(2),
        );
        let corner = make_trip((40.00157, -74.00157), (40.0904, -74.0), departure);
        h.trips.insert(trip.clone());
        h.trips.insert(far);
        h.trips.insert(late);
        h.trips.insert(corner);

        let results = h.matching.find_matches(trip.id).await.unwrap();

        assert!(results.is_empty());
        assert!(h.matches.all().is_empty());
        // solo la resolución del trip primario tocó el provider
        assert_eq!(h.routing.directions_count(), 1);
        assert_eq!(h.routing.matching_count(), 1);
    }

    // Candidato de ruta completa vs candidato de media ruta: la lista
    // vuelve ordenada por score descendente.
    #[tokio::test]
    async fn test_results_ranked_by_score_descending() {
        let h = EngineHarness::new(MatchingConfig::default());
        let departure = Utc::now();
        let trip = make_trip((40.0, -74.0), (40.09, -74.0), departure);
        let full = make_trip((40.0004, -74.0), (40.0904, -74.0), departure);
        let half = make_trip((40.0004, -74.0), (40.0454, -74.0), departure);
        h.trips.insert(trip.clone());
        h.trips.insert(full.clone());
        h.trips.insert(half.clone());

        let results = h.matching.find_matches(trip.id).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].matching_trip_id, full.id);
        assert_eq!(results[1].matching_trip_id, half.id);
        assert!(results[0].match_percentage > results[1].match_percentage);
        assert_eq!(h.matches.all().len(), 2);
    }

    // Repetir la búsqueda no duplica filas y reusa las rutas cacheadas:
    // la segunda pasada solo paga la llamada de desvío.
    #[tokio::test]
    async fn test_repeated_search_is_idempotent() {
        let h = EngineHarness::new(MatchingConfig::default());
        let departure = Utc::now();
        let trip = make_trip((40.0, -74.0), (40.09, -74.0), departure);
        let other = make_trip((40.0004, -74.0), (40.0904, -74.0), departure);
        h.trips.insert(trip.clone());
        h.trips.insert(other.clone());

        let first = h.matching.find_matches(trip.id).await.unwrap();
        assert_eq!(h.routing.directions_count(), 3);
        assert_eq!(h.routing.matching_count(), 2);

        let second = h.matching.find_matches(trip.id).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].match_percentage, second[0].match_percentage);
        assert_eq!(h.matches.all().len(), 1);
        assert_eq!(h.routing.directions_count(), 4);
        assert_eq!(h.routing.matching_count(), 2);
    }

    #[tokio::test]
    async fn test_find_matches_unknown_trip_is_not_found() {
        let h = EngineHarness::new(MatchingConfig::default());
        let err = h.matching.find_matches(uuid::Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    // Aceptar un match fuerza ambos trips a matched.
    #[tokio::test]
    async fn test_accepting_match_marks_both_trips_matched() {
        let h = EngineHarness::new(MatchingConfig::default());
        let departure = Utc::now();
        let trip_a = make_trip((40.0, -74.0), (40.09, -74.0), departure);
        let trip_b = make_trip((40.0004, -74.0), (40.0904, -74.0), departure);
        h.trips.insert(trip_a.clone());
        h.trips.insert(trip_b.clone());

        let results = h.matching.find_matches(trip_a.id).await.unwrap();
        let row_id = h.matches.all()[0].id;
        assert_eq!(results.len(), 1);

        let updated = h
            .matching
            .update_match_status(row_id, MatchStatus::Accepted)
            .await
            .unwrap();

        assert_eq!(updated.status, MatchStatus::Accepted);
        assert_eq!(h.trips.get(trip_a.id).unwrap().status, TripStatus::Matched);
        assert_eq!(h.trips.get(trip_b.id).unwrap().status, TripStatus::Matched);
    }

    #[tokio::test]
    async fn test_match_status_cannot_revert_to_proposed() {
        let h = EngineHarness::new(MatchingConfig::default());
        let err = h
            .matching
            .update_match_status(uuid::Uuid::new_v4(), MatchStatus::Proposed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    // Un match persistido cuyo otro trip ya no existe se omite del
    // listado en lugar de romperlo.
    #[tokio::test]
    async fn test_existing_matches_skip_dangling_trips() {
        let h = EngineHarness::new(MatchingConfig::default());
        let departure = Utc::now();
        let trip_a = make_trip((40.0, -74.0), (40.09, -74.0), departure);
        let trip_b = make_trip((40.0004, -74.0), (40.0904, -74.0), departure);
        h.trips.insert(trip_a.clone());
        h.trips.insert(trip_b.clone());

        h.matching.find_matches(trip_a.id).await.unwrap();
        let ghost_id = uuid::Uuid::new_v4();
        h.matches.upsert_proposed(trip_a.id, ghost_id, 55.0).await.unwrap();

        let existing = h.matching.get_existing_matches(trip_a.id).await.unwrap();

        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].matching_trip_id, trip_b.id);
        assert_eq!(existing[0].status, MatchStatus::Proposed);
    }
}
