//! Dobles en memoria para los tests del motor de matching
//!
//! Implementan los seams de persistencia, routing y notificaciones sin
//! base de datos ni red. El provider de routing sintetiza rutas en línea
//! recta: distancia Haversine acumulada, velocidad fija de 10 m/s.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo_types::LineString;
use uuid::Uuid;

use crate::config::MatchingConfig;
use crate::models::{Coordinates, MatchStatus, Trip, TripMatch, TripStatus, User};
use crate::repositories::{CandidateFilter, MatchStore, TripStore, UserStore};
use crate::services::matching_service::MatchingService;
use crate::services::notification_service::{NotificationReason, NotificationSink};
use crate::services::rematch_service::RematchService;
use crate::services::route_resolver_service::RouteResolverService;
use crate::services::routing_service::{MapMatchedRoute, RouteSummary, RoutingProvider};
use crate::services::scoring_service::DeviationScorer;
use crate::utils::errors::AppError;
use crate::utils::geo::{canonical_pair, distance_meters, POLYLINE_PRECISION};

pub fn encode_path(points: &[Coordinates]) -> String {
    let line: LineString<f64> = points.iter().map(|p| (p.lng, p.lat)).collect();
    polyline::encode_coordinates(line, POLYLINE_PRECISION).unwrap()
}

pub fn path_distance(points: &[Coordinates]) -> f64 {
    points
        .windows(2)
        .map(|pair| distance_meters(pair[0].lat, pair[0].lng, pair[1].lat, pair[1].lng))
        .sum()
}

pub fn make_trip(
    pickup: (f64, f64),
    drop_off: (f64, f64),
    departure_time: DateTime<Utc>,
) -> Trip {
    let now = Utc::now();
    Trip {
        id: Uuid::new_v4(),
        driver_id: Uuid::new_v4(),
        pickup_lat: pickup.0,
        pickup_lng: pickup.1,
        drop_off_lat: drop_off.0,
        drop_off_lng: drop_off.1,
        departure_time,
        seats_offered: 3,
        seats_required: 1,
        status: TripStatus::Pending,
        polyline: None,
        route_length_m: None,
        route_duration_s: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn make_user(id: Uuid, full_name: &str) -> User {
    let now = Utc::now();
    User {
        id,
        full_name: full_name.to_string(),
        email: None,
        phone_number: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct InMemoryTripStore {
    trips: Mutex<HashMap<Uuid, Trip>>,
}

impl InMemoryTripStore {
    pub fn insert(&self, trip: Trip) {
        self.trips.lock().unwrap().insert(trip.id, trip);
    }

    pub fn get(&self, id: Uuid) -> Option<Trip> {
        self.trips.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, AppError> {
        Ok(self.trips.lock().unwrap().get(&id).cloned())
    }

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Trip>, AppError> {
        let trips = self.trips.lock().unwrap();
        Ok(trips
            .values()
            .filter(|t| {
                t.id != filter.exclude_trip_id
                    && t.status == TripStatus::Pending
                    && t.departure_time >= filter.departure_from
                    && t.departure_time <= filter.departure_to
                    && t.seats_offered >= filter.min_seats_offered
                    && t.seats_required <= filter.max_seats_required
                    && t.pickup_lat >= filter.pickup_lat_min
                    && t.pickup_lat <= filter.pickup_lat_max
                    && t.pickup_lng >= filter.pickup_lng_min
                    && t.pickup_lng <= filter.pickup_lng_max
            })
            .cloned()
            .collect())
    }

    async fn set_route(
        &self,
        id: Uuid,
        polyline: &str,
        length_m: f64,
        duration_s: f64,
    ) -> Result<Trip, AppError> {
        let mut trips = self.trips.lock().unwrap();
        let trip = trips
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;
        trip.polyline = Some(polyline.to_string());
        trip.route_length_m = Some(length_m);
        trip.route_duration_s = Some(duration_s);
        trip.updated_at = Utc::now();
        Ok(trip.clone())
    }

    async fn set_status(&self, id: Uuid, status: TripStatus) -> Result<Trip, AppError> {
        let mut trips = self.trips.lock().unwrap();
        let trip = trips
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;
        trip.status = status;
        trip.updated_at = Utc::now();
        Ok(trip.clone())
    }
}

#[derive(Default)]
pub struct InMemoryMatchStore {
    rows: Mutex<HashMap<Uuid, TripMatch>>,
}

impl InMemoryMatchStore {
    pub fn insert(&self, row: TripMatch) {
        self.rows.lock().unwrap().insert(row.id, row);
    }

    pub fn all(&self) -> Vec<TripMatch> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn upsert_proposed(
        &self,
        trip_a: Uuid,
        trip_b: Uuid,
        score: f64,
    ) -> Result<TripMatch, AppError> {
        let (first, second) = canonical_pair(trip_a, trip_b);
        let mut rows = self.rows.lock().unwrap();

        if let Some(existing) = rows
            .values_mut()
            .find(|r| r.trip_a_id == first && r.trip_b_id == second)
        {
            existing.match_score = score;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let row = TripMatch {
            id: Uuid::new_v4(),
            trip_a_id: first,
            trip_b_id: second,
            match_score: score,
            status: MatchStatus::Proposed,
            created_at: now,
            updated_at: now,
        };
        rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TripMatch>, AppError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn set_status(&self, id: Uuid, status: MatchStatus) -> Result<TripMatch, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Match not found".to_string()))?;
        row.status = status;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn find_accepted_involving(&self, trip_id: Uuid) -> Result<Vec<TripMatch>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                (r.trip_a_id == trip_id || r.trip_b_id == trip_id)
                    && r.status == MatchStatus::Accepted
            })
            .cloned()
            .collect())
    }

    async fn find_active_involving(&self, trip_id: Uuid) -> Result<Vec<TripMatch>, AppError> {
        let mut rows: Vec<TripMatch> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                (r.trip_a_id == trip_id || r.trip_b_id == trip_id)
                    && r.status != MatchStatus::Rejected
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows)
    }

    async fn delete_involving(&self, trip_id: Uuid) -> Result<u64, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, r| r.trip_a_id != trip_id && r.trip_b_id != trip_id);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}

/// Provider falso: la ruta entre waypoints es la línea recta que los une.
#[derive(Default)]
pub struct StraightLineRouting {
    pub directions_calls: AtomicUsize,
    pub matching_calls: AtomicUsize,
}

impl StraightLineRouting {
    pub fn directions_count(&self) -> usize {
        self.directions_calls.load(Ordering::SeqCst)
    }

    pub fn matching_count(&self) -> usize {
        self.matching_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingProvider for StraightLineRouting {
    async fn get_route(&self, waypoints: &[Coordinates]) -> Result<RouteSummary, AppError> {
        self.directions_calls.fetch_add(1, Ordering::SeqCst);
        let distance_m = path_distance(waypoints);
        Ok(RouteSummary {
            distance_m,
            duration_s: distance_m / 10.0,
            geometry: encode_path(waypoints),
        })
    }

    async fn get_map_matched_route(
        &self,
        points: &[Coordinates],
    ) -> Result<MapMatchedRoute, AppError> {
        self.matching_calls.fetch_add(1, Ordering::SeqCst);
        let distance_m = path_distance(points);
        Ok(MapMatchedRoute {
            distance_m,
            duration_s: distance_m / 10.0,
            geometry: encode_path(points),
            confidence: 0.95,
        })
    }
}

#[derive(Default)]
pub struct RecordingNotificationSink {
    events: Mutex<Vec<(Uuid, NotificationReason)>>,
}

impl RecordingNotificationSink {
    pub fn events(&self) -> Vec<(Uuid, NotificationReason)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(&self, trip_id: Uuid, reason: NotificationReason) {
        self.events.lock().unwrap().push((trip_id, reason));
    }
}

/// El motor completo cableado sobre dobles en memoria.
pub struct EngineHarness {
    pub trips: Arc<InMemoryTripStore>,
    pub matches: Arc<InMemoryMatchStore>,
    pub users: Arc<InMemoryUserStore>,
    pub routing: Arc<StraightLineRouting>,
    pub notifier: Arc<RecordingNotificationSink>,
    pub matching: Arc<MatchingService>,
    pub rematch: RematchService,
}

impl EngineHarness {
    pub fn new(config: MatchingConfig) -> Self {
        let trips = Arc::new(InMemoryTripStore::default());
        let matches = Arc::new(InMemoryMatchStore::default());
        let users = Arc::new(InMemoryUserStore::default());
        let routing = Arc::new(StraightLineRouting::default());
        let notifier = Arc::new(RecordingNotificationSink::default());

        let resolver = Arc::new(RouteResolverService::new(routing.clone(), trips.clone()));
        let deviation = DeviationScorer::new(routing.clone());

        let matching = Arc::new(MatchingService::new(
            trips.clone(),
            matches.clone(),
            users.clone(),
            resolver,
            deviation,
            config,
        ));

        let rematch = RematchService::new(
            trips.clone(),
            matches.clone(),
            notifier.clone(),
            matching.clone(),
        );

        Self {
            trips,
            matches,
            users,
            routing,
            notifier,
            matching,
            rematch,
        }
    }
}
