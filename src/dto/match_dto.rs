use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::trip_dto::TripSummary;
use crate::models::MatchStatus;

/// Entrada de la lista rankeada que devuelve el motor de matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub matching_trip_id: Uuid,
    /// Score combinado 0-100, redondeado a 2 decimales
    pub match_percentage: f64,
    pub overlap_percentage: f64,
    /// Distancia extra que incurre el conductor por el desvío (metros)
    pub additional_distance_meters: f64,
    /// Tiempo extra que incurre el conductor por el desvío (segundos)
    pub additional_time_seconds: f64,
    pub trip: TripSummary,
}

/// Match persistido que involucra a un trip dado
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingMatch {
    pub match_id: Uuid,
    pub matching_trip_id: Uuid,
    pub match_percentage: f64,
    pub status: MatchStatus,
    pub trip: TripSummary,
}

/// Request para transicionar el estado de un match
#[derive(Debug, Deserialize)]
pub struct UpdateMatchStatusRequest {
    pub status: MatchStatus,
}
