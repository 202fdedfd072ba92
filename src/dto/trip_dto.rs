use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Coordinates, Trip, TripStatus};

/// Request para crear un trip
#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub driver_id: Uuid,
    pub pickup: Coordinates,
    pub drop_off: Coordinates,
    pub seats_offered: i32,
    pub seats_required: i32,
    pub departure_time: DateTime<Utc>,
}

/// Request para actualizar un trip (todos los campos opcionales)
#[derive(Debug, Deserialize)]
pub struct UpdateTripRequest {
    pub pickup: Option<Coordinates>,
    pub drop_off: Option<Coordinates>,
    pub departure_time: Option<DateTime<Utc>>,
    pub seats_offered: Option<i32>,
    pub seats_required: Option<i32>,
}

/// Request para cambiar el estado de un trip
#[derive(Debug, Deserialize)]
pub struct UpdateTripStatusRequest {
    pub status: TripStatus,
}

/// Response de trip para la API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripResponse {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub pickup: Coordinates,
    pub drop_off: Coordinates,
    pub departure_time: DateTime<Utc>,
    pub seats_offered: i32,
    pub seats_required: i32,
    pub status: TripStatus,
    pub polyline: Option<String>,
    pub route_length_m: Option<f64>,
    pub route_duration_s: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Trip> for TripResponse {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            driver_id: trip.driver_id,
            pickup: trip.pickup(),
            drop_off: trip.drop_off(),
            departure_time: trip.departure_time,
            seats_offered: trip.seats_offered,
            seats_required: trip.seats_required,
            status: trip.status,
            polyline: trip.polyline,
            route_length_m: trip.route_length_m,
            route_duration_s: trip.route_duration_s,
            created_at: trip.created_at,
            updated_at: trip.updated_at,
        }
    }
}

/// Resumen de trip embebido en los resultados de matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSummary {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub driver_name: String,
    pub departure_time: DateTime<Utc>,
    pub seats_offered: i32,
    pub seats_required: i32,
    pub pickup: Coordinates,
    pub drop_off: Coordinates,
}

impl TripSummary {
    pub fn from_trip(trip: &Trip, driver_name: String) -> Self {
        Self {
            id: trip.id,
            driver_id: trip.driver_id,
            driver_name,
            departure_time: trip.departure_time,
            seats_offered: trip.seats_offered,
            seats_required: trip.seats_required,
            pickup: trip.pickup(),
            drop_off: trip.drop_off(),
        }
    }
}
