//! Modelo de Trip
//!
//! Un trip es una oferta de conductor (seats_offered > 0) o una petición
//! de pasajero (seats_required > 0). Los campos de ruta (polyline, largo,
//! duración) son un cache que se llena de forma perezosa la primera vez
//! que el motor de matching necesita la geometría.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Coordenada geográfica (lat, lng)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Estado de un trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Pending,
    Matched,
}

/// Trip - mapea exactamente a la tabla trips
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub drop_off_lat: f64,
    pub drop_off_lng: f64,
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

impl Trip {
    pub fn pickup(&self) -> Coordinates {
        Coordinates {
            lat: self.pickup_lat,
            lng: self.pickup_lng,
        }
    }

    pub fn drop_off(&self) -> Coordinates {
        Coordinates {
            lat: self.drop_off_lat,
            lng: self.drop_off_lng,
        }
    }

    /// Cache hit: el trip ya tiene geometría y largo de ruta resueltos.
    pub fn has_route(&self) -> bool {
        self.polyline.is_some() && self.route_length_m.is_some()
    }
}
