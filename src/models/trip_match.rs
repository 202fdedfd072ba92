//! Modelo de TripMatch
//!
//! Una fila por par no-ordenado de trips: (trip_a_id, trip_b_id) se guarda
//! en orden canónico (uuid menor primero) y lleva un UNIQUE en la tabla,
//! así el descubrimiento concurrente desde cualquiera de los dos lados
//! converge a la misma fila.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Estado de un match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Proposed,
    Accepted,
    Rejected,
}

/// TripMatch - mapea exactamente a la tabla trip_matches
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripMatch {
    pub id: Uuid,
    pub trip_a_id: Uuid,
    pub trip_b_id: Uuid,
    pub match_score: f64,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripMatch {
    /// Dado uno de los dos trips del par, devuelve el otro.
    pub fn other_trip_id(&self, trip_id: Uuid) -> Uuid {
        if self.trip_a_id == trip_id {
            self.trip_b_id
        } else {
            self.trip_a_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_trip_id() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let m = TripMatch {
            id: Uuid::new_v4(),
            trip_a_id: a,
            trip_b_id: b,
            match_score: 80.0,
            status: MatchStatus::Proposed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(m.other_trip_id(a), b);
        assert_eq!(m.other_trip_id(b), a);
    }
}
