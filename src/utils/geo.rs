//! Geometría sobre coordenadas geográficas
//!
//! Distancia de gran círculo (Haversine) y ordenamiento canónico de pares
//! de trips para las filas de match.

use uuid::Uuid;

use crate::models::Coordinates;

/// Radio de la Tierra en metros
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Precisión de las polylines codificadas (Mapbox polyline6)
pub const POLYLINE_PRECISION: u32 = 6;

/// Decodifica una polyline codificada a su secuencia ordenada de puntos.
pub fn decode_points(encoded: &str) -> Result<Vec<Coordinates>, String> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|e| format!("polyline decode failed: {}", e))?;

    Ok(line
        .coords()
        .map(|c| Coordinates { lat: c.y, lng: c.x })
        .collect())
}

/// Calcula la distancia Haversine entre dos puntos, en metros.
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Ordena un par de trip ids en forma canónica (menor primero).
///
/// Garantiza que (A,B) y (B,A) apunten a la misma fila de match.
pub fn canonical_pair(trip_a: Uuid, trip_b: Uuid) -> (Uuid, Uuid) {
    if trip_a < trip_b {
        (trip_a, trip_b)
    } else {
        (trip_b, trip_a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_identity() {
        let d = distance_meters(40.7128, -74.0060, 40.7128, -74.0060);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_distance_symmetry() {
        let d1 = distance_meters(40.7128, -74.0060, 48.8566, 2.3522);
        let d2 = distance_meters(48.8566, 2.3522, 40.7128, -74.0060);
        assert!((d1 - d2).abs() < 1e-6);
    }

    #[test]
    fn test_distance_known_value() {
        // NYC downtown -> uptown, aprox 8.2 km
        let d = distance_meters(40.7128, -74.0060, 40.7831, -73.9712);
        assert!(d > 7_000.0 && d < 9_500.0, "unexpected distance: {}", d);
    }

    #[test]
    fn test_canonical_pair_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
        let (first, second) = canonical_pair(a, b);
        assert!(first < second);
    }
}
