//! Scoring de pares de trips
//!
//! Dos señales: overlap direccional de polylines (puro, sin llamadas
//! externas) y desviación de ruta (una llamada extra al routing provider
//! con la cadena pickup A → pickup B → drop-off B → drop-off A).

use std::sync::Arc;

use crate::models::Trip;
use crate::services::routing_service::RoutingProvider;
use crate::utils::errors::AppError;
use crate::utils::geo::{decode_points, distance_meters};

/// Overlap simétrico entre dos polylines codificadas, en [0, 100].
///
/// Cada pasada direccional recorre una secuencia en orden y busca en la
/// otra con un cursor que solo avanza, así un punto de la otra ruta no se
/// reutiliza (modela el recorrido en un solo sentido). El promedio de las
/// dos pasadas hace el resultado independiente del orden de argumentos.
///
/// Errores de decodificación degradan a 0, nunca se propagan.
pub fn overlap_percentage(polyline_a: &str, polyline_b: &str, point_threshold_m: f64) -> f64 {
    let coords_a = match decode_points(polyline_a) {
        Ok(points) => points,
        Err(e) => {
            log::error!("❌ Error decodificando polyline A: {}", e);
            return 0.0;
        }
    };
    let coords_b = match decode_points(polyline_b) {
        Ok(points) => points,
        Err(e) => {
            log::error!("❌ Error decodificando polyline B: {}", e);
            return 0.0;
        }
    };

    if coords_a.is_empty() || coords_b.is_empty() {
        return 0.0;
    }

    let a_to_b = directed_overlap(&coords_a, &coords_b, point_threshold_m);
    let b_to_a = directed_overlap(&coords_b, &coords_a, point_threshold_m);

    (a_to_b + b_to_a) / 2.0
}

fn directed_overlap(
    from: &[crate::models::Coordinates],
    to: &[crate::models::Coordinates],
    threshold_m: f64,
) -> f64 {
    let mut matched_points = 0usize;
    let mut last_match_index = 0usize;

    for point in from {
        for (j, other) in to.iter().enumerate().skip(last_match_index) {
            let distance = distance_meters(point.lat, point.lng, other.lat, other.lng);
            if distance <= threshold_m {
                matched_points += 1;
                last_match_index = j + 1;
                break;
            }
        }
    }

    (matched_points as f64 / from.len() as f64) * 100.0
}

/// Resultado de la evaluación de desvío de un par
#[derive(Debug, Clone)]
pub struct DeviationResult {
    /// Distancia extra relativa al largo de ruta del trip A (porcentaje)
    pub deviation_percentage: f64,
    pub combined_distance_m: f64,
    pub combined_duration_s: f64,
}

/// Calcula el desvío que incurre el trip A por pasar a buscar y dejar
/// al trip B. Una sola llamada al provider por par.
pub struct DeviationScorer {
    provider: Arc<dyn RoutingProvider>,
}

impl DeviationScorer {
    pub fn new(provider: Arc<dyn RoutingProvider>) -> Self {
        Self { provider }
    }

    /// Requiere que `trip_a` ya tenga su ruta resuelta (largo > 0).
    pub async fn deviation(
        &self,
        trip_a: &Trip,
        trip_b: &Trip,
    ) -> Result<DeviationResult, AppError> {
        let route_length = trip_a
            .route_length_m
            .filter(|l| *l > 0.0)
            .ok_or_else(|| {
                AppError::Internal(format!("Trip {} has no resolved route length", trip_a.id))
            })?;

        let waypoints = [
            trip_a.pickup(),
            trip_b.pickup(),
            trip_b.drop_off(),
            trip_a.drop_off(),
        ];

        let combined = self.provider.get_route(&waypoints).await?;

        let extra_distance = combined.distance_m - route_length;
        let deviation_percentage = extra_distance / route_length * 100.0;

        Ok(DeviationResult {
            deviation_percentage,
            combined_distance_m: combined.distance_m,
            combined_duration_s: combined.duration_s,
        })
    }
}
