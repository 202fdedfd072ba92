//! Parámetros del motor de matching
//!
//! Todos los umbrales de scoring son política de producto, no física:
//! se mantienen como valores nombrados y sobreescribibles por entorno
//! en lugar de literales repartidos por el código.

use std::env;

/// Metros por grado de latitud, usado para la caja de prefiltrado.
///
/// Aproximación plana: un grado de longitud se encoge hacia los polos,
/// así que la caja sobre-admite candidatos en latitudes altas. El filtro
/// Haversine exacto que corre después mantiene la corrección.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Configuración del motor de matching
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Distancia máxima pickup-a-pickup entre dos trips compatibles (metros)
    pub proximity_threshold_m: f64,
    /// Ventana de salida aceptada alrededor del departure time (minutos)
    pub time_window_minutes: i64,
    /// Distancia máxima para considerar que dos puntos de ruta coinciden (metros)
    pub point_match_threshold_m: f64,
    /// Overlap mínimo de polylines para un match válido (porcentaje)
    pub min_overlap_pct: f64,
    /// Desviación máxima de ruta para un match válido (porcentaje)
    pub max_deviation_pct: f64,
    /// Peso del overlap en el score final
    pub overlap_weight: f64,
    /// Peso de la desviación en el score final
    pub deviation_weight: f64,
    /// Candidatos evaluados en paralelo por lote (respeta rate limits del provider)
    pub candidate_concurrency: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: 175.0,
            time_window_minutes: 30,
            point_match_threshold_m: 200.0,
            min_overlap_pct: 20.0,
            max_deviation_pct: 30.0,
            overlap_weight: 0.7,
            deviation_weight: 0.3,
            candidate_concurrency: 4,
        }
    }
}

impl MatchingConfig {
    /// Cargar la configuración desde el entorno, con defaults para
    /// cada valor no definido.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            proximity_threshold_m: env_f64(
                "MATCHING_PROXIMITY_THRESHOLD_M",
                defaults.proximity_threshold_m,
            ),
            time_window_minutes: env_i64(
                "MATCHING_TIME_WINDOW_MINUTES",
                defaults.time_window_minutes,
            ),
            point_match_threshold_m: env_f64(
                "MATCHING_POINT_MATCH_THRESHOLD_M",
                defaults.point_match_threshold_m,
            ),
            min_overlap_pct: env_f64("MATCHING_MIN_OVERLAP_PCT", defaults.min_overlap_pct),
            max_deviation_pct: env_f64("MATCHING_MAX_DEVIATION_PCT", defaults.max_deviation_pct),
            overlap_weight: env_f64("MATCHING_OVERLAP_WEIGHT", defaults.overlap_weight),
            deviation_weight: env_f64("MATCHING_DEVIATION_WEIGHT", defaults.deviation_weight),
            candidate_concurrency: env_f64(
                "MATCHING_CANDIDATE_CONCURRENCY",
                defaults.candidate_concurrency as f64,
            ) as usize,
        }
    }

    /// Umbral de proximidad expresado en grados (aproximación plana).
    pub fn proximity_threshold_degrees(&self) -> f64 {
        self.proximity_threshold_m / METERS_PER_DEGREE
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = MatchingConfig::default();
        assert_eq!(config.proximity_threshold_m, 175.0);
        assert_eq!(config.time_window_minutes, 30);
        assert_eq!(config.min_overlap_pct, 20.0);
        assert_eq!(config.max_deviation_pct, 30.0);
        assert!((config.overlap_weight + config.deviation_weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_proximity_degrees_conversion() {
        let config = MatchingConfig::default();
        let deg = config.proximity_threshold_degrees();
        assert!((deg - 175.0 / 111_000.0).abs() < 1e-12);
    }
}
