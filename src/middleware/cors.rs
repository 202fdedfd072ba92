//! Middleware de CORS
//!
//! Este módulo maneja la configuración de CORS para permitir
//! requests desde diferentes orígenes.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

/// Crear middleware de CORS configurado para desarrollo
/// NOTA: Permite cualquier origen - solo para desarrollo
pub fn cors_middleware() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Capa de CORS según los orígenes configurados: un "*" en la lista (o
/// una lista vacía) habilita el modo permisivo de desarrollo.
pub fn cors_from_config(origins: &[String]) -> CorsLayer {
    if allows_any_origin(origins) {
        cors_middleware()
    } else {
        cors_middleware_with_origins(origins.to_vec())
    }
}

fn allows_any_origin(origins: &[String]) -> bool {
    origins.is_empty() || origins.iter().any(|o| o == "*")
}

/// Crear middleware de CORS con orígenes específicos
pub fn cors_middleware_with_origins(origins: Vec<String>) -> CorsLayer {
    let mut cors = CorsLayer::new();

    for origin in origins {
        if let Ok(header_value) = HeaderValue::from_str(&origin) {
            cors = cors.allow_origin(header_value);
        }
    }

    cors.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ])
    .allow_headers([
        HeaderName::from_static("content-type"),
        HeaderName::from_static("accept"),
        HeaderName::from_static("origin"),
        HeaderName::from_static("x-requested-with"),
    ])
    .allow_credentials(true)
    .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_any_origin() {
        assert!(allows_any_origin(&[]));
        assert!(allows_any_origin(&["*".to_string()]));
        assert!(allows_any_origin(&[
            "https://app.example.com".to_string(),
            "*".to_string()
        ]));
        assert!(!allows_any_origin(&["https://app.example.com".to_string()]));
    }

    #[test]
    fn test_layers_build_for_both_modes() {
        let _ = cors_from_config(&["*".to_string()]);
        let _ = cors_from_config(&["https://app.example.com".to_string()]);
    }
}
