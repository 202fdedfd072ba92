mod config;
mod controllers;
mod database;
mod dto;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use tokio::signal;
use tracing::{error, info};

use config::EnvironmentConfig;
use database::create_pool;
use middleware::cors::cors_from_config;
use services::{LogNotificationService, MapboxRoutingService, NotificationSink, RoutingProvider};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::default();

    // Configurar logging: debug en desarrollo, info en el resto
    let log_level = if config.is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("🚗 Trip Matching Engine - API de carpooling");
    info!("===========================================");

    // Inicializar base de datos
    let pool = match create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Cliente de routing externo
    let mapbox_token = config
        .mapbox_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("MAPBOX_TOKEN must be set in environment variables"))?;
    let routing: Arc<dyn RoutingProvider> = Arc::new(MapboxRoutingService::new(mapbox_token));
    let notifier: Arc<dyn NotificationSink> = Arc::new(LogNotificationService);

    let addr: SocketAddr = config.server_url().parse()?;
    let cors = cors_from_config(&config.cors_origins);
    let app_state = AppState::new(pool, config, routing, notifier);

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .nest("/api/user", routes::user_routes::create_user_router())
        .nest("/api/trip", routes::trip_routes::create_trip_router())
        .nest("/api/match", routes::match_routes::create_match_router())
        .layer(cors)
        .with_state(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("👤 Endpoints - User:");
    info!("   POST /api/user - Crear usuario");
    info!("   GET  /api/user - Listar usuarios");
    info!("   GET  /api/user/:id - Obtener usuario");
    info!("   PUT  /api/user/:id - Actualizar usuario");
    info!("   DELETE /api/user/:id - Eliminar usuario");
    info!("🚗 Endpoints - Trip:");
    info!("   POST /api/trip - Crear trip");
    info!("   GET  /api/trip/:id - Obtener trip");
    info!("   GET  /api/trip/driver/:driver_id - Trips por driver");
    info!("   PUT  /api/trip/:id - Actualizar trip");
    info!("   PUT  /api/trip/:id/status - Actualizar estado");
    info!("   DELETE /api/trip/:id - Eliminar trip");
    info!("🤝 Endpoints - Match:");
    info!("   GET  /api/match/:trip_id - Buscar matches para un trip");
    info!("   GET  /api/match/existing/:trip_id - Matches persistidos");
    info!("   PUT  /api/match/:match_id/status - Aceptar/rechazar match");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check simple
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "trip-matching-engine",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
