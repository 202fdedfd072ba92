//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los clientes externos (routing provider,
//! sink de notificaciones) se construyen una sola vez en `main` y entran
//! como dependencias explícitas, nunca como estado global implícito.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::EnvironmentConfig;
use crate::repositories::{
    MatchRepository, MatchStore, TripRepository, TripStore, UserRepository, UserStore,
};
use crate::services::{
    DeviationScorer, MatchingService, NotificationSink, RematchService, RouteResolverService,
    RoutingProvider,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub matching: Arc<MatchingService>,
    pub rematch: Arc<RematchService>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: EnvironmentConfig,
        routing: Arc<dyn RoutingProvider>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let trips: Arc<dyn TripStore> = Arc::new(TripRepository::new(pool.clone()));
        let matches: Arc<dyn MatchStore> = Arc::new(MatchRepository::new(pool.clone()));
        let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));

        let resolver = Arc::new(RouteResolverService::new(routing.clone(), trips.clone()));
        let deviation = DeviationScorer::new(routing);

        let matching = Arc::new(MatchingService::new(
            trips.clone(),
            matches.clone(),
            users,
            resolver,
            deviation,
            config.matching.clone(),
        ));

        let rematch = Arc::new(RematchService::new(
            trips,
            matches,
            notifier,
            matching.clone(),
        ));

        Self {
            pool,
            config,
            matching,
            rematch,
        }
    }
}
