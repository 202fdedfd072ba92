//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación: el cliente
//! del routing provider, la resolución perezosa de rutas, el scoring de
//! pares, el motor de matching y la cascada de invalidación.

pub mod matching_service;
pub mod notification_service;
pub mod rematch_service;
pub mod route_resolver_service;
pub mod routing_service;
pub mod scoring_service;
#[cfg(test)]
pub mod test_support;

pub use matching_service::MatchingService;
pub use notification_service::{LogNotificationService, NotificationReason, NotificationSink};
pub use rematch_service::RematchService;
pub use route_resolver_service::RouteResolverService;
pub use routing_service::{MapboxRoutingService, RoutingProvider};
pub use scoring_service::{overlap_percentage, DeviationScorer};
