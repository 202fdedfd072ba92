//! Routers de la API

pub mod match_routes;
pub mod trip_routes;
pub mod user_routes;
