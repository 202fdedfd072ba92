//! Repositorios de persistencia
//!
//! Cada repositorio es un struct sobre `PgPool`. Los seams `TripStore` y
//! `MatchStore` existen para que el motor de matching reciba sus
//! dependencias inyectadas y los tests puedan usar dobles en memoria.

pub mod match_repository;
pub mod trip_repository;
pub mod user_repository;

pub use match_repository::{MatchRepository, MatchStore};
pub use trip_repository::{CandidateFilter, TripRepository, TripStore};
pub use user_repository::{UserRepository, UserStore};
