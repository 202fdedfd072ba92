//! Modelos de dominio

pub mod trip;
pub mod trip_match;
pub mod user;

pub use trip::{Coordinates, Trip, TripStatus};
pub use trip_match::{MatchStatus, TripMatch};
pub use user::User;
