//! Controllers de la API

pub mod match_controller;
pub mod trip_controller;
pub mod user_controller;

pub use match_controller::MatchController;
pub use trip_controller::TripController;
pub use user_controller::UserController;
