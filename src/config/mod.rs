//! Configuración de la aplicación

pub mod environment;
pub mod matching;

pub use environment::EnvironmentConfig;
pub use matching::MatchingConfig;
