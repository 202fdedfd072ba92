use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::User;

/// Request para crear un nuevo usuario
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: String,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 6, max = 30))]
    pub phone_number: Option<String>,
}

/// Request para actualizar un usuario existente
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 6, max = 30))]
    pub phone_number: Option<String>,
}

/// Response de usuario para la API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            phone_number: user.phone_number,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // El email es opcional de punta a punta: sin email el request valida
    // y la columna lo admite como NULL.
    #[test]
    fn test_create_user_without_email_is_valid() {
        let request = CreateUserRequest {
            full_name: "Ana Torres".to_string(),
            email: None,
            phone_number: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_user_rejects_malformed_email() {
        let request = CreateUserRequest {
            full_name: "Ana Torres".to_string(),
            email: Some("not-an-email".to_string()),
            phone_number: None,
        };
        assert!(request.validate().is_err());
    }
}
