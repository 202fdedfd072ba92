use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::user_dto::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::dto::ApiResponse;
use crate::repositories::UserRepository;
use crate::utils::errors::AppError;

pub struct UserController {
    repository: UserRepository,
}

impl UserController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: UserRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        request: CreateUserRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        request.validate()?;

        let user = self
            .repository
            .create(request.full_name, request.email, request.phone_number)
            .await?;

        Ok(ApiResponse::success_with_message(
            user.into(),
            "Usuario creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, AppError> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    pub async fn list(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repository.find_all().await?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        request.validate()?;

        let user = self
            .repository
            .update(id, request.full_name, request.email, request.phone_number)
            .await?;

        Ok(ApiResponse::success_with_message(
            user.into(),
            "Usuario actualizado exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repository.delete(id).await
    }
}
