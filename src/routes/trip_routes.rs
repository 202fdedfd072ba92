use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::TripController;
use crate::dto::trip_dto::{
    CreateTripRequest, TripResponse, UpdateTripRequest, UpdateTripStatusRequest,
};
use crate::dto::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_trip))
        .route("/:id", get(get_trip))
        .route("/:id", put(update_trip))
        .route("/:id", delete(delete_trip))
        .route("/:id/status", put(update_trip_status))
        .route("/driver/:driver_id", get(get_trips_by_driver))
}

async fn create_trip(
    State(state): State<AppState>,
    Json(request): Json<CreateTripRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.rematch.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripResponse>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.rematch.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn get_trips_by_driver(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Vec<TripResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.rematch.clone());
    let response = controller.get_by_driver(driver_id).await?;
    Ok(Json(response))
}

async fn update_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.rematch.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn update_trip_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripStatusRequest>,
) -> Result<Json<TripResponse>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.rematch.clone());
    let response = controller.update_status(id, request.status).await?;
    Ok(Json(response))
}

async fn delete_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.rematch.clone());
    controller.delete(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Trip eliminado exitosamente"
    })))
}
