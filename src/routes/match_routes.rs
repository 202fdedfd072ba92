use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::MatchController;
use crate::dto::match_dto::{ExistingMatch, MatchResult, UpdateMatchStatusRequest};
use crate::models::TripMatch;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_match_router() -> Router<AppState> {
    Router::new()
        .route("/:trip_id", get(find_matches))
        .route("/existing/:trip_id", get(get_existing_matches))
        .route("/:match_id/status", put(update_match_status))
}

async fn find_matches(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<MatchResult>>, AppError> {
    let controller = MatchController::new(state.matching.clone());
    let response = controller.find_matches(trip_id).await?;
    Ok(Json(response))
}

async fn get_existing_matches(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<ExistingMatch>>, AppError> {
    let controller = MatchController::new(state.matching.clone());
    let response = controller.get_existing_matches(trip_id).await?;
    Ok(Json(response))
}

async fn update_match_status(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Json(request): Json<UpdateMatchStatusRequest>,
) -> Result<Json<TripMatch>, AppError> {
    let controller = MatchController::new(state.matching.clone());
    let response = controller.update_status(match_id, request.status).await?;
    Ok(Json(response))
}
