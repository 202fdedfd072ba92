use std::sync::Arc;

use uuid::Uuid;

use crate::dto::match_dto::{ExistingMatch, MatchResult};
use crate::models::{MatchStatus, TripMatch};
use crate::services::MatchingService;
use crate::utils::errors::AppError;

pub struct MatchController {
    matching: Arc<MatchingService>,
}

impl MatchController {
    pub fn new(matching: Arc<MatchingService>) -> Self {
        Self { matching }
    }

    pub async fn find_matches(&self, trip_id: Uuid) -> Result<Vec<MatchResult>, AppError> {
        self.matching.find_matches(trip_id).await
    }

    pub async fn get_existing_matches(
        &self,
        trip_id: Uuid,
    ) -> Result<Vec<ExistingMatch>, AppError> {
        self.matching.get_existing_matches(trip_id).await
    }

    pub async fn update_status(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<TripMatch, AppError> {
        self.matching.update_match_status(match_id, status).await
    }
}
