use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::trip_dto::{CreateTripRequest, TripResponse, UpdateTripRequest};
use crate::dto::ApiResponse;
use crate::models::{Coordinates, TripStatus};
use crate::repositories::{TripRepository, TripStore, UserRepository};
use crate::services::RematchService;
use crate::utils::errors::AppError;

pub struct TripController {
    repository: TripRepository,
    users: UserRepository,
    rematch: Arc<RematchService>,
}

impl TripController {
    pub fn new(pool: PgPool, rematch: Arc<RematchService>) -> Self {
        Self {
            repository: TripRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            rematch,
        }
    }

    /// El trip se crea sin datos de ruta: la geometría se resuelve de
    /// forma perezosa la primera vez que el matching la necesita.
    pub async fn create(
        &self,
        request: CreateTripRequest,
    ) -> Result<ApiResponse<TripResponse>, AppError> {
        validate_coordinates("pickup", &request.pickup)?;
        validate_coordinates("dropOff", &request.drop_off)?;

        if request.seats_offered < 0 || request.seats_required < 0 {
            return Err(AppError::BadRequest(
                "seatsOffered and seatsRequired must be >= 0".to_string(),
            ));
        }

        self.users
            .find_by_id(request.driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

        let trip = self
            .repository
            .create(
                request.driver_id,
                request.pickup.lat,
                request.pickup.lng,
                request.drop_off.lat,
                request.drop_off.lng,
                request.departure_time,
                request.seats_offered,
                request.seats_required,
            )
            .await?;

        log::info!("🚗 Trip {} creado para driver {}", trip.id, trip.driver_id);

        Ok(ApiResponse::success_with_message(
            trip.into(),
            "Trip creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<TripResponse, AppError> {
        let trip = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        Ok(trip.into())
    }

    pub async fn get_by_driver(&self, driver_id: Uuid) -> Result<Vec<TripResponse>, AppError> {
        let trips = self.repository.find_by_driver(driver_id).await?;
        Ok(trips.into_iter().map(Into::into).collect())
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: TripStatus,
    ) -> Result<TripResponse, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        let trip = self.repository.set_status(id, status).await?;
        Ok(trip.into())
    }

    /// Diff a nivel de campo contra el valor almacenado: solo un cambio de
    /// pickup, drop-off o departure dispara la invalidación de matches y
    /// el rematch; editar solo asientos no.
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateTripRequest,
    ) -> Result<ApiResponse<TripResponse>, AppError> {
        if let Some(pickup) = &request.pickup {
            validate_coordinates("pickup", pickup)?;
        }
        if let Some(drop_off) = &request.drop_off {
            validate_coordinates("dropOff", drop_off)?;
        }

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        let pickup = request.pickup.unwrap_or_else(|| current.pickup());
        let drop_off = request.drop_off.unwrap_or_else(|| current.drop_off());
        let departure_time = request.departure_time.unwrap_or(current.departure_time);
        let seats_offered = request.seats_offered.unwrap_or(current.seats_offered);
        let seats_required = request.seats_required.unwrap_or(current.seats_required);

        if seats_offered < 0 || seats_required < 0 {
            return Err(AppError::BadRequest(
                "seatsOffered and seatsRequired must be >= 0".to_string(),
            ));
        }

        let has_core_change = pickup.lat != current.pickup_lat
            || pickup.lng != current.pickup_lng
            || drop_off.lat != current.drop_off_lat
            || drop_off.lng != current.drop_off_lng
            || departure_time != current.departure_time;

        let trip = self
            .repository
            .update(
                id,
                pickup.lat,
                pickup.lng,
                drop_off.lat,
                drop_off.lng,
                departure_time,
                seats_offered,
                seats_required,
                has_core_change,
            )
            .await?;

        if has_core_change {
            log::info!("♻️ Trip {} cambió campos core, invalidando matches", id);
            // fire-and-forget: el caller no espera el rematch
            let _ = self.rematch.invalidate_and_rematch(id, false).await?;
        }

        Ok(ApiResponse::success_with_message(
            trip.into(),
            "Trip actualizado exitosamente".to_string(),
        ))
    }

    /// La invalidación corre antes de borrar la fila: los trips
    /// contraparte vuelven a pending y reciben la notificación de
    /// cancelación, sin relanzar búsqueda para un trip que ya no existe.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        self.rematch.invalidate_and_rematch(id, true).await?;
        self.repository.delete(id).await?;

        log::info!("🗑️ Trip {} eliminado", id);
        Ok(())
    }
}

fn validate_coordinates(field: &str, coords: &Coordinates) -> Result<(), AppError> {
    if !coords.lat.is_finite() || !coords.lng.is_finite() {
        return Err(AppError::BadRequest(format!(
            "{} must have numeric lat and lng",
            field
        )));
    }
    if coords.lat < -90.0 || coords.lat > 90.0 || coords.lng < -180.0 || coords.lng > 180.0 {
        return Err(AppError::BadRequest(format!(
            "{} is out of range: lat must be in [-90, 90], lng in [-180, 180]",
            field
        )));
    }
    Ok(())
}
