use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Trip, TripStatus};
use crate::utils::errors::AppError;

/// Predicados baratos del prefiltro de candidatos, aplicados en SQL antes
/// de cualquier llamada al routing provider.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pub exclude_trip_id: Uuid,
    pub departure_from: DateTime<Utc>,
    pub departure_to: DateTime<Utc>,
    /// El candidato debe ofrecer al menos estos asientos
    pub min_seats_offered: i32,
    /// El candidato no puede requerir más asientos que estos
    pub max_seats_required: i32,
    pub pickup_lat_min: f64,
    pub pickup_lat_max: f64,
    pub pickup_lng_min: f64,
    pub pickup_lng_max: f64,
}

/// Seam de persistencia de trips para el motor de matching
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, AppError>;
    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Trip>, AppError>;
    async fn set_route(
        &self,
        id: Uuid,
        polyline: &str,
        length_m: f64,
        duration_s: f64,
    ) -> Result<Trip, AppError>;
    async fn set_status(&self, id: Uuid, status: TripStatus) -> Result<Trip, AppError>;
}

pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        driver_id: Uuid,
        pickup_lat: f64,
        pickup_lng: f64,
        drop_off_lat: f64,
        drop_off_lng: f64,
        departure_time: DateTime<Utc>,
        seats_offered: i32,
        seats_required: i32,
    ) -> Result<Trip, AppError> {
        let now = Utc::now();
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            INSERT INTO trips (
                id, driver_id, pickup_lat, pickup_lng, drop_off_lat, drop_off_lng,
                departure_time, seats_offered, seats_required, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(driver_id)
        .bind(pickup_lat)
        .bind(pickup_lng)
        .bind(drop_off_lat)
        .bind(drop_off_lng)
        .bind(departure_time)
        .bind(seats_offered)
        .bind(seats_required)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(trip)
    }

    pub async fn find_by_driver(&self, driver_id: Uuid) -> Result<Vec<Trip>, AppError> {
        let trips = sqlx::query_as::<_, Trip>(
            "SELECT * FROM trips WHERE driver_id = $1 ORDER BY created_at DESC",
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }

    /// Actualiza los campos editables de un trip. Cuando cambió un campo
    /// core (pickup, drop_off, departure) el caller pasa `clear_route` y
    /// el cache de ruta se anula en la misma escritura.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        pickup_lat: f64,
        pickup_lng: f64,
        drop_off_lat: f64,
        drop_off_lng: f64,
        departure_time: DateTime<Utc>,
        seats_offered: i32,
        seats_required: i32,
        clear_route: bool,
    ) -> Result<Trip, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips
            SET pickup_lat = $2, pickup_lng = $3, drop_off_lat = $4, drop_off_lng = $5,
                departure_time = $6, seats_offered = $7, seats_required = $8,
                polyline = CASE WHEN $9 THEN NULL ELSE polyline END,
                route_length_m = CASE WHEN $9 THEN NULL ELSE route_length_m END,
                route_duration_s = CASE WHEN $9 THEN NULL ELSE route_duration_s END,
                updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(pickup_lat)
        .bind(pickup_lng)
        .bind(drop_off_lat)
        .bind(drop_off_lng)
        .bind(departure_time)
        .bind(seats_offered)
        .bind(seats_required)
        .bind(clear_route)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(trip)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Trip not found".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl TripStore for TripRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(trip)
    }

    /// Prefiltro de candidatos: no-self, pending, ventana de salida,
    /// asientos bidireccionales y caja de coordenadas plana.
    ///
    /// La caja usa 111 km/grado en ambos ejes; en latitudes altas
    /// sobre-admite longitudes, el filtro Haversine exacto del servicio
    /// descarta esos casos después.
    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Trip>, AppError> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT * FROM trips
            WHERE id != $1
              AND status = 'pending'
              AND departure_time >= $2 AND departure_time <= $3
              AND seats_offered >= $4
              AND seats_required <= $5
              AND pickup_lat BETWEEN $6 AND $7
              AND pickup_lng BETWEEN $8 AND $9
            "#,
        )
        .bind(filter.exclude_trip_id)
        .bind(filter.departure_from)
        .bind(filter.departure_to)
        .bind(filter.min_seats_offered)
        .bind(filter.max_seats_required)
        .bind(filter.pickup_lat_min)
        .bind(filter.pickup_lat_max)
        .bind(filter.pickup_lng_min)
        .bind(filter.pickup_lng_max)
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }

    async fn set_route(
        &self,
        id: Uuid,
        polyline: &str,
        length_m: f64,
        duration_s: f64,
    ) -> Result<Trip, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips
            SET polyline = $2, route_length_m = $3, route_duration_s = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(polyline)
        .bind(length_m)
        .bind(duration_s)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(trip)
    }

    async fn set_status(&self, id: Uuid, status: TripStatus) -> Result<Trip, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(trip)
    }
}
