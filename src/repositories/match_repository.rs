use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{MatchStatus, TripMatch};
use crate::utils::errors::AppError;
use crate::utils::geo::canonical_pair;

/// Seam de persistencia de matches para el motor de matching
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Upsert sobre el par canónico: crea la fila como `proposed` o, si ya
    /// existe, actualiza score y timestamp sin tocar el status.
    async fn upsert_proposed(
        &self,
        trip_a: Uuid,
        trip_b: Uuid,
        score: f64,
    ) -> Result<TripMatch, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TripMatch>, AppError>;

    async fn set_status(&self, id: Uuid, status: MatchStatus) -> Result<TripMatch, AppError>;

    /// Matches con status `accepted` que involucran al trip.
    async fn find_accepted_involving(&self, trip_id: Uuid) -> Result<Vec<TripMatch>, AppError>;

    /// Matches `proposed` o `accepted` que involucran al trip, ordenados
    /// por score descendente.
    async fn find_active_involving(&self, trip_id: Uuid) -> Result<Vec<TripMatch>, AppError>;

    /// Borra toda fila de match (cualquier status) que involucre al trip.
    async fn delete_involving(&self, trip_id: Uuid) -> Result<u64, AppError>;
}

pub struct MatchRepository {
    pool: PgPool,
}

impl MatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for MatchRepository {
    async fn upsert_proposed(
        &self,
        trip_a: Uuid,
        trip_b: Uuid,
        score: f64,
    ) -> Result<TripMatch, AppError> {
        let (first, second) = canonical_pair(trip_a, trip_b);

        // El UNIQUE (trip_a_id, trip_b_id) serializa el descubrimiento
        // concurrente del mismo par desde cualquiera de los dos lados.
        let row = sqlx::query_as::<_, TripMatch>(
            r#"
            INSERT INTO trip_matches (id, trip_a_id, trip_b_id, match_score, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'proposed', $5, $5)
            ON CONFLICT (trip_a_id, trip_b_id)
            DO UPDATE SET match_score = EXCLUDED.match_score, updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(first)
        .bind(second)
        .bind(score)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TripMatch>, AppError> {
        let row = sqlx::query_as::<_, TripMatch>("SELECT * FROM trip_matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn set_status(&self, id: Uuid, status: MatchStatus) -> Result<TripMatch, AppError> {
        let row = sqlx::query_as::<_, TripMatch>(
            r#"
            UPDATE trip_matches
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

        Ok(row)
    }

    async fn find_accepted_involving(&self, trip_id: Uuid) -> Result<Vec<TripMatch>, AppError> {
        let rows = sqlx::query_as::<_, TripMatch>(
            r#"
            SELECT * FROM trip_matches
            WHERE (trip_a_id = $1 OR trip_b_id = $1) AND status = 'accepted'
            "#,
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_active_involving(&self, trip_id: Uuid) -> Result<Vec<TripMatch>, AppError> {
        let rows = sqlx::query_as::<_, TripMatch>(
            r#"
            SELECT * FROM trip_matches
            WHERE (trip_a_id = $1 OR trip_b_id = $1)
              AND status IN ('proposed', 'accepted')
            ORDER BY match_score DESC
            "#,
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete_involving(&self, trip_id: Uuid) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM trip_matches WHERE trip_a_id = $1 OR trip_b_id = $1")
                .bind(trip_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
