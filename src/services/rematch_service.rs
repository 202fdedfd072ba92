//! Invalidación y re-matching
//!
//! Cuando un trip con matches aceptados cambia sus campos core o se
//! elimina: el trip contraparte de cada match aceptado vuelve a `pending`
//! y recibe una notificación; toda fila de match que involucre al trip se
//! borra; y si el trip sigue existiendo se relanza la búsqueda en
//! background sin bloquear la respuesta del caller.

use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::TripStatus;
use crate::repositories::{MatchStore, TripStore};
use crate::services::matching_service::MatchingService;
use crate::services::notification_service::{NotificationReason, NotificationSink};
use crate::utils::errors::AppError;

pub struct RematchService {
    trips: Arc<dyn TripStore>,
    matches: Arc<dyn MatchStore>,
    notifier: Arc<dyn NotificationSink>,
    matching: Arc<MatchingService>,
}

impl RematchService {
    pub fn new(
        trips: Arc<dyn TripStore>,
        matches: Arc<dyn MatchStore>,
        notifier: Arc<dyn NotificationSink>,
        matching: Arc<MatchingService>,
    ) -> Self {
        Self {
            trips,
            matches,
            notifier,
            matching,
        }
    }

    /// Deshace los matches del trip y, si no fue eliminado, relanza la
    /// búsqueda como tarea en background. Devuelve el handle de esa tarea
    /// para que los tests puedan esperarla de forma determinista; los
    /// callers HTTP simplemente lo descartan.
    pub async fn invalidate_and_rematch(
        &self,
        trip_id: Uuid,
        is_deletion: bool,
    ) -> Result<Option<JoinHandle<()>>, AppError> {
        let accepted = self.matches.find_accepted_involving(trip_id).await?;

        let reason = if is_deletion {
            NotificationReason::Cancelled
        } else {
            NotificationReason::Changed
        };

        for row in &accepted {
            let other_id = row.other_trip_id(trip_id);
            // Se revierte el trip contraparte, no el que cambió.
            self.trips.set_status(other_id, TripStatus::Pending).await?;
            self.notifier.notify(other_id, reason).await;
        }

        let deleted = self.matches.delete_involving(trip_id).await?;
        log::info!(
            "🧹 Trip {}: {} matches aceptados deshechos, {} filas borradas",
            trip_id,
            accepted.len(),
            deleted
        );

        if is_deletion {
            return Ok(None);
        }

        let matching = self.matching.clone();
        let handle = tokio::spawn(async move {
            match matching.find_matches(trip_id).await {
                Ok(results) => log::info!(
                    "🔁 Rematch en background de trip {}: {} matches",
                    trip_id,
                    results.len()
                ),
                Err(e) => {
                    // El caller del update ya recibió su respuesta; el
                    // fallo solo se registra.
                    log::error!("❌ Rematch en background de trip {} falló: {}", trip_id, e)
                }
            }
        });

        Ok(Some(handle))
    }
}
