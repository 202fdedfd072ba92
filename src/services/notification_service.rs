//! Sink de notificaciones
//!
//! El motor solo emite el *evento* "avisar al trip X que su match cambió";
//! el transporte de entrega queda fuera de alcance. La implementación por
//! defecto registra el evento en el log.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// Motivo por el que un match aceptado dejó de existir
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationReason {
    /// El trip contraparte fue eliminado
    Cancelled,
    /// El trip contraparte cambió pickup, drop-off o salida
    Changed,
}

/// Seam de notificaciones: fire-and-forget, sin garantía de entrega.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, trip_id: Uuid, reason: NotificationReason);
}

pub struct LogNotificationService;

#[async_trait]
impl NotificationSink for LogNotificationService {
    async fn notify(&self, trip_id: Uuid, reason: NotificationReason) {
        match reason {
            NotificationReason::Cancelled => {
                log::info!("🔔 Notificación para trip {}: match cancelado", trip_id)
            }
            NotificationReason::Changed => {
                log::info!("🔔 Notificación para trip {}: match modificado", trip_id)
            }
        }
    }
}
