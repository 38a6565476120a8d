//! Lifecycle notifications.
//!
//! The service emits one event per committed mutation. Delivery is
//! best-effort: a failing sink is logged and never rolls back the booking.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Booking, BookingId, BookingStatus, LeadId, TechnicianId, TimeWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    BookingCreated,
    BookingConfirmed,
    ScheduleChanged,
    BookingCancelled,
    InspectionStarted,
    InspectionCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEvent {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub booking_id: BookingId,
    pub technician_id: TechnicianId,
    pub lead_id: LeadId,
    pub customer_name: String,
    pub suburb: String,
    pub window: TimeWindow,
    pub status: BookingStatus,
    /// Interval before a reschedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_window: Option<TimeWindow>,
    pub occurred_at: NaiveDateTime,
}

impl BookingEvent {
    pub fn new(kind: NotificationKind, booking: &Booking) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            booking_id: booking.id,
            technician_id: booking.technician_id,
            lead_id: booking.lead_id,
            customer_name: booking.customer_name.clone(),
            suburb: booking.location.suburb.clone(),
            window: booking.window(),
            status: booking.status,
            previous_window: None,
            occurred_at: booking.updated_at,
        }
    }

    pub fn with_previous_window(mut self, window: TimeWindow) -> Self {
        self.previous_window = Some(window);
        self
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Destination for lifecycle events.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: BookingEvent) -> Result<(), NotificationError>;
}

/// Writes events to the log. Default sink for the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, event: BookingEvent) -> Result<(), NotificationError> {
        log::info!(
            "notify technician {}: {:?} booking {} ({}, {})",
            event.technician_id,
            event.kind,
            event.booking_id,
            event.suburb,
            event.window
        );
        Ok(())
    }
}

/// Keeps events in memory so tests can assert on them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSink {
    events: Arc<RwLock<Vec<BookingEvent>>>,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BookingEvent> {
        self.events.read().clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.events.read().iter().map(|e| e.kind).collect()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn notify(&self, event: BookingEvent) -> Result<(), NotificationError> {
        self.events.write().push(event);
        Ok(())
    }
}
