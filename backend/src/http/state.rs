//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::FullRepository;
use crate::scheduling::SchedulingEngine;
use crate::services::{BookingService, NotificationSink};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Booking lifecycle service backed by the configured repository
    pub service: BookingService,
}

impl AppState {
    /// Create a new application state from its collaborators.
    pub fn new(
        repository: Arc<dyn FullRepository>,
        engine: Arc<SchedulingEngine>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            service: BookingService::new(repository, engine, notifier),
        }
    }
}
