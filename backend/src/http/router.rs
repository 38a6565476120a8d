//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Bookings
        .route(
            "/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route("/bookings/confirm", post(handlers::confirm_slot))
        .route("/bookings/bulk-reschedule", post(handlers::bulk_reschedule))
        .route(
            "/bookings/{id}",
            get(handlers::get_booking)
                .put(handlers::update_booking)
                .delete(handlers::cancel_booking),
        )
        .route("/bookings/{id}/confirm", post(handlers::confirm_booking))
        // Availability
        .route("/availability", get(handlers::get_availability))
        .route("/check-availability", post(handlers::check_availability))
        // Inspections
        .route("/inspections", post(handlers::create_inspection))
        .route("/inspections/check-conflicts", post(handlers::check_conflicts))
        .route("/inspections/optimal-assignment", post(handlers::optimal_assignment))
        .route(
            "/inspections/available-slots",
            get(handlers::available_inspection_slots),
        )
        .route("/inspections/{id}/start", post(handlers::start_inspection))
        .route("/inspections/{id}/complete", post(handlers::complete_inspection))
        // Audit and routing
        .route("/conflicts", get(handlers::list_conflicts))
        .route("/technicians/{id}/route", get(handlers::get_daily_route));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FullRepository, LocalRepository};
    use crate::scheduling::SchedulingEngine;
    use crate::services::{LogNotificationSink, NotificationSink};
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
        let notifier = Arc::new(LogNotificationSink) as Arc<dyn NotificationSink>;
        let state = AppState::new(repo, Arc::new(SchedulingEngine::default()), notifier);
        let _router = create_router(state);
    }
}
