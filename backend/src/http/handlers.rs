//! HTTP handlers for the REST API.
//!
//! Each handler parses its request into domain values and delegates to the
//! [`BookingService`](crate::services::BookingService).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    parse_date, parse_optional_date, AssignmentResponse, AvailabilityQuery, AvailableSlotsQuery,
    BookingListQuery, BookingListResponse, BulkRescheduleRequest, CancelQuery,
    CheckAvailabilityRequest, CheckConflictsRequest, CompleteInspectionRequest,
    ConfirmSlotResponse, ConflictAuditResponse, ConflictCheckResponse, ConflictsQuery,
    CreateBookingRequest, CreateInspectionRequest, HealthResponse, OptimalAssignmentRequest,
    RouteQuery, UpdateBookingRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{parse_business_datetime, Booking, BookingId, Slot, TechnicianId, TechnicianSlot};
use crate::scheduling::DailyRoute;
use crate::services::{AvailabilityCheck, BulkRescheduleOutcome, SchedulingError};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

fn required_param<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, SchedulingError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| SchedulingError::validation(field, "is required"))
}

fn required_datetime(field: &str, value: Option<&str>) -> Result<chrono::NaiveDateTime, SchedulingError> {
    let raw = required_param(field, value)?;
    parse_business_datetime(raw)
        .ok_or_else(|| SchedulingError::validation(field, format!("'{}' is not a valid date-time", raw)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.service.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Bookings
// =============================================================================

/// GET /v1/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> HandlerResult<BookingListResponse> {
    let filter = query.into_filter()?;
    let bookings = state.service.list_bookings(&filter).await?;
    let total = bookings.len();
    Ok(Json(BookingListResponse { bookings, total }))
}

/// POST /v1/bookings
///
/// Create a PENDING booking. Conflicts are rejected with the full report.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> CreatedResult<Booking> {
    let booking = state.service.create(request.into_request()?).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Booking> {
    Ok(Json(state.service.get_booking(BookingId::new(id)).await?))
}

/// PUT /v1/bookings/{id}
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateBookingRequest>,
) -> HandlerResult<Booking> {
    let id = BookingId::new(id);
    let current = state.service.get_booking(id).await?;
    let changes = request.into_changes(&current)?;
    Ok(Json(state.service.reschedule(id, changes).await?))
}

/// DELETE /v1/bookings/{id}
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<CancelQuery>,
) -> HandlerResult<Booking> {
    Ok(Json(state.service.cancel(BookingId::new(id), query.reason).await?))
}

/// POST /v1/bookings/{id}/confirm
///
/// Strict confirmation of a PENDING booking; errors use the normal status mapping.
pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Booking> {
    Ok(Json(state.service.confirm(BookingId::new(id)).await?))
}

/// POST /v1/bookings/confirm
///
/// Customer-facing confirmation. Always answers 200 with a success flag.
pub async fn confirm_slot(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Json<ConfirmSlotResponse> {
    let result = match request.into_request() {
        Ok(request) => state.service.confirm_slot(request).await,
        Err(err) => Err(err),
    };

    let response = match result {
        Ok(booking) => ConfirmSlotResponse::confirmed(booking.id),
        Err(SchedulingError::Internal(detail)) => {
            log::error!("Slot confirmation failed: {}", detail);
            ConfirmSlotResponse::failed("An internal error occurred")
        }
        Err(err) => {
            log::warn!("Slot confirmation rejected: {}", err);
            ConfirmSlotResponse::failed(err.to_string())
        }
    };
    Json(response)
}

/// POST /v1/bookings/bulk-reschedule
pub async fn bulk_reschedule(
    State(state): State<AppState>,
    Json(request): Json<BulkRescheduleRequest>,
) -> HandlerResult<BulkRescheduleOutcome> {
    let new_date = parse_date("newDate", required_param("newDate", request.new_date.as_deref())?)?;
    let ids: Vec<BookingId> = request.booking_ids.into_iter().map(BookingId::new).collect();
    Ok(Json(state.service.bulk_reschedule(&ids, new_date).await?))
}

// =============================================================================
// Availability
// =============================================================================

/// GET /v1/availability
pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> HandlerResult<Vec<Slot>> {
    let date = parse_date("date", required_param("date", query.date.as_deref())?)?;
    let technician_id = query
        .technician_id
        .ok_or_else(|| SchedulingError::validation("technicianId", "is required"))?;

    let slots = state
        .service
        .availability(
            TechnicianId::new(technician_id),
            date,
            query.duration_minutes,
            query.granularity_minutes,
        )
        .await?;
    Ok(Json(slots))
}

/// POST /v1/check-availability
pub async fn check_availability(
    State(state): State<AppState>,
    Json(request): Json<CheckAvailabilityRequest>,
) -> HandlerResult<AvailabilityCheck> {
    let technician_id = request
        .technician_id
        .ok_or_else(|| SchedulingError::validation("technicianId", "is required"))?;
    let start = request.start()?;

    let check = state
        .service
        .check_availability(
            TechnicianId::new(technician_id),
            start,
            request.duration_minutes,
            request.suburb.as_deref(),
        )
        .await?;
    Ok(Json(check))
}

// =============================================================================
// Inspections
// =============================================================================

/// POST /v1/inspections
pub async fn create_inspection(
    State(state): State<AppState>,
    Json(request): Json<CreateInspectionRequest>,
) -> CreatedResult<Booking> {
    let booking = state.service.create(request.into_request()?).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// POST /v1/inspections/{id}/start
pub async fn start_inspection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Booking> {
    Ok(Json(state.service.start_inspection(BookingId::new(id)).await?))
}

/// POST /v1/inspections/{id}/complete
pub async fn complete_inspection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CompleteInspectionRequest>,
) -> HandlerResult<Booking> {
    let booking = state
        .service
        .complete_inspection(BookingId::new(id), request.into())
        .await?;
    Ok(Json(booking))
}

/// POST /v1/inspections/check-conflicts
///
/// Read-only: reports every conflict plus alternatives, never writes.
pub async fn check_conflicts(
    State(state): State<AppState>,
    Json(request): Json<CheckConflictsRequest>,
) -> HandlerResult<ConflictCheckResponse> {
    let technician_id = request
        .technician_id
        .ok_or_else(|| SchedulingError::validation("technicianId", "is required"))?;
    let start = required_datetime("scheduledAt", request.scheduled_at.as_deref())?;
    let suburb = required_param("suburb", request.suburb.as_deref())?;

    let report = state
        .service
        .check_conflicts(TechnicianId::new(technician_id), start, request.duration, suburb)
        .await?;
    Ok(Json(ConflictCheckResponse {
        has_conflicts: report.has_conflicts(),
        report,
    }))
}

/// POST /v1/inspections/optimal-assignment
pub async fn optimal_assignment(
    State(state): State<AppState>,
    Json(request): Json<OptimalAssignmentRequest>,
) -> HandlerResult<AssignmentResponse> {
    let suburb = required_param("suburb", request.suburb.as_deref())?.to_string();
    let scheduled_at = required_datetime("scheduledAt", request.scheduled_at.as_deref())?;

    let assignment = state
        .service
        .optimal_assignment(&suburb, scheduled_at, request.service_type.as_deref())
        .await?;
    Ok(Json(AssignmentResponse {
        suburb,
        scheduled_at,
        service_type: request.service_type,
        assignment,
    }))
}

/// GET /v1/inspections/available-slots
pub async fn available_inspection_slots(
    State(state): State<AppState>,
    Query(query): Query<AvailableSlotsQuery>,
) -> HandlerResult<Vec<TechnicianSlot>> {
    let date = parse_date("date", required_param("date", query.date.as_deref())?)?;
    let suburb = required_param("suburb", query.suburb.as_deref())?;
    let slots = state
        .service
        .inspection_slots(date, suburb, query.duration_minutes)
        .await?;
    Ok(Json(slots))
}

// =============================================================================
// Audit and routes
// =============================================================================

/// GET /v1/conflicts
///
/// Retrospective audit of overlapping bookings already in the store.
pub async fn list_conflicts(
    State(state): State<AppState>,
    Query(query): Query<ConflictsQuery>,
) -> HandlerResult<ConflictAuditResponse> {
    let date_from = parse_optional_date("dateFrom", query.date_from.as_deref())?;
    let date_to = parse_optional_date("dateTo", query.date_to.as_deref())?;

    let conflicts = state
        .service
        .audit_conflicts(query.technician_id.map(TechnicianId::new), date_from, date_to)
        .await?;
    let total = conflicts.len();
    Ok(Json(ConflictAuditResponse { conflicts, total }))
}

/// GET /v1/technicians/{id}/route
pub async fn get_daily_route(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<RouteQuery>,
) -> HandlerResult<DailyRoute> {
    let date = parse_date("date", required_param("date", query.date.as_deref())?)?;
    let route = state.service.daily_route(TechnicianId::new(id), date).await?;
    Ok(Json(route))
}
