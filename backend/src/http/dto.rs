//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies keep every field optional so that a missing field is
//! reported as a field-level validation error instead of a generic JSON
//! rejection. Domain types (`Booking`, `Slot`, `ConflictReport`, ...) are
//! serialized directly in responses.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::db::BookingFilter;
use crate::models::{
    parse_business_datetime, parse_clock_time, Booking, BookingId, BookingStatus, LeadId,
    TechnicianId,
};
use crate::scheduling::{Assignment, ConflictReport, OverlapConflict};
use crate::services::{
    BookingChanges, BookingRequest, InspectionOutcome, InspectionRequest, SchedulingError,
};

pub type DtoResult<T> = Result<T, SchedulingError>;

// =============================================================================
// Field helpers
// =============================================================================

fn required<T>(field: &str, value: Option<T>) -> DtoResult<T> {
    value.ok_or_else(|| SchedulingError::validation(field, "is required"))
}

fn required_text(field: &str, value: Option<String>) -> DtoResult<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(SchedulingError::validation(field, "is required")),
    }
}

pub fn parse_date(field: &str, value: &str) -> DtoResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SchedulingError::validation(field, format!("'{}' is not a YYYY-MM-DD date", value)))
}

pub fn parse_optional_date(field: &str, value: Option<&str>) -> DtoResult<Option<NaiveDate>> {
    value.map(|v| parse_date(field, v)).transpose()
}

fn parse_datetime(field: &str, value: &str) -> DtoResult<NaiveDateTime> {
    parse_business_datetime(value).ok_or_else(|| {
        SchedulingError::validation(field, format!("'{}' is not a valid date-time", value))
    })
}

/// Combine separate `scheduledDate` / `scheduledTime` fields.
fn date_and_time(date: &str, time: &str) -> DtoResult<NaiveDateTime> {
    let day = parse_date("scheduledDate", date)?;
    let clock = parse_clock_time(time).ok_or_else(|| {
        SchedulingError::validation("scheduledTime", format!("'{}' is not an HH:MM time", time))
    })?;
    Ok(day.and_time(clock))
}

// =============================================================================
// Bookings
// =============================================================================

/// Body of `POST /v1/bookings` and `POST /v1/bookings/confirm`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub lead_id: Option<i64>,
    pub technician_id: Option<i64>,
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub property_address: Option<String>,
    #[serde(alias = "suburb")]
    pub melbourne_suburb: Option<String>,
    pub notes: Option<String>,
}

impl CreateBookingRequest {
    pub fn into_request(self) -> DtoResult<BookingRequest> {
        let lead_id = required("leadId", self.lead_id)?;
        let technician_id = required("technicianId", self.technician_id)?;
        let date = required_text("scheduledDate", self.scheduled_date)?;
        let time = required_text("scheduledTime", self.scheduled_time)?;
        let address = required_text("propertyAddress", self.property_address)?;
        let suburb = required_text("melbourneSuburb", self.melbourne_suburb)?;

        Ok(BookingRequest {
            technician_id: TechnicianId::new(technician_id),
            lead_id: LeadId::new(lead_id),
            start: date_and_time(&date, &time)?,
            duration_minutes: self.duration_minutes,
            address,
            suburb,
            notes: self.notes,
            inspection: None,
        })
    }
}

/// Body of `PUT /v1/bookings/{id}`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub technician_id: Option<i64>,
    pub property_address: Option<String>,
    #[serde(alias = "suburb")]
    pub melbourne_suburb: Option<String>,
    pub notes: Option<String>,
}

impl UpdateBookingRequest {
    /// Resolve against the booking being edited, which supplies whichever of
    /// date or time the request leaves out.
    pub fn into_changes(self, current: &Booking) -> DtoResult<BookingChanges> {
        let start = match (self.scheduled_date.as_deref(), self.scheduled_time.as_deref()) {
            (None, None) => None,
            (date, time) => {
                let day = match date {
                    Some(d) => parse_date("scheduledDate", d)?,
                    None => current.scheduled_date,
                };
                let clock = match time {
                    Some(t) => parse_clock_time(t).ok_or_else(|| {
                        SchedulingError::validation("scheduledTime", format!("'{}' is not an HH:MM time", t))
                    })?,
                    None => current.scheduled_time,
                };
                Some(day.and_time(clock))
            }
        };

        Ok(BookingChanges {
            start,
            duration_minutes: self.duration_minutes,
            technician_id: self.technician_id.map(TechnicianId::new),
            address: self.property_address,
            suburb: self.melbourne_suburb,
            notes: self.notes,
        })
    }
}

/// Query of `DELETE /v1/bookings/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelQuery {
    pub reason: Option<String>,
}

/// Soft-fail response of `POST /v1/bookings/confirm`. Always sent with 200.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSlotResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConfirmSlotResponse {
    pub fn confirmed(booking_id: BookingId) -> Self {
        Self {
            success: true,
            booking_id: Some(booking_id),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            booking_id: None,
            message: Some(message.into()),
        }
    }
}

/// Query of `GET /v1/bookings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListQuery {
    pub technician_id: Option<i64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub status: Option<String>,
}

impl BookingListQuery {
    pub fn into_filter(self) -> DtoResult<BookingFilter> {
        let status = self
            .status
            .as_deref()
            .map(|s| {
                s.parse::<BookingStatus>()
                    .map_err(|msg| SchedulingError::validation("status", msg))
            })
            .transpose()?;

        Ok(BookingFilter {
            technician_id: self.technician_id.map(TechnicianId::new),
            date_from: parse_optional_date("dateFrom", self.date_from.as_deref())?,
            date_to: parse_optional_date("dateTo", self.date_to.as_deref())?,
            status,
            active_only: false,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRescheduleRequest {
    #[serde(default)]
    pub booking_ids: Vec<i64>,
    pub new_date: Option<String>,
}

// =============================================================================
// Availability
// =============================================================================

/// Query of `GET /v1/availability`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub technician_id: Option<i64>,
    pub duration_minutes: Option<u32>,
    pub granularity_minutes: Option<u32>,
}

/// Body of `POST /v1/check-availability`.
///
/// The slot is given either as `scheduledAt` or as `scheduledDate` + `scheduledTime`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAvailabilityRequest {
    pub technician_id: Option<i64>,
    pub scheduled_at: Option<String>,
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
    pub duration_minutes: Option<u32>,
    #[serde(alias = "melbourneSuburb")]
    pub suburb: Option<String>,
}

impl CheckAvailabilityRequest {
    pub fn start(&self) -> DtoResult<NaiveDateTime> {
        match (&self.scheduled_at, &self.scheduled_date, &self.scheduled_time) {
            (Some(at), _, _) => parse_datetime("scheduledAt", at),
            (None, Some(date), Some(time)) => date_and_time(date, time),
            _ => Err(SchedulingError::validation(
                "scheduledAt",
                "is required (or scheduledDate and scheduledTime)",
            )),
        }
    }
}

// =============================================================================
// Inspections
// =============================================================================

/// Body of `POST /v1/inspections`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInspectionRequest {
    pub lead_id: Option<i64>,
    pub technician_id: Option<i64>,
    pub scheduled_at: Option<String>,
    #[serde(alias = "duration")]
    pub duration_minutes: Option<u32>,
    pub property_address: Option<String>,
    #[serde(alias = "melbourneSuburb")]
    pub suburb: Option<String>,
    pub service_type: Option<String>,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
}

impl CreateInspectionRequest {
    pub fn into_request(self) -> DtoResult<BookingRequest> {
        let lead_id = required("leadId", self.lead_id)?;
        let technician_id = required("technicianId", self.technician_id)?;
        let scheduled_at = required_text("scheduledAt", self.scheduled_at)?;
        let address = required_text("propertyAddress", self.property_address)?;
        let suburb = required_text("suburb", self.suburb)?;
        let service_type = required_text("serviceType", self.service_type)?;

        if self.estimated_cost.is_some_and(|cost| !cost.is_finite() || cost < 0.0) {
            return Err(SchedulingError::validation(
                "estimatedCost",
                "must be a non-negative amount",
            ));
        }

        Ok(BookingRequest {
            technician_id: TechnicianId::new(technician_id),
            lead_id: LeadId::new(lead_id),
            start: parse_datetime("scheduledAt", &scheduled_at)?,
            duration_minutes: self.duration_minutes,
            address,
            suburb,
            notes: self.notes,
            inspection: Some(InspectionRequest {
                service_type,
                estimated_cost: self.estimated_cost,
            }),
        })
    }
}

/// Body of `POST /v1/inspections/{id}/complete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteInspectionRequest {
    pub findings: Option<String>,
    pub recommendations: Option<String>,
    pub final_cost: Option<f64>,
}

impl From<CompleteInspectionRequest> for InspectionOutcome {
    fn from(req: CompleteInspectionRequest) -> Self {
        Self {
            findings: req.findings,
            recommendations: req.recommendations,
            final_cost: req.final_cost,
        }
    }
}

/// Body of `POST /v1/inspections/check-conflicts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckConflictsRequest {
    pub technician_id: Option<i64>,
    pub scheduled_at: Option<String>,
    pub suburb: Option<String>,
    #[serde(alias = "durationMinutes")]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckResponse {
    pub has_conflicts: bool,
    #[serde(flatten)]
    pub report: ConflictReport,
}

/// Body of `POST /v1/inspections/optimal-assignment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalAssignmentRequest {
    pub suburb: Option<String>,
    pub scheduled_at: Option<String>,
    pub service_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub suburb: String,
    pub scheduled_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(flatten)]
    pub assignment: Assignment,
}

/// Query of `GET /v1/inspections/available-slots`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsQuery {
    pub date: Option<String>,
    pub suburb: Option<String>,
    pub duration_minutes: Option<u32>,
}

// =============================================================================
// Audit and routes
// =============================================================================

/// Query of `GET /v1/conflicts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictsQuery {
    pub technician_id: Option<i64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictAuditResponse {
    pub conflicts: Vec<OverlapConflict>,
    pub total: usize,
}

/// Query of `GET /v1/technicians/{id}/route`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteQuery {
    pub date: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Store connection status
    pub database: String,
}
