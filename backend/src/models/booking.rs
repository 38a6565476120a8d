//! Bookings and their inspection variant.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::time::{hhmm, TimeWindow};
use super::{BookingId, LeadId, TechnicianId};

/// Lifecycle state of a booking.
///
/// ```text
/// PENDING ──► CONFIRMED ──► IN_PROGRESS ──► COMPLETED   (inspections only past CONFIRMED)
///    │            │              │
///    └────────────┴──────────────┴──► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether this booking still occupies the technician's calendar.
    pub fn is_active(self) -> bool {
        self != Self::Cancelled
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Completed)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

/// Inspection-facing view of a booking's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl From<BookingStatus> for InspectionStatus {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending | BookingStatus::Confirmed => Self::Scheduled,
            BookingStatus::InProgress => Self::InProgress,
            BookingStatus::Completed => Self::Completed,
            BookingStatus::Cancelled => Self::Cancelled,
        }
    }
}

/// Findings and cost payload carried by inspection bookings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionDetails {
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
}

/// What kind of visit a booking represents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BookingKind {
    #[default]
    Appointment,
    Inspection(InspectionDetails),
}

/// Where the visit takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLocation {
    pub address: String,
    pub suburb: String,
}

/// A technician visit occupying a wall-clock interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub technician_id: TechnicianId,
    pub lead_id: LeadId,
    pub customer_name: String,
    pub location: ServiceLocation,
    pub scheduled_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub scheduled_time: NaiveTime,
    pub duration_minutes: u32,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub kind: BookingKind,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn start(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::from_start(self.start(), self.duration_minutes)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_inspection(&self) -> bool {
        matches!(self.kind, BookingKind::Inspection(_))
    }

    pub fn inspection(&self) -> Option<&InspectionDetails> {
        match &self.kind {
            BookingKind::Inspection(details) => Some(details),
            BookingKind::Appointment => None,
        }
    }

    pub fn inspection_mut(&mut self) -> Option<&mut InspectionDetails> {
        match &mut self.kind {
            BookingKind::Inspection(details) => Some(details),
            BookingKind::Appointment => None,
        }
    }

    pub fn inspection_status(&self) -> Option<InspectionStatus> {
        self.is_inspection().then(|| self.status.into())
    }

    /// Move the booking to a new start while keeping its duration.
    pub fn set_start(&mut self, start: NaiveDateTime) {
        self.scheduled_date = start.date();
        self.scheduled_time = start.time();
    }
}

/// A booking that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub technician_id: TechnicianId,
    pub lead_id: LeadId,
    pub customer_name: String,
    pub location: ServiceLocation,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub kind: BookingKind,
}

impl NewBooking {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::from_start(self.start, self.duration_minutes)
    }

    /// Materialize the booking with a store-assigned id and timestamp.
    pub fn into_booking(self, id: BookingId, now: NaiveDateTime) -> Booking {
        Booking {
            id,
            technician_id: self.technician_id,
            lead_id: self.lead_id,
            customer_name: self.customer_name,
            location: self.location,
            scheduled_date: self.start.date(),
            scheduled_time: self.start.time(),
            duration_minutes: self.duration_minutes,
            status: self.status,
            notes: self.notes,
            kind: self.kind,
            created_at: now,
            updated_at: now,
        }
    }
}
