//! Pre-booking conflict detection and the retrospective overlap audit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::slots::SlotGenerator;
use super::travel::{NearbySuburb, TravelTimeEstimator};
use crate::models::{Booking, BookingId, BookingStatus, BusinessHours, Slot, TechnicianId, TimeWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    OutsideHours,
    DoubleBooking,
    TravelTime,
    /// Two existing bookings overlap (audit only).
    Overlap,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutsideHours => "OUTSIDE_HOURS",
            Self::DoubleBooking => "DOUBLE_BOOKING",
            Self::TravelTime => "TRAVEL_TIME",
            Self::Overlap => "OVERLAP",
        }
    }
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule violation found for a proposed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub kind: ConflictKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
    /// Interval of the conflicting booking, or of the proposal for hours violations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_gap_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_gap_minutes: Option<i64>,
}

impl Conflict {
    fn outside_hours(window: &TimeWindow, hours: &BusinessHours) -> Self {
        Self {
            kind: ConflictKind::OutsideHours,
            message: format!(
                "Requested time {}-{} is outside business hours ({}-{})",
                window.start.format("%H:%M"),
                window.end.format("%H:%M"),
                hours.open.format("%H:%M"),
                hours.close.format("%H:%M"),
            ),
            booking_id: None,
            customer_name: None,
            suburb: None,
            window: Some(*window),
            required_gap_minutes: None,
            actual_gap_minutes: None,
        }
    }

    fn double_booking(existing: &Booking) -> Self {
        let window = existing.window();
        Self {
            kind: ConflictKind::DoubleBooking,
            message: format!(
                "Technician is already booked with {} at {}",
                existing.customer_name, window
            ),
            booking_id: Some(existing.id),
            customer_name: Some(existing.customer_name.clone()),
            suburb: Some(existing.location.suburb.clone()),
            window: Some(window),
            required_gap_minutes: None,
            actual_gap_minutes: None,
        }
    }

    fn travel_time(existing: &Booking, required: i64, actual: i64) -> Self {
        let window = existing.window();
        Self {
            kind: ConflictKind::TravelTime,
            message: format!(
                "Insufficient travel time to/from {} booking with {} at {}: {} minutes needed, {} available",
                existing.location.suburb, existing.customer_name, window, required, actual
            ),
            booking_id: Some(existing.id),
            customer_name: Some(existing.customer_name.clone()),
            suburb: Some(existing.location.suburb.clone()),
            window: Some(window),
            required_gap_minutes: Some(required),
            actual_gap_minutes: Some(actual),
        }
    }
}

/// A booking the caller wants to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedBooking {
    pub technician_id: TechnicianId,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    pub suburb: String,
    /// Booking being moved; its current interval is ignored.
    pub exclude: Option<BookingId>,
}

impl ProposedBooking {
    pub fn new(
        technician_id: TechnicianId,
        start: NaiveDateTime,
        duration_minutes: u32,
        suburb: impl Into<String>,
    ) -> Self {
        Self {
            technician_id,
            start,
            duration_minutes,
            suburb: suburb.into(),
            exclude: None,
        }
    }

    pub fn excluding(mut self, booking_id: BookingId) -> Self {
        self.exclude = Some(booking_id);
        self
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::from_start(self.start, self.duration_minutes)
    }
}

/// Everything found while checking a proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub suggested_alternatives: Vec<Slot>,
    pub nearby_suburbs: Vec<NearbySuburb>,
}

impl ConflictReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn has(&self, kind: ConflictKind) -> bool {
        self.conflicts.iter().any(|c| c.kind == kind)
    }

    /// Distinct conflict kinds in report order.
    pub fn kinds(&self) -> Vec<ConflictKind> {
        let mut kinds = Vec::new();
        for conflict in &self.conflicts {
            if !kinds.contains(&conflict.kind) {
                kinds.push(conflict.kind);
            }
        }
        kinds
    }

    /// One-line summary for logs and error messages.
    pub fn summary(&self) -> String {
        if self.conflicts.is_empty() {
            return "no conflicts".to_string();
        }
        self.conflicts
            .iter()
            .map(|c| c.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Runs the business-hours, double-booking and travel-time rules.
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    hours: BusinessHours,
    estimator: TravelTimeEstimator,
    slots: SlotGenerator,
    alternative_offsets_hours: Vec<i64>,
    max_alternatives: usize,
    nearby_minutes: u32,
}

impl ConflictDetector {
    pub fn new(
        hours: BusinessHours,
        estimator: TravelTimeEstimator,
        alternative_offsets_hours: Vec<i64>,
        max_alternatives: usize,
        nearby_minutes: u32,
    ) -> Self {
        Self {
            hours,
            estimator,
            slots: SlotGenerator::new(hours),
            alternative_offsets_hours,
            max_alternatives,
            nearby_minutes,
        }
    }

    /// Check a proposal against existing bookings.
    ///
    /// Bookings of other technicians, cancelled bookings and the excluded
    /// booking are ignored. All applicable conflicts are reported. A booking
    /// already reported as a double booking is not checked for travel time.
    pub fn check(&self, proposed: &ProposedBooking, existing: &[Booking]) -> ConflictReport {
        let window = proposed.window();
        let relevant: Vec<Booking> = existing
            .iter()
            .filter(|b| {
                b.technician_id == proposed.technician_id
                    && b.is_active()
                    && Some(b.id) != proposed.exclude
            })
            .cloned()
            .collect();

        let mut conflicts = Vec::new();

        if !self.hours.contains(&window) {
            conflicts.push(Conflict::outside_hours(&window, &self.hours));
        }

        let mut overlapping = HashSet::new();
        for booking in &relevant {
            if booking.window().overlaps(&window) {
                overlapping.insert(booking.id);
                conflicts.push(Conflict::double_booking(booking));
            }
        }

        for booking in &relevant {
            if overlapping.contains(&booking.id) || booking.scheduled_date != window.date() {
                continue;
            }
            let required = i64::from(
                self.estimator
                    .estimate(&booking.location.suburb, &proposed.suburb),
            );
            let actual = window.gap_minutes(&booking.window());
            if actual < required {
                conflicts.push(Conflict::travel_time(booking, required, actual));
            }
        }

        let suggested_alternatives = if conflicts.is_empty() {
            Vec::new()
        } else {
            log::debug!(
                "Proposal for technician {} at {} has {} conflict(s)",
                proposed.technician_id,
                window,
                conflicts.len()
            );
            self.suggest_alternatives(&window, &relevant)
        };

        ConflictReport {
            conflicts,
            suggested_alternatives,
            nearby_suburbs: self.estimator.nearby(&proposed.suburb, self.nearby_minutes),
        }
    }

    /// Shifted windows (+1h, -1h, +2h, ...) that fit business hours and overlap
    /// nothing. Travel time is not re-checked for these suggestions.
    fn suggest_alternatives(&self, window: &TimeWindow, relevant: &[Booking]) -> Vec<Slot> {
        self.alternative_offsets_hours
            .iter()
            .flat_map(|&hours| [hours, -hours])
            .map(|hours| window.shifted(hours * 60))
            .map(|candidate| self.slots.evaluate(candidate, relevant))
            .filter(|slot| slot.is_available)
            .take(self.max_alternatives)
            .collect()
    }
}

/// Lightweight view of a booking inside an audit finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRef {
    pub id: BookingId,
    pub customer_name: String,
    pub suburb: String,
    pub window: TimeWindow,
    pub status: BookingStatus,
}

impl From<&Booking> for BookingRef {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            customer_name: booking.customer_name.clone(),
            suburb: booking.location.suburb.clone(),
            window: booking.window(),
            status: booking.status,
        }
    }
}

/// Two stored bookings of one technician whose intervals overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapConflict {
    pub kind: ConflictKind,
    pub technician_id: TechnicianId,
    pub first: BookingRef,
    pub second: BookingRef,
    pub overlap_minutes: i64,
    pub message: String,
}

/// Find every overlapping pair of active bookings, per technician.
///
/// Results are ordered by technician, then by the first booking's start.
pub fn audit_overlaps(bookings: &[Booking]) -> Vec<OverlapConflict> {
    let mut by_technician: BTreeMap<TechnicianId, Vec<&Booking>> = BTreeMap::new();
    for booking in bookings.iter().filter(|b| b.is_active()) {
        by_technician.entry(booking.technician_id).or_default().push(booking);
    }

    let mut findings = Vec::new();
    for (technician_id, mut list) in by_technician {
        list.sort_by_key(|b| (b.start(), b.id));
        for (i, first) in list.iter().enumerate() {
            let first_window = first.window();
            for second in list.iter().skip(i + 1) {
                let second_window = second.window();
                if second_window.start >= first_window.end {
                    break;
                }
                if !first_window.overlaps(&second_window) {
                    continue;
                }
                findings.push(OverlapConflict {
                    kind: ConflictKind::Overlap,
                    technician_id,
                    first: BookingRef::from(*first),
                    second: BookingRef::from(*second),
                    overlap_minutes: -first_window.gap_minutes(&second_window),
                    message: format!(
                        "{} ({}) overlaps {} ({})",
                        first.customer_name, first_window, second.customer_name, second_window
                    ),
                });
            }
        }
    }
    findings
}
