//! Booking lifecycle orchestration.
//!
//! Every mutation follows the same sequence:
//!
//! 1. load and validate the referenced entities
//! 2. take the technician lease
//! 3. read the technician's day and run the conflict rules
//! 4. write, release the lease, then notify
//!
//! The store's overlap constraint backs up step 3: a write that still races
//! through surfaces as [`SchedulingError::Concurrency`].

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{SchedulingError, SchedulingResult};
use super::notifications::{BookingEvent, NotificationKind, NotificationSink};
use crate::db::{BookingFilter, FullRepository, RepositoryError, TechnicianLease};
use crate::models::{
    Booking, BookingId, BookingKind, BookingStatus, InspectionDetails, LeadId, NewBooking,
    ServiceLocation, Slot, SlotUnavailableReason, Technician, TechnicianId, TechnicianSlot,
    TimeWindow,
};
use crate::scheduling::{
    audit_overlaps, plan_route, Assignment, Conflict, ConflictKind, ConflictReport, DailyRoute,
    OverlapConflict, ProposedBooking, SchedulingEngine, TechnicianCandidate,
};

/// Longest booking the service accepts.
pub const MAX_DURATION_MINUTES: u32 = 12 * 60;

/// Message returned when a confirmation re-check fails.
pub const SLOT_NO_LONGER_AVAILABLE: &str =
    "This time slot is no longer available. Please choose another time.";

/// Inspection-specific part of a booking request.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionRequest {
    pub service_type: String,
    pub estimated_cost: Option<f64>,
}

/// Input for `create` and `confirm_slot`.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub technician_id: TechnicianId,
    pub lead_id: LeadId,
    pub start: NaiveDateTime,
    /// Falls back to the configured default duration.
    pub duration_minutes: Option<u32>,
    pub address: String,
    pub suburb: String,
    pub notes: Option<String>,
    pub inspection: Option<InspectionRequest>,
}

/// Changes applied by `reschedule`. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingChanges {
    pub start: Option<NaiveDateTime>,
    pub duration_minutes: Option<u32>,
    pub technician_id: Option<TechnicianId>,
    pub address: Option<String>,
    pub suburb: Option<String>,
    pub notes: Option<String>,
}

impl BookingChanges {
    pub fn move_to(start: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of an inspection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionOutcome {
    pub findings: Option<String>,
    pub recommendations: Option<String>,
    pub final_cost: Option<f64>,
}

/// Outcome of a single-slot availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCheck {
    pub available: bool,
    pub slot: Slot,
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub booking_id: BookingId,
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRescheduleOutcome {
    pub successful: Vec<Booking>,
    pub failed: Vec<BulkFailure>,
}

/// The booking lifecycle manager.
#[derive(Clone)]
pub struct BookingService {
    repository: Arc<dyn FullRepository>,
    engine: Arc<SchedulingEngine>,
    notifier: Arc<dyn NotificationSink>,
}

impl BookingService {
    pub fn new(
        repository: Arc<dyn FullRepository>,
        engine: Arc<SchedulingEngine>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            repository,
            engine,
            notifier,
        }
    }

    pub fn engine(&self) -> &SchedulingEngine {
        &self.engine
    }

    pub async fn health_check(&self) -> SchedulingResult<bool> {
        Ok(self.repository.health_check().await?)
    }

    // ==================== Queries ====================

    pub async fn get_booking(&self, id: BookingId) -> SchedulingResult<Booking> {
        Ok(self.repository.get_booking(id).await?)
    }

    pub async fn list_bookings(&self, filter: &BookingFilter) -> SchedulingResult<Vec<Booking>> {
        validate_range(filter.date_from, filter.date_to)?;
        Ok(self.repository.list_bookings(filter).await?)
    }

    /// Slots of one technician-day on the general grid.
    pub async fn availability(
        &self,
        technician_id: TechnicianId,
        date: NaiveDate,
        duration_minutes: Option<u32>,
        granularity_minutes: Option<u32>,
    ) -> SchedulingResult<Vec<Slot>> {
        let duration = self.resolve_duration(duration_minutes)?;
        let mut grid = self.engine.grids().general;
        if let Some(granularity) = granularity_minutes {
            if granularity == 0 {
                return Err(SchedulingError::validation(
                    "granularityMinutes",
                    "must be greater than zero",
                ));
            }
            grid.granularity_minutes = granularity;
        }

        self.repository.get_technician(technician_id).await?;
        let existing = self
            .repository
            .bookings_for_technician_on(technician_id, date)
            .await?;

        Ok(self
            .engine
            .slot_generator()
            .generate_on_grid(date, duration, &grid, &existing)
            .collect())
    }

    /// Whether one slot is free. With a suburb the full rule set runs,
    /// otherwise only business hours and overlap are checked.
    pub async fn check_availability(
        &self,
        technician_id: TechnicianId,
        start: NaiveDateTime,
        duration_minutes: Option<u32>,
        suburb: Option<&str>,
    ) -> SchedulingResult<AvailabilityCheck> {
        let duration = self.resolve_duration(duration_minutes)?;
        self.repository.get_technician(technician_id).await?;
        let existing = self
            .repository
            .bookings_for_technician_on(technician_id, start.date())
            .await?;
        let window = TimeWindow::from_start(start, duration);

        let check = match suburb.map(str::trim).filter(|s| !s.is_empty()) {
            Some(suburb) => {
                let proposal = ProposedBooking::new(technician_id, start, duration, suburb);
                let report = self.engine.detector().check(&proposal, &existing);
                let slot = match report.conflicts.first() {
                    Some(conflict) => Slot::unavailable(window, unavailable_reason(conflict.kind)),
                    None => Slot::available(window),
                };
                AvailabilityCheck {
                    available: slot.is_available,
                    slot,
                    conflicts: report.conflicts,
                }
            }
            None => {
                let slot = self.engine.slot_generator().evaluate(window, &existing);
                AvailabilityCheck {
                    available: slot.is_available,
                    slot,
                    conflicts: Vec::new(),
                }
            }
        };
        Ok(check)
    }

    /// Full conflict report for a proposal, without mutating anything.
    pub async fn check_conflicts(
        &self,
        technician_id: TechnicianId,
        start: NaiveDateTime,
        duration_minutes: Option<u32>,
        suburb: &str,
    ) -> SchedulingResult<ConflictReport> {
        let duration = self.resolve_duration(duration_minutes)?;
        let suburb = require_text("suburb", suburb)?;
        self.repository.get_technician(technician_id).await?;
        let existing = self
            .repository
            .bookings_for_technician_on(technician_id, start.date())
            .await?;

        let proposal = ProposedBooking::new(technician_id, start, duration, suburb);
        Ok(self.engine.detector().check(&proposal, &existing))
    }

    /// Rank every schedulable technician for a desired start and suburb.
    pub async fn optimal_assignment(
        &self,
        suburb: &str,
        desired: NaiveDateTime,
        service_type: Option<&str>,
    ) -> SchedulingResult<Assignment> {
        let suburb = require_text("suburb", suburb)?;
        let technicians = self.schedulable_technicians().await?;
        if technicians.is_empty() {
            return Err(SchedulingError::not_found("technician", "(none schedulable)"));
        }

        let mut pool = Vec::with_capacity(technicians.len());
        for technician in technicians {
            let bookings = self
                .repository
                .bookings_for_technician_on(technician.id, desired.date())
                .await?;
            pool.push(TechnicianCandidate {
                technician,
                bookings,
            });
        }

        let assignment = self.engine.scorer().rank(desired, &suburb, service_type, &pool);
        if let Some(best) = &assignment.recommended {
            log::debug!(
                "Recommended technician {} for {} at {} (score {})",
                best.technician_id,
                suburb,
                desired,
                best.score
            );
        }
        Ok(assignment)
    }

    /// Fully checked inspection slots on the legacy grid, across technicians.
    ///
    /// Only available slots are returned, ordered by start then technician.
    pub async fn inspection_slots(
        &self,
        date: NaiveDate,
        suburb: &str,
        duration_minutes: Option<u32>,
    ) -> SchedulingResult<Vec<TechnicianSlot>> {
        let suburb = require_text("suburb", suburb)?;
        let grid = self.engine.grids().inspection;
        let duration = match duration_minutes {
            Some(minutes) => self.resolve_duration(Some(minutes))?,
            None => grid.granularity_minutes,
        };

        let mut offered = Vec::new();
        for technician in self.schedulable_technicians().await? {
            let existing = self
                .repository
                .bookings_for_technician_on(technician.id, date)
                .await?;
            let candidates: Vec<Slot> = self
                .engine
                .slot_generator()
                .generate_on_grid(date, duration, &grid, &existing)
                .collect();

            for candidate in candidates {
                let proposal =
                    ProposedBooking::new(technician.id, candidate.window.start, duration, suburb.as_str());
                if self.engine.detector().check(&proposal, &existing).has_conflicts() {
                    continue;
                }
                offered.push(TechnicianSlot {
                    slot: Slot::available(candidate.window),
                    technician_id: technician.id,
                    technician_name: technician.name.clone(),
                });
            }
        }

        offered.sort_by_key(|s| (s.slot.window.start, s.technician_id));
        Ok(offered)
    }

    /// Retrospective overlap audit over stored bookings.
    pub async fn audit_conflicts(
        &self,
        technician_id: Option<TechnicianId>,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> SchedulingResult<Vec<OverlapConflict>> {
        validate_range(date_from, date_to)?;
        if let Some(id) = technician_id {
            self.repository.get_technician(id).await?;
        }
        let filter = BookingFilter {
            technician_id,
            ..Default::default()
        }
        .between(date_from, date_to)
        .active();

        let bookings = self.repository.list_bookings(&filter).await?;
        Ok(audit_overlaps(&bookings))
    }

    pub async fn daily_route(
        &self,
        technician_id: TechnicianId,
        date: NaiveDate,
    ) -> SchedulingResult<DailyRoute> {
        self.repository.get_technician(technician_id).await?;
        let bookings = self
            .repository
            .bookings_for_technician_on(technician_id, date)
            .await?;
        Ok(plan_route(
            self.engine.estimator(),
            date,
            &self.engine.rules().home_base,
            &bookings,
        ))
    }

    // ==================== Lifecycle ====================

    /// Create a PENDING booking (or inspection) after a full conflict check.
    pub async fn create(&self, request: BookingRequest) -> SchedulingResult<Booking> {
        let booking = self.place(request, BookingStatus::Pending).await?;
        log::info!(
            "Created booking {} for technician {} at {}",
            booking.id,
            booking.technician_id,
            booking.window()
        );
        self.emit(NotificationKind::BookingCreated, &booking).await;
        Ok(booking)
    }

    /// Book a customer-chosen slot straight into CONFIRMED.
    ///
    /// A conflict is reported as [`SchedulingError::SlotUnavailable`] rather
    /// than a full report, since the caller is a customer-facing flow.
    pub async fn confirm_slot(&self, request: BookingRequest) -> SchedulingResult<Booking> {
        let booking = match self.place(request, BookingStatus::Confirmed).await {
            Ok(booking) => booking,
            Err(SchedulingError::Conflict(report)) => {
                log::warn!("Slot confirmation rejected: {}", report.summary());
                return Err(SchedulingError::SlotUnavailable(SLOT_NO_LONGER_AVAILABLE.to_string()));
            }
            Err(other) => return Err(other),
        };
        log::info!("Confirmed new booking {} at {}", booking.id, booking.window());
        self.emit(NotificationKind::BookingConfirmed, &booking).await;
        Ok(booking)
    }

    /// PENDING to CONFIRMED, re-checking the slot against current data.
    pub async fn confirm(&self, id: BookingId) -> SchedulingResult<Booking> {
        let current = self.repository.get_booking(id).await?;
        if current.status == BookingStatus::Confirmed {
            return Ok(current);
        }
        ensure_transition(current.status, BookingStatus::Confirmed)?;

        let lease = self
            .repository
            .acquire_technician_lease(current.technician_id)
            .await?;
        let mut booking = self.repository.get_booking(id).await?;
        ensure_transition(booking.status, BookingStatus::Confirmed)?;

        let report = self.check_existing(&booking).await?;
        if report.has_conflicts() {
            log::warn!("Confirmation of booking {} rejected: {}", id, report.summary());
            return Err(SchedulingError::SlotUnavailable(SLOT_NO_LONGER_AVAILABLE.to_string()));
        }

        booking.status = BookingStatus::Confirmed;
        let booking = self.store_update(&booking).await?;
        drop(lease);

        log::info!("Confirmed booking {}", booking.id);
        self.emit(NotificationKind::BookingConfirmed, &booking).await;
        Ok(booking)
    }

    /// Move or edit a booking. The new slot is checked without the booking's
    /// own prior interval; on failure nothing changes.
    pub async fn reschedule(&self, id: BookingId, changes: BookingChanges) -> SchedulingResult<Booking> {
        if changes.is_empty() {
            return Err(SchedulingError::validation("request", "no changes supplied"));
        }
        let current = self.repository.get_booking(id).await?;
        ensure_reschedulable(&current)?;

        let mut updated = current.clone();
        if let Some(technician_id) = changes.technician_id {
            let technician = self.repository.get_technician(technician_id).await?;
            ensure_schedulable(&technician)?;
            updated.technician_id = technician_id;
        }
        if let Some(start) = changes.start {
            updated.set_start(start);
        }
        if let Some(minutes) = changes.duration_minutes {
            updated.duration_minutes = self.resolve_duration(Some(minutes))?;
        }
        if let Some(address) = changes.address.as_deref() {
            updated.location.address = require_text("address", address)?;
        }
        if let Some(suburb) = changes.suburb.as_deref() {
            updated.location.suburb = require_text("suburb", suburb)?;
        }
        if let Some(notes) = changes.notes {
            updated.notes = Some(notes);
        }

        // Lock both calendars in id order when switching technicians.
        let mut technicians = vec![current.technician_id, updated.technician_id];
        technicians.sort();
        technicians.dedup();
        let mut leases = Vec::with_capacity(technicians.len());
        for technician_id in technicians {
            leases.push(self.repository.acquire_technician_lease(technician_id).await?);
        }

        let fresh = self.repository.get_booking(id).await?;
        ensure_reschedulable(&fresh)?;
        if fresh.updated_at != current.updated_at {
            return Err(SchedulingError::Concurrency(format!(
                "booking {} was modified concurrently",
                id
            )));
        }

        let report = self.check_existing(&updated).await?;
        if report.has_conflicts() {
            log::warn!("Reschedule of booking {} rejected: {}", id, report.summary());
            return Err(SchedulingError::conflict(report));
        }

        let booking = self.store_update(&updated).await?;
        drop(leases);

        let moved = current.window() != booking.window()
            || current.technician_id != booking.technician_id
            || current.location != booking.location;
        if moved {
            log::info!(
                "Rescheduled booking {} from {} to {}",
                booking.id,
                current.window(),
                booking.window()
            );
            let event = BookingEvent::new(NotificationKind::ScheduleChanged, &booking)
                .with_previous_window(current.window());
            self.deliver(event).await;
        }
        Ok(booking)
    }

    /// Cancel a booking. Never blocked by conflicts; cancelling twice is a no-op.
    pub async fn cancel(&self, id: BookingId, reason: Option<String>) -> SchedulingResult<Booking> {
        let current = self.repository.get_booking(id).await?;
        if current.status == BookingStatus::Cancelled {
            return Ok(current);
        }
        ensure_transition(current.status, BookingStatus::Cancelled)?;

        let lease = self
            .repository
            .acquire_technician_lease(current.technician_id)
            .await?;
        let mut booking = self.repository.get_booking(id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }
        ensure_transition(booking.status, BookingStatus::Cancelled)?;

        booking.status = BookingStatus::Cancelled;
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            booking.notes = Some(match booking.notes.take() {
                Some(notes) => format!("{}\nCancelled: {}", notes, reason.trim()),
                None => format!("Cancelled: {}", reason.trim()),
            });
        }
        let booking = self.store_update(&booking).await?;
        drop(lease);

        log::info!("Cancelled booking {}", booking.id);
        self.emit(NotificationKind::BookingCancelled, &booking).await;
        Ok(booking)
    }

    /// CONFIRMED to IN_PROGRESS for inspections.
    pub async fn start_inspection(&self, id: BookingId) -> SchedulingResult<Booking> {
        let (mut booking, lease) = self
            .lock_inspection_for(id, BookingStatus::InProgress)
            .await?;

        booking.status = BookingStatus::InProgress;
        let now = now();
        if let Some(details) = booking.inspection_mut() {
            details.started_at = Some(now);
        }
        let booking = self.store_update(&booking).await?;
        drop(lease);

        log::info!("Inspection {} started", booking.id);
        self.emit(NotificationKind::InspectionStarted, &booking).await;
        Ok(booking)
    }

    /// CONFIRMED or IN_PROGRESS to COMPLETED, recording the findings.
    pub async fn complete_inspection(
        &self,
        id: BookingId,
        outcome: InspectionOutcome,
    ) -> SchedulingResult<Booking> {
        if outcome.final_cost.is_some_and(|cost| !cost.is_finite() || cost < 0.0) {
            return Err(SchedulingError::validation(
                "finalCost",
                "must be a non-negative amount",
            ));
        }
        let (mut booking, lease) = self
            .lock_inspection_for(id, BookingStatus::Completed)
            .await?;

        booking.status = BookingStatus::Completed;
        let now = now();
        if let Some(details) = booking.inspection_mut() {
            details.started_at.get_or_insert(now);
            details.completed_at = Some(now);
            if outcome.findings.is_some() {
                details.findings = outcome.findings;
            }
            if outcome.recommendations.is_some() {
                details.recommendations = outcome.recommendations;
            }
            if outcome.final_cost.is_some() {
                details.final_cost = outcome.final_cost;
            }
        }
        let booking = self.store_update(&booking).await?;
        drop(lease);

        log::info!("Inspection {} completed", booking.id);
        self.emit(NotificationKind::InspectionCompleted, &booking).await;
        Ok(booking)
    }

    /// Move each booking to the same time on `new_date`, one at a time.
    pub async fn bulk_reschedule(
        &self,
        ids: &[BookingId],
        new_date: NaiveDate,
    ) -> SchedulingResult<BulkRescheduleOutcome> {
        if ids.is_empty() {
            return Err(SchedulingError::validation("bookingIds", "must not be empty"));
        }

        let mut outcome = BulkRescheduleOutcome::default();
        for &id in ids {
            let result = match self.repository.get_booking(id).await {
                Ok(booking) => {
                    let start = new_date.and_time(booking.scheduled_time);
                    self.reschedule(id, BookingChanges::move_to(start)).await
                }
                Err(err) => Err(err.into()),
            };
            match result {
                Ok(booking) => outcome.successful.push(booking),
                Err(err) => outcome.failed.push(BulkFailure {
                    booking_id: id,
                    code: err.code().to_string(),
                    reason: err.to_string(),
                }),
            }
        }

        log::info!(
            "Bulk reschedule to {}: {} moved, {} failed",
            new_date,
            outcome.successful.len(),
            outcome.failed.len()
        );
        Ok(outcome)
    }

    // ==================== Helpers ====================

    /// Shared path of `create` and `confirm_slot`.
    async fn place(&self, request: BookingRequest, status: BookingStatus) -> SchedulingResult<Booking> {
        let duration = self.resolve_duration(request.duration_minutes)?;
        let address = require_text("propertyAddress", &request.address)?;
        let suburb = require_text("suburb", &request.suburb)?;
        let kind = match request.inspection {
            Some(inspection) => BookingKind::Inspection(InspectionDetails {
                service_type: require_text("serviceType", &inspection.service_type)?,
                estimated_cost: inspection.estimated_cost,
                ..Default::default()
            }),
            None => BookingKind::Appointment,
        };

        let technician = self.repository.get_technician(request.technician_id).await?;
        ensure_schedulable(&technician)?;
        let lead = self.repository.get_lead(request.lead_id).await?;

        let new_booking = NewBooking {
            technician_id: technician.id,
            lead_id: lead.id,
            customer_name: lead.full_name(),
            location: ServiceLocation { address, suburb },
            start: request.start,
            duration_minutes: duration,
            status,
            notes: request.notes,
            kind,
        };

        let lease = self
            .repository
            .acquire_technician_lease(technician.id)
            .await?;
        let existing = self
            .repository
            .bookings_for_technician_on(technician.id, request.start.date())
            .await?;
        let proposal = ProposedBooking::new(
            technician.id,
            new_booking.start,
            duration,
            new_booking.location.suburb.as_str(),
        );
        let report = self.engine.detector().check(&proposal, &existing);
        if report.has_conflicts() {
            log::warn!(
                "Booking request for technician {} at {} rejected: {}",
                technician.id,
                new_booking.window(),
                report.summary()
            );
            return Err(SchedulingError::conflict(report));
        }

        let booking = self
            .repository
            .insert_booking(new_booking)
            .await
            .map_err(concurrency_aware("insert_booking"))?;
        drop(lease);
        Ok(booking)
    }

    /// Load an inspection under its technician's lease, ready to move to `next`.
    ///
    /// The booking is re-read once the lease is held; a status or edit that
    /// landed in between wins over the caller.
    async fn lock_inspection_for(
        &self,
        id: BookingId,
        next: BookingStatus,
    ) -> SchedulingResult<(Booking, TechnicianLease)> {
        let current = self.repository.get_booking(id).await?;
        ensure_inspection(&current)?;
        ensure_transition(current.status, next)?;

        let lease = self
            .repository
            .acquire_technician_lease(current.technician_id)
            .await?;
        let fresh = self.repository.get_booking(id).await?;
        ensure_transition(fresh.status, next)?;
        if fresh.updated_at != current.updated_at || fresh.technician_id != current.technician_id {
            return Err(SchedulingError::Concurrency(format!(
                "booking {} was modified concurrently",
                id
            )));
        }
        Ok((fresh, lease))
    }

    /// Conflict report for a stored booking, ignoring its own interval.
    async fn check_existing(&self, booking: &Booking) -> SchedulingResult<ConflictReport> {
        let existing = self
            .repository
            .bookings_for_technician_on(booking.technician_id, booking.scheduled_date)
            .await?;
        let proposal = ProposedBooking::new(
            booking.technician_id,
            booking.start(),
            booking.duration_minutes,
            booking.location.suburb.as_str(),
        )
        .excluding(booking.id);
        Ok(self.engine.detector().check(&proposal, &existing))
    }

    async fn store_update(&self, booking: &Booking) -> SchedulingResult<Booking> {
        self.repository
            .update_booking(booking)
            .await
            .map_err(concurrency_aware("update_booking"))
    }

    async fn schedulable_technicians(&self) -> SchedulingResult<Vec<Technician>> {
        Ok(self
            .repository
            .list_technicians()
            .await?
            .into_iter()
            .filter(Technician::is_schedulable)
            .collect())
    }

    fn resolve_duration(&self, requested: Option<u32>) -> SchedulingResult<u32> {
        let minutes = requested.unwrap_or(self.engine.rules().default_duration_minutes);
        if minutes == 0 || minutes > MAX_DURATION_MINUTES {
            return Err(SchedulingError::validation(
                "durationMinutes",
                format!("must be between 1 and {}", MAX_DURATION_MINUTES),
            ));
        }
        Ok(minutes)
    }

    async fn emit(&self, kind: NotificationKind, booking: &Booking) {
        self.deliver(BookingEvent::new(kind, booking)).await;
    }

    async fn deliver(&self, event: BookingEvent) {
        let (kind, booking_id) = (event.kind, event.booking_id);
        if let Err(err) = self.notifier.notify(event).await {
            log::warn!("Failed to deliver {:?} for booking {}: {}", kind, booking_id, err);
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn concurrency_aware(operation: &'static str) -> impl Fn(RepositoryError) -> SchedulingError {
    move |err| {
        if matches!(err, RepositoryError::UniqueViolation { .. }) {
            log::warn!("{} lost a race for the slot: {}", operation, err);
        }
        SchedulingError::from(err)
    }
}

fn require_text(field: &str, value: &str) -> SchedulingResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SchedulingError::validation(field, "is required"));
    }
    Ok(trimmed.to_string())
}

fn validate_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> SchedulingResult<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(SchedulingError::validation(
            "dateTo",
            "must not be earlier than dateFrom",
        )),
        _ => Ok(()),
    }
}

fn ensure_transition(from: BookingStatus, to: BookingStatus) -> SchedulingResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(SchedulingError::InvalidTransition { from, to })
    }
}

fn ensure_schedulable(technician: &Technician) -> SchedulingResult<()> {
    if technician.is_schedulable() {
        Ok(())
    } else {
        Err(SchedulingError::validation(
            "technicianId",
            format!("{} cannot take bookings", technician.name),
        ))
    }
}

fn ensure_inspection(booking: &Booking) -> SchedulingResult<()> {
    if booking.is_inspection() {
        Ok(())
    } else {
        Err(SchedulingError::validation(
            "bookingId",
            format!("booking {} is not an inspection", booking.id),
        ))
    }
}

fn ensure_reschedulable(booking: &Booking) -> SchedulingResult<()> {
    match booking.status {
        BookingStatus::Pending | BookingStatus::Confirmed => Ok(()),
        other => Err(SchedulingError::validation(
            "status",
            format!("a {} booking cannot be rescheduled", other),
        )),
    }
}

fn unavailable_reason(kind: ConflictKind) -> SlotUnavailableReason {
    match kind {
        ConflictKind::OutsideHours => SlotUnavailableReason::OutsideHours,
        ConflictKind::TravelTime => SlotUnavailableReason::TravelTime,
        ConflictKind::DoubleBooking | ConflictKind::Overlap => SlotUnavailableReason::Booked,
    }
}
