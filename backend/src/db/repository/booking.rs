//! Booking repository trait.
//!
//! The scheduling service reads a technician's day, runs the conflict rules
//! and writes the result. Implementations must make that sequence safe under
//! concurrency, which they do with two guarantees:
//!
//! 1. [`BookingRepository::acquire_technician_lease`] serializes writers per
//!    technician. Different technicians never wait on each other.
//! 2. Inserts and updates that would make two active bookings of the same
//!    technician overlap fail with [`RepositoryError::UniqueViolation`], even
//!    when the caller skipped the lease.
//!
//! [`RepositoryError::UniqueViolation`]: super::RepositoryError::UniqueViolation

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{Booking, BookingId, BookingStatus, NewBooking, TechnicianId};

/// Exclusive right to mutate one technician's calendar. Released on drop.
pub struct TechnicianLease {
    technician_id: TechnicianId,
    _guard: Box<dyn Send + Sync>,
}

impl TechnicianLease {
    pub fn new(technician_id: TechnicianId, guard: Box<dyn Send + Sync>) -> Self {
        Self {
            technician_id,
            _guard: guard,
        }
    }

    pub fn technician_id(&self) -> TechnicianId {
        self.technician_id
    }
}

impl std::fmt::Debug for TechnicianLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TechnicianLease")
            .field("technician_id", &self.technician_id)
            .finish()
    }
}

/// Criteria for listing bookings. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub technician_id: Option<TechnicianId>,
    /// Inclusive lower bound on the scheduled date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the scheduled date.
    pub date_to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    pub active_only: bool,
}

impl BookingFilter {
    pub fn for_technician(technician_id: TechnicianId) -> Self {
        Self {
            technician_id: Some(technician_id),
            ..Default::default()
        }
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn active(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.technician_id.map_or(true, |id| booking.technician_id == id)
            && self.date_from.map_or(true, |from| booking.scheduled_date >= from)
            && self.date_to.map_or(true, |to| booking.scheduled_date <= to)
            && self.status.map_or(true, |status| booking.status == status)
            && (!self.active_only || booking.is_active())
    }
}

/// Repository trait for booking storage.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Check whether the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Persist a new booking and return it with its assigned id.
    ///
    /// # Errors
    /// * `UniqueViolation` - an active booking of the same technician overlaps
    async fn insert_booking(&self, booking: NewBooking) -> RepositoryResult<Booking>;

    /// Fetch one booking.
    ///
    /// # Errors
    /// * `NotFound` - no booking with this id
    async fn get_booking(&self, id: BookingId) -> RepositoryResult<Booking>;

    /// Replace a stored booking. `updated_at` is set by the store.
    ///
    /// # Errors
    /// * `NotFound` - no booking with this id
    /// * `UniqueViolation` - the new interval overlaps another active booking
    async fn update_booking(&self, booking: &Booking) -> RepositoryResult<Booking>;

    /// Bookings matching `filter`, ordered by start time then id.
    async fn list_bookings(&self, filter: &BookingFilter) -> RepositoryResult<Vec<Booking>>;

    /// Every booking of a technician on one date, cancelled ones included.
    async fn bookings_for_technician_on(
        &self,
        technician_id: TechnicianId,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<Booking>>;

    /// Wait for exclusive write access to a technician's calendar.
    async fn acquire_technician_lease(
        &self,
        technician_id: TechnicianId,
    ) -> RepositoryResult<TechnicianLease>;
}
