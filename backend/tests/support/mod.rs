//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use inspection_scheduler::db::{
    BookingFilter, BookingRepository, FullRepository, LeadRepository, LocalRepository,
    RepositoryResult, SeedData, TechnicianLease, TechnicianRepository,
};
use inspection_scheduler::models::{
    Booking, BookingId, BookingKind, BookingStatus, Lead, LeadId, ServiceLocation, Technician,
    NewBooking, TechnicianId, TechnicianRole,
};
use inspection_scheduler::scheduling::SchedulingEngine;
use inspection_scheduler::services::{
    BookingRequest, BookingService, InMemoryNotificationSink, InspectionRequest, NotificationSink,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Time helpers
// =============================================================================

/// Monday 4 March 2024, the day most scenarios run on.
pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

pub fn next_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    day().and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

// =============================================================================
// Reference data
// =============================================================================

pub const ALEX: TechnicianId = TechnicianId(1);
pub const SAM: TechnicianId = TechnicianId(2);
pub const OFFICE: TechnicianId = TechnicianId(3);
pub const RETIRED: TechnicianId = TechnicianId(4);

pub const PRIYA: LeadId = LeadId(1);
pub const TOM: LeadId = LeadId(2);

fn technician(id: TechnicianId, name: &str, role: TechnicianRole, active: bool) -> Technician {
    Technician {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: None,
        role,
        active,
    }
}

fn lead(id: LeadId, first: &str, last: &str, suburb: &str) -> Lead {
    Lead {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: None,
        phone: None,
        address: None,
        suburb: Some(suburb.to_string()),
    }
}

pub fn seed() -> SeedData {
    SeedData {
        technicians: vec![
            technician(ALEX, "Alex Nguyen", TechnicianRole::Technician, true),
            technician(SAM, "Sam Patel", TechnicianRole::Technician, true),
            technician(OFFICE, "Casey Brown", TechnicianRole::Office, true),
            technician(RETIRED, "Riley Smith", TechnicianRole::Technician, false),
        ],
        leads: vec![
            lead(PRIYA, "Priya", "Shah", "Richmond"),
            lead(TOM, "Tom", "Walker", "Frankston"),
        ],
        bookings: vec![],
    }
}

pub fn seeded_repository() -> LocalRepository {
    LocalRepository::with_seed(seed())
}

// =============================================================================
// Service fixtures
// =============================================================================

/// A service over `repo` that records every notification.
pub fn service_with(repo: LocalRepository) -> (BookingService, InMemoryNotificationSink) {
    let sink = InMemoryNotificationSink::new();
    let service = BookingService::new(
        Arc::new(repo) as Arc<dyn FullRepository>,
        Arc::new(SchedulingEngine::default()),
        Arc::new(sink.clone()) as Arc<dyn NotificationSink>,
    );
    (service, sink)
}

pub fn service() -> (BookingService, InMemoryNotificationSink) {
    service_with(seeded_repository())
}

/// A service over an arbitrary repository implementation.
pub fn service_over(repo: Arc<dyn FullRepository>) -> BookingService {
    BookingService::new(
        repo,
        Arc::new(SchedulingEngine::default()),
        Arc::new(InMemoryNotificationSink::new()) as Arc<dyn NotificationSink>,
    )
}

// =============================================================================
// Slow store
// =============================================================================

/// Wraps [`LocalRepository`] so the next `get_booking` after [`arm`] stalls.
///
/// Lets a test interleave a second operation between a service's first read
/// and its write.
///
/// [`arm`]: SlowReadRepository::arm
#[derive(Clone)]
pub struct SlowReadRepository {
    inner: LocalRepository,
    armed: Arc<AtomicBool>,
    delay: Duration,
}

impl SlowReadRepository {
    pub fn new(inner: LocalRepository, delay: Duration) -> Self {
        Self {
            inner,
            armed: Arc::new(AtomicBool::new(false)),
            delay,
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookingRepository for SlowReadRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.inner.health_check().await
    }

    async fn insert_booking(&self, booking: NewBooking) -> RepositoryResult<Booking> {
        self.inner.insert_booking(booking).await
    }

    async fn get_booking(&self, id: BookingId) -> RepositoryResult<Booking> {
        let booking = self.inner.get_booking(id).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        booking
    }

    async fn update_booking(&self, booking: &Booking) -> RepositoryResult<Booking> {
        self.inner.update_booking(booking).await
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> RepositoryResult<Vec<Booking>> {
        self.inner.list_bookings(filter).await
    }

    async fn bookings_for_technician_on(
        &self,
        technician_id: TechnicianId,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<Booking>> {
        self.inner.bookings_for_technician_on(technician_id, date).await
    }

    async fn acquire_technician_lease(
        &self,
        technician_id: TechnicianId,
    ) -> RepositoryResult<TechnicianLease> {
        self.inner.acquire_technician_lease(technician_id).await
    }
}

#[async_trait]
impl TechnicianRepository for SlowReadRepository {
    async fn get_technician(&self, id: TechnicianId) -> RepositoryResult<Technician> {
        self.inner.get_technician(id).await
    }

    async fn list_technicians(&self) -> RepositoryResult<Vec<Technician>> {
        self.inner.list_technicians().await
    }
}

#[async_trait]
impl LeadRepository for SlowReadRepository {
    async fn get_lead(&self, id: LeadId) -> RepositoryResult<Lead> {
        self.inner.get_lead(id).await
    }
}

pub fn request(
    technician: TechnicianId,
    start: NaiveDateTime,
    duration_minutes: u32,
    suburb: &str,
) -> BookingRequest {
    BookingRequest {
        technician_id: technician,
        lead_id: PRIYA,
        start,
        duration_minutes: Some(duration_minutes),
        address: "12 Swan St".to_string(),
        suburb: suburb.to_string(),
        notes: None,
        inspection: None,
    }
}

pub fn inspection_request(
    technician: TechnicianId,
    start: NaiveDateTime,
    suburb: &str,
) -> BookingRequest {
    BookingRequest {
        inspection: Some(InspectionRequest {
            service_type: "Termite inspection".to_string(),
            estimated_cost: Some(350.0),
        }),
        ..request(technician, start, 120, suburb)
    }
}

/// A stored booking built by hand, for import or pure engine tests.
pub fn booking(
    id: i64,
    technician: TechnicianId,
    start: NaiveDateTime,
    duration_minutes: u32,
    suburb: &str,
) -> Booking {
    Booking {
        id: BookingId::new(id),
        technician_id: technician,
        lead_id: PRIYA,
        customer_name: format!("Customer {}", id),
        location: ServiceLocation {
            address: format!("{} Example St", id),
            suburb: suburb.to_string(),
        },
        scheduled_date: start.date(),
        scheduled_time: start.time(),
        duration_minutes,
        status: BookingStatus::Confirmed,
        notes: None,
        kind: BookingKind::Appointment,
        created_at: start,
        updated_at: start,
    }
}
