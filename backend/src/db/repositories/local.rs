//! In-memory booking store for local development and tests.
//!
//! Data lives behind a `parking_lot::RwLock`. Per-technician leases are tokio
//! mutexes so they can be held across `.await` points by the service layer.

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::db::repository::{
    BookingFilter, BookingRepository, ErrorContext, LeadRepository, RepositoryError,
    RepositoryResult, TechnicianLease, TechnicianRepository,
};
use crate::models::{Booking, BookingId, Lead, LeadId, NewBooking, Technician, TechnicianId};

/// Reference data loaded into the store at start-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub technicians: Vec<Technician>,
    #[serde(default)]
    pub leads: Vec<Lead>,
    /// Historical bookings, imported without the overlap constraint.
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

impl SeedData {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let context = || ErrorContext::new("load_seed").with_details(path.display().to_string());
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RepositoryError::invalid_seed(e.to_string(), context()))?;
        serde_json::from_str(&raw)
            .map_err(|e| RepositoryError::invalid_seed(e.to_string(), context()))
    }
}

#[derive(Debug)]
struct LocalData {
    bookings: BTreeMap<BookingId, Booking>,
    technicians: BTreeMap<TechnicianId, Technician>,
    leads: BTreeMap<LeadId, Lead>,
    next_booking_id: i64,
    healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            bookings: BTreeMap::new(),
            technicians: BTreeMap::new(),
            leads: BTreeMap::new(),
            next_booking_id: 1,
            healthy: true,
        }
    }
}

impl LocalData {
    fn ensure_healthy(&self, operation: &str) -> RepositoryResult<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(RepositoryError::unavailable(
                "Local store is unavailable",
                ErrorContext::new(operation),
            ))
        }
    }

    /// Storage-level exclusion: no two active bookings of one technician overlap.
    fn check_exclusion(&self, candidate: &Booking, operation: &str) -> RepositoryResult<()> {
        if !candidate.is_active() {
            return Ok(());
        }
        let window = candidate.window();
        let clash = self.bookings.values().find(|existing| {
            existing.id != candidate.id
                && existing.technician_id == candidate.technician_id
                && existing.is_active()
                && existing.window().overlaps(&window)
        });

        match clash {
            Some(existing) => Err(RepositoryError::unique_violation(
                format!(
                    "Technician {} already has booking {} at {}",
                    candidate.technician_id,
                    existing.id,
                    existing.window()
                ),
                ErrorContext::new(operation)
                    .with_entity("booking")
                    .with_entity_id(existing.id),
            )),
            None => Ok(()),
        }
    }
}

/// In-memory implementation of every repository trait.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    leases: Arc<Mutex<HashMap<TechnicianId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with seed data.
    pub fn with_seed(seed: SeedData) -> Self {
        let repo = Self::new();
        repo.seed(seed);
        repo
    }

    pub fn seed(&self, seed: SeedData) {
        for technician in seed.technicians {
            self.add_technician(technician);
        }
        for lead in seed.leads {
            self.add_lead(lead);
        }
        for booking in seed.bookings {
            self.import_booking(booking);
        }
    }

    pub fn add_technician(&self, technician: Technician) {
        self.data.write().technicians.insert(technician.id, technician);
    }

    pub fn add_lead(&self, lead: Lead) {
        self.data.write().leads.insert(lead.id, lead);
    }

    /// Store a booking exactly as given, bypassing the overlap constraint.
    ///
    /// Imported history may already contain double-bookings; the conflict
    /// audit exists to find them.
    pub fn import_booking(&self, booking: Booking) {
        let mut data = self.data.write();
        data.next_booking_id = data.next_booking_id.max(booking.id.value() + 1);
        data.bookings.insert(booking.id, booking);
    }

    /// Simulate the store going offline (or coming back).
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().healthy = healthy;
    }

    /// Drop all bookings, keeping technicians and leads.
    pub fn clear_bookings(&self) {
        let mut data = self.data.write();
        data.bookings.clear();
        data.next_booking_id = 1;
    }

    pub fn booking_count(&self) -> usize {
        self.data.read().bookings.len()
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn lease_lock(&self, technician_id: TechnicianId) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.leases.lock().entry(technician_id).or_default())
    }
}

#[async_trait]
impl BookingRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().healthy)
    }

    async fn insert_booking(&self, booking: NewBooking) -> RepositoryResult<Booking> {
        let mut data = self.data.write();
        data.ensure_healthy("insert_booking")?;

        let id = BookingId::new(data.next_booking_id);
        let booking = booking.into_booking(id, Self::now());
        data.check_exclusion(&booking, "insert_booking")?;

        data.next_booking_id += 1;
        data.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: BookingId) -> RepositoryResult<Booking> {
        let data = self.data.read();
        data.ensure_healthy("get_booking")?;
        data.bookings.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found(
                format!("Booking {} not found", id),
                ErrorContext::new("get_booking")
                    .with_entity("booking")
                    .with_entity_id(id),
            )
        })
    }

    async fn update_booking(&self, booking: &Booking) -> RepositoryResult<Booking> {
        let mut data = self.data.write();
        data.ensure_healthy("update_booking")?;

        if !data.bookings.contains_key(&booking.id) {
            return Err(RepositoryError::not_found(
                format!("Booking {} not found", booking.id),
                ErrorContext::new("update_booking")
                    .with_entity("booking")
                    .with_entity_id(booking.id),
            ));
        }
        data.check_exclusion(booking, "update_booking")?;

        let mut stored = booking.clone();
        stored.updated_at = Self::now();
        data.bookings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> RepositoryResult<Vec<Booking>> {
        let data = self.data.read();
        data.ensure_healthy("list_bookings")?;

        let mut bookings: Vec<Booking> = data
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.start(), b.id));
        Ok(bookings)
    }

    async fn bookings_for_technician_on(
        &self,
        technician_id: TechnicianId,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<Booking>> {
        self.list_bookings(&BookingFilter::for_technician(technician_id).between(Some(date), Some(date)))
            .await
    }

    async fn acquire_technician_lease(
        &self,
        technician_id: TechnicianId,
    ) -> RepositoryResult<TechnicianLease> {
        self.data.read().ensure_healthy("acquire_technician_lease")?;
        let guard = self.lease_lock(technician_id).lock_owned().await;
        Ok(TechnicianLease::new(technician_id, Box::new(guard)))
    }
}

#[async_trait]
impl TechnicianRepository for LocalRepository {
    async fn get_technician(&self, id: TechnicianId) -> RepositoryResult<Technician> {
        let data = self.data.read();
        data.ensure_healthy("get_technician")?;
        data.technicians.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found(
                format!("Technician {} not found", id),
                ErrorContext::new("get_technician")
                    .with_entity("technician")
                    .with_entity_id(id),
            )
        })
    }

    async fn list_technicians(&self) -> RepositoryResult<Vec<Technician>> {
        let data = self.data.read();
        data.ensure_healthy("list_technicians")?;
        Ok(data.technicians.values().cloned().collect())
    }
}

#[async_trait]
impl LeadRepository for LocalRepository {
    async fn get_lead(&self, id: LeadId) -> RepositoryResult<Lead> {
        let data = self.data.read();
        data.ensure_healthy("get_lead")?;
        data.leads.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found(
                format!("Lead {} not found", id),
                ErrorContext::new("get_lead")
                    .with_entity("lead")
                    .with_entity_id(id),
            )
        })
    }
}
