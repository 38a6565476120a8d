//! Read-only access to technicians and leads.
//!
//! Both are managed outside the scheduler; the engine only looks them up.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Lead, LeadId, Technician, TechnicianId};

#[async_trait]
pub trait TechnicianRepository: Send + Sync {
    /// # Errors
    /// * `NotFound` - no technician with this id
    async fn get_technician(&self, id: TechnicianId) -> RepositoryResult<Technician>;

    /// All technicians ordered by id, including inactive ones.
    async fn list_technicians(&self) -> RepositoryResult<Vec<Technician>>;
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// # Errors
    /// * `NotFound` - no lead with this id
    async fn get_lead(&self, id: LeadId) -> RepositoryResult<Lead>;
}
