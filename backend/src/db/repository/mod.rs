//! Repository traits for the booking store.

pub mod booking;
pub mod error;
pub mod staff;

pub use booking::{BookingFilter, BookingRepository, TechnicianLease};
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use staff::{LeadRepository, TechnicianRepository};

/// Everything the scheduling service needs from storage.
pub trait FullRepository: BookingRepository + TechnicianRepository + LeadRepository {}

impl<T> FullRepository for T where T: BookingRepository + TechnicianRepository + LeadRepository {}
