//! Storage boundary for the scheduler.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers                                          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  services::BookingService - lifecycle + conflict rules  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - abstract interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! The engine only relies on the guarantees documented on
//! [`BookingRepository`]: per-technician leases and an overlap constraint.

pub mod repositories;
pub mod repository;

pub use repositories::{LocalRepository, SeedData};
pub use repository::{
    BookingFilter, BookingRepository, ErrorContext, FullRepository, LeadRepository,
    RepositoryError, RepositoryResult, TechnicianLease, TechnicianRepository,
};
