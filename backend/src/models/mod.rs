//! Domain model for bookings, technicians and candidate slots.
//!
//! These types are shared by the scheduling engine, the repository layer and
//! the HTTP DTOs. They carry no behaviour beyond invariants that are local to a
//! single value (status transitions, interval arithmetic).

pub mod booking;
pub mod macros;
pub mod slot;
pub mod technician;
pub mod time;

pub use booking::*;
pub use slot::*;
pub use technician::*;
pub use time::*;

crate::define_id_type!(i64, BookingId);
crate::define_id_type!(i64, TechnicianId);
crate::define_id_type!(i64, LeadId);
