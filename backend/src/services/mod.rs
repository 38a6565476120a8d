//! Service layer: the booking lifecycle and its collaborators.
//!
//! Services sit between the HTTP handlers and the repository. They own the
//! read-check-write sequence and translate storage failures into the
//! scheduling error taxonomy.

pub mod booking_service;
pub mod error;
pub mod notifications;

pub use booking_service::{
    AvailabilityCheck, BookingChanges, BookingRequest, BookingService, BulkFailure,
    BulkRescheduleOutcome, InspectionOutcome, InspectionRequest, MAX_DURATION_MINUTES,
    SLOT_NO_LONGER_AVAILABLE,
};
pub use error::{SchedulingError, SchedulingResult};
pub use notifications::{
    BookingEvent, InMemoryNotificationSink, LogNotificationSink, NotificationError,
    NotificationKind, NotificationSink,
};
