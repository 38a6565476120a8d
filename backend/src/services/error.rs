//! Error taxonomy of the scheduling service.

use crate::db::RepositoryError;
use crate::models::BookingStatus;
use crate::scheduling::ConflictReport;

pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Every failure a scheduling operation can report.
///
/// All variants except `Internal` are user-actionable: the caller can retry
/// with corrected input or a different slot.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error("Scheduling conflict: {}", .0.summary())]
    Conflict(Box<ConflictReport>),

    /// `confirm` re-check failed; carries a customer-facing message.
    #[error("{0}")]
    SlotUnavailable(String),

    /// A concurrent write took the slot first.
    #[error("Concurrent booking conflict: {0}")]
    Concurrency(String),

    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn conflict(report: ConflictReport) -> Self {
        Self::Conflict(Box::new(report))
    }

    /// Stable code used in API responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "SCHEDULING_CONFLICT",
            Self::SlotUnavailable(_) => "SLOT_UNAVAILABLE",
            Self::Concurrency(_) => "CONCURRENCY_CONFLICT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for conflict-class errors that a client resolves by choosing another slot.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::SlotUnavailable(_) | Self::Concurrency(_) | Self::InvalidTransition { .. }
        )
    }
}

impl From<RepositoryError> for SchedulingError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueViolation { message, .. } => Self::Concurrency(message),
            RepositoryError::NotFound { message, context } => Self::NotFound {
                entity: context.entity.unwrap_or_else(|| "record".to_string()),
                id: context.entity_id.unwrap_or(message),
            },
            other => {
                if other.is_retryable() {
                    log::warn!("Store temporarily unavailable: {}", other);
                }
                Self::Internal(other.to_string())
            }
        }
    }
}
