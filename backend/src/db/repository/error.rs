//! Error types for booking store operations.
//!
//! Every error carries a structured [`ErrorContext`] so callers can log where
//! a failure happened without parsing the message.

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Structured context for repository errors.
///
/// Provides additional information about where and why an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "insert_booking", "get_technician")
    pub operation: Option<String>,
    /// The entity type involved (e.g., "booking", "technician", "lead")
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the entity type.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the entity ID.
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Failures reported by a booking store.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::result_large_err)]
pub enum RepositoryError {
    /// The store cannot serve requests right now. Retrying may succeed.
    #[error("Store unavailable: {message} {context}")]
    Unavailable {
        message: String,
        context: ErrorContext,
    },

    /// Requested entity was not found.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Seed data could not be read or parsed.
    #[error("Invalid seed data: {message} {context}")]
    InvalidSeed {
        message: String,
        context: ErrorContext,
    },

    /// A write was rejected by a storage constraint, such as two active
    /// bookings of one technician overlapping.
    #[error("Unique constraint violation: {message} {context}")]
    UniqueViolation {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    pub fn unavailable(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Unavailable {
            message: message.into(),
            context: context.retryable(),
        }
    }

    pub fn not_found(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn invalid_seed(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InvalidSeed {
            message: message.into(),
            context,
        }
    }

    pub fn unique_violation(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::UniqueViolation {
            message: message.into(),
            context,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Unavailable { context, .. }
            | Self::NotFound { context, .. }
            | Self::InvalidSeed { context, .. }
            | Self::UniqueViolation { context, .. } => context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("insert_booking")
            .with_entity("booking")
            .with_entity_id(42)
            .with_details("overlaps booking 7");
        assert_eq!(
            ctx.to_string(),
            "[operation=insert_booking, entity=booking, id=42, details=overlaps booking 7]"
        );
    }

    #[test]
    fn test_only_unavailable_store_is_retryable() {
        let offline = RepositoryError::unavailable("store offline", ErrorContext::new("get_booking"));
        assert!(offline.is_retryable());
        assert!(offline.to_string().contains("retryable=true"));
        assert!(!RepositoryError::not_found("missing", ErrorContext::default()).is_retryable());
    }

    #[test]
    fn test_unique_violation_keeps_context() {
        let err = RepositoryError::unique_violation(
            "overlapping booking",
            ErrorContext::new("update_booking").with_entity("booking"),
        );

        assert_eq!(err.context().operation.as_deref(), Some("update_booking"));
        assert_eq!(err.context().entity.as_deref(), Some("booking"));
        assert!(err.to_string().starts_with("Unique constraint violation"));
    }
}
