//! HTTP server module for the scheduling backend.
//!
//! Exposes the booking service as a JSON REST API over axum.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing and field validation                   │
//! │  - JSON serialization/deserialization                     │
//! │  - CORS, compression, error-to-status mapping             │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (services::BookingService)                 │
//! │  - Booking lifecycle, leases, notifications               │
//! │  - Scheduling engine (slots, conflicts, scoring)          │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db/)                                   │
//! │  - LocalRepository                                        │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, AppError};
pub use router::create_router;
pub use state::AppState;
