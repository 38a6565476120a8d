//! # Inspection Scheduler
//!
//! Booking and technician-assignment engine for a field-service business
//! (pest inspections across metropolitan Melbourne).
//!
//! ## Features
//!
//! - **Travel estimates**: suburb distance table and buffered travel times
//! - **Slots**: business-hours slot grids with overlap detection
//! - **Conflicts**: outside-hours, double-booking and travel-gap checks with
//!   suggested alternatives and an overlap audit
//! - **Assignment**: technician scoring by availability, travel and workload
//! - **Lifecycle**: create, confirm, reschedule, cancel and inspection
//!   progress under per-technician exclusion
//! - **HTTP API**: JSON REST endpoints over axum
//!
//! ## Architecture
//!
//! - [`models`]: ids, bookings, technicians, time windows and slots
//! - [`scheduling`]: the pure engine, free of I/O
//! - [`db`]: repository traits and the in-memory store
//! - [`services`]: the booking lifecycle manager and notifications
//! - [`config`]: TOML configuration
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod scheduling;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
