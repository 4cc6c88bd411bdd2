//! Domain layer for the alumni events backend.
//!
//! This crate contains:
//! - Domain models (Event, Registration, AttendanceToken)
//! - The registration and attendance services
//! - The storage seam (`EventStore`) and an in-memory implementation
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{EventCoreError, RegistrationLookup};
