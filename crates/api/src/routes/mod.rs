//! HTTP route handlers.

pub mod attendance;
pub mod events;
pub mod health;
pub mod registrations;
