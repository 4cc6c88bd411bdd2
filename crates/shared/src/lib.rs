//! Shared utilities and common types for the alumni events backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (secret generation, hashing)
//! - Identity token verification (JWT)
//! - Cursor pagination
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod validation;
