//! Domain layer for the Reservia backend.
//!
//! This crate contains:
//! - Domain models (User, Resource, Reservation)
//! - The reservation lifecycle engine and its storage contract
//! - Domain error types

pub mod models;
pub mod services;
