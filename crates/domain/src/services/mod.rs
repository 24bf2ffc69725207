//! Business logic services.

pub mod lifecycle;
