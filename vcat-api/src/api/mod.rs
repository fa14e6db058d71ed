//! HTTP API handlers

pub mod health;
pub mod makes;
pub mod vehicle_types;
