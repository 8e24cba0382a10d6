//! # Registry Shared
//!
//! Shared configuration, constants, pagination types, and telemetry for the
//! user registry service.

pub mod config;
pub mod constants;
pub mod pii;
pub mod telemetry;
pub mod types;

pub use types::*;
