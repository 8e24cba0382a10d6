//! # Registry Core
//!
//! Domain entity, field validators, repository trait, and the
//! registration/update engine for the user registry.

pub mod domain;
pub mod error;
pub mod repositories;
pub mod services;
pub mod testing;
pub mod validators;

pub use domain::*;
pub use error::{ConflictField, DomainError, FieldError};
