//! # Clinica Core
//!
//! Core business logic for the pediatric clinic backend.
//!
//! This crate contains the domain model and the use cases that act on it:
//! - Weight, height and BMI plausibility rules
//! - Appointment and payment state machines
//! - Medical record aggregate, built once per realized appointment
//! - Use-case services that orchestrate the model through outbound ports
//! - In-memory and fake adapters for those ports
//!
//! **No API concerns**: HTTP servers, DTOs and CLI parsing belong in `api-rest` and `clinica-cli`.

pub mod adapters;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod ports;
pub mod services;
pub mod validation;

pub use clinica_types::{NonEmptyText, Sex, TextError};
pub use config::CoreConfig;
pub use error::{ClinicError, ClinicResult, GatewayError, RepositoryError};

/// Identifier of every stored entity.
pub type Id = i64;
