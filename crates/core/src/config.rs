//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Binaries read environment variables and hand the raw values to
//! the `*_from_env_value` helpers here; nothing in the core reads the environment during
//! request handling.

use crate::constants::{
    DEFAULT_CONSULTATION_FEE, DEFAULT_GATEWAY_NAME, DEFAULT_ID_SEED, DEFAULT_VIDEO_PROVIDER_NAME,
};
use crate::{ClinicError, ClinicResult, Id};
use clinica_types::NonEmptyText;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    id_seed: Id,
    consultation_fee: Decimal,
    gateway_name: NonEmptyText,
    video_provider_name: NonEmptyText,
    seed_catalogue: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` if `id_seed` or `consultation_fee` is not positive.
    pub fn new(
        id_seed: Id,
        consultation_fee: Decimal,
        gateway_name: NonEmptyText,
        video_provider_name: NonEmptyText,
        seed_catalogue: bool,
    ) -> ClinicResult<Self> {
        if id_seed <= 0 {
            return Err(ClinicError::Validation(
                "id seed must be a positive integer".into(),
            ));
        }
        if consultation_fee <= Decimal::ZERO {
            return Err(ClinicError::Validation(
                "consultation fee must be positive".into(),
            ));
        }

        Ok(Self {
            id_seed,
            consultation_fee,
            gateway_name,
            video_provider_name,
            seed_catalogue,
        })
    }

    /// Defaults used by tests and the CLI demo.
    pub fn with_defaults() -> ClinicResult<Self> {
        Self::new(
            DEFAULT_ID_SEED,
            default_consultation_fee()?,
            default_gateway_name()?,
            default_video_provider_name()?,
            true,
        )
    }

    pub fn id_seed(&self) -> Id {
        self.id_seed
    }

    pub fn consultation_fee(&self) -> Decimal {
        self.consultation_fee
    }

    pub fn gateway_name(&self) -> &NonEmptyText {
        &self.gateway_name
    }

    pub fn video_provider_name(&self) -> &NonEmptyText {
        &self.video_provider_name
    }

    pub fn seed_catalogue(&self) -> bool {
        self.seed_catalogue
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_consultation_fee() -> ClinicResult<Decimal> {
    Decimal::from_str(DEFAULT_CONSULTATION_FEE)
        .map_err(|e| ClinicError::Validation(format!("invalid default fee: {e}")))
}

fn default_gateway_name() -> ClinicResult<NonEmptyText> {
    Ok(NonEmptyText::new(DEFAULT_GATEWAY_NAME)?)
}

fn default_video_provider_name() -> ClinicResult<NonEmptyText> {
    Ok(NonEmptyText::new(DEFAULT_VIDEO_PROVIDER_NAME)?)
}

/// Parse the first generated id from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `DEFAULT_ID_SEED`.
pub fn id_seed_from_env_value(value: Option<String>) -> ClinicResult<Id> {
    match trimmed(value) {
        None => Ok(DEFAULT_ID_SEED),
        Some(v) => v
            .parse::<Id>()
            .map_err(|e| ClinicError::Validation(format!("invalid id seed '{v}': {e}"))),
    }
}

/// Parse the consultation fee from an optional string value such as `"150.00"`.
pub fn consultation_fee_from_env_value(value: Option<String>) -> ClinicResult<Decimal> {
    match trimmed(value) {
        None => default_consultation_fee(),
        Some(v) => Decimal::from_str(&v)
            .map_err(|e| ClinicError::Validation(format!("invalid consultation fee '{v}': {e}"))),
    }
}

pub fn gateway_name_from_env_value(value: Option<String>) -> ClinicResult<NonEmptyText> {
    match trimmed(value) {
        None => default_gateway_name(),
        Some(v) => Ok(NonEmptyText::new(v)?),
    }
}

pub fn video_provider_name_from_env_value(value: Option<String>) -> ClinicResult<NonEmptyText> {
    match trimmed(value) {
        None => default_video_provider_name(),
        Some(v) => Ok(NonEmptyText::new(v)?),
    }
}

/// Parse a boolean flag. Accepts `true/false`, `1/0`, `yes/no` in any case.
pub fn flag_from_env_value(value: Option<String>, default: bool) -> ClinicResult<bool> {
    let Some(v) = trimmed(value) else {
        return Ok(default);
    };

    match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ClinicError::Validation(format!("invalid boolean flag '{v}'"))),
    }
}
