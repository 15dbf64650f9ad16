//! Error taxonomy for the clinic core.
//!
//! Every rule violation the domain can detect is a [`ClinicError`] variant. Failures of
//! outbound ports ([`RepositoryError`], [`GatewayError`]) are carried separately so a use
//! case can tell them apart, but they never leave a use case unwrapped: the service
//! boundary folds them into [`ClinicError::BusinessRule`] via
//! [`ClinicError::into_business_rule`], giving callers a single error category.

use crate::Id;
use clinica_types::TextError;

/// Failure reported by a repository adapter.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage lock poisoned: {0}")]
    Poisoned(&'static str),
    #[error("{entity} already stored for key {key}")]
    Duplicate { entity: &'static str, key: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by an external service adapter (payment gateway, video provider).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{gateway} unreachable: {reason}")]
    Unreachable { gateway: String, reason: String },
    #[error("{gateway} returned a malformed response: {reason}")]
    MalformedResponse { gateway: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    /// Malformed or out-of-range input (weight, height, BMI, card data, amounts).
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Id },
    /// An operation was attempted from a state that forbids it.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A uniqueness invariant would be violated.
    #[error("conflict: {0}")]
    Conflict(String),
    /// An unexpected failure, re-wrapped at a use-case boundary.
    #[error("{0}")]
    BusinessRule(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;

impl ClinicError {
    pub fn not_found(entity: &'static str, id: Id) -> Self {
        ClinicError::NotFound { entity, id }
    }

    /// True for every variant in the domain/business-rule category.
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, ClinicError::Repository(_) | ClinicError::Gateway(_))
    }

    /// Folds port failures into the business-rule category.
    ///
    /// Domain variants pass through unchanged. A repository `Duplicate` is the storage
    /// layer enforcing a uniqueness invariant, so it surfaces as [`ClinicError::Conflict`].
    /// Any other port failure becomes [`ClinicError::BusinessRule`] prefixed with `context`.
    pub fn into_business_rule(self, context: &str) -> Self {
        match self {
            ClinicError::Repository(RepositoryError::Duplicate { entity, key }) => {
                ClinicError::Conflict(format!("{entity} already exists for {key}"))
            }
            err @ (ClinicError::Repository(_) | ClinicError::Gateway(_)) => {
                ClinicError::BusinessRule(format!("{context}: {err}"))
            }
            domain => domain,
        }
    }
}

impl From<TextError> for ClinicError {
    fn from(err: TextError) -> Self {
        ClinicError::Validation(err.to_string())
    }
}
