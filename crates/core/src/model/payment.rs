//! Payment entity, its state machine, and the data exchanged with a payment gateway.

use crate::{ClinicError, ClinicResult, Id};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEvent {
    StartProcessing,
    Complete,
    Fail,
}

impl PaymentStatus {
    /// Transition table: `Pending -> Processing -> Completed | Failed`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::InvalidState` for any other `(status, event)` pair.
    pub fn apply(self, event: PaymentEvent) -> ClinicResult<PaymentStatus> {
        use PaymentEvent::*;
        use PaymentStatus::*;

        match (self, event) {
            (Pending, StartProcessing) => Ok(Processing),
            (Processing, Complete) => Ok(Completed),
            (Processing, Fail) => Ok(Failed),
            (from, event) => Err(ClinicError::InvalidState(format!(
                "payment cannot {} from status {from}",
                event.verb()
            ))),
        }
    }
}

impl PaymentEvent {
    fn verb(&self) -> &'static str {
        match self {
            PaymentEvent::StartProcessing => "start processing",
            PaymentEvent::Complete => "complete",
            PaymentEvent::Fail => "fail",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    id: Id,
    appointment_id: Id,
    amount: Decimal,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    transaction_id: Option<String>,
    failure_reason: Option<String>,
}

impl Payment {
    /// Creates a `Pending` payment.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` if `amount` is zero or negative.
    pub fn new(id: Id, appointment_id: Id, amount: Decimal) -> ClinicResult<Self> {
        if amount <= Decimal::ZERO {
            return Err(ClinicError::Validation(format!(
                "payment amount must be positive, got {amount}"
            )));
        }

        Ok(Self {
            id,
            appointment_id,
            amount,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
            transaction_id: None,
            failure_reason: None,
        })
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn appointment_id(&self) -> Id {
        self.appointment_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Moves the payment to `Processing`, recording the transaction id.
    ///
    /// The state check runs before the argument check.
    pub fn start_processing(&mut self, transaction_id: impl Into<String>) -> ClinicResult<()> {
        let next = self.status.apply(PaymentEvent::StartProcessing)?;
        let transaction_id = transaction_id.into();
        if transaction_id.trim().is_empty() {
            return Err(ClinicError::Validation(
                "transaction id is required to start processing".into(),
            ));
        }

        self.status = next;
        self.transaction_id = Some(transaction_id);
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&mut self) -> ClinicResult<()> {
        self.status = self.status.apply(PaymentEvent::Complete)?;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> ClinicResult<()> {
        let next = self.status.apply(PaymentEvent::Fail)?;
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(ClinicError::Validation(
                "a failure reason is required".into(),
            ));
        }

        self.status = next;
        self.failure_reason = Some(reason);
        Ok(())
    }
}

/// Card data as typed by the payer. Never logged.
#[derive(Clone)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: String,
}

impl CardDetails {
    pub fn last_four(&self) -> &str {
        let start = self
            .number
            .char_indices()
            .rev()
            .nth(3)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.number[start..]
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &format_args!("****{}", self.last_four()))
            .field("holder_name", &self.holder_name)
            .field("expiry", &"**/**")
            .field("cvv", &"***")
            .finish()
    }
}

/// Status reported by a payment gateway for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Authorized,
    Captured,
    Denied,
    Cancelled,
    Error,
}

#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub card: CardDetails,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    pub transaction_id: Option<String>,
    pub success: bool,
    pub message: String,
    pub status: TransactionStatus,
}

impl TransactionResponse {
    pub fn is_captured(&self) -> bool {
        self.success && self.status == TransactionStatus::Captured
    }
}

/// Outcome of the process-payment use case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResult {
    pub payment_id: Id,
    pub status: PaymentStatus,
    pub message: String,
    pub gateway_transaction_id: Option<String>,
}
