//! Payment processing for online consultations.

use crate::constants::TEMP_TRANSACTION_PREFIX;
use crate::model::{CardDetails, Payment, PaymentResult, PaymentStatus, TransactionRequest};
use crate::ports::{AppointmentRepository, IdGenerator, PaymentGateway, PaymentRepository};
use crate::validation::validate_card_details;
use crate::{ClinicError, ClinicResult, CoreConfig, Id};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ProcessPaymentCommand {
    pub appointment_id: Id,
    /// Falls back to the configured consultation fee when absent.
    pub amount: Option<Decimal>,
    pub card: CardDetails,
}

#[derive(Clone)]
pub struct PaymentService {
    cfg: Arc<CoreConfig>,
    appointments: Arc<dyn AppointmentRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    ids: Arc<dyn IdGenerator>,
}

impl PaymentService {
    pub fn new(
        cfg: Arc<CoreConfig>,
        appointments: Arc<dyn AppointmentRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            cfg,
            appointments,
            payments,
            gateway,
            ids,
        }
    }

    /// Charges a card for an appointment.
    ///
    /// Card data is checked before a payment exists, so a malformed card never reaches the
    /// gateway. A declined card is not an error: the payment is stored as `Failed` and the
    /// result carries the gateway's message.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the appointment does not exist.
    /// - `Validation` for malformed card data or a non-positive amount.
    /// - `BusinessRule` wrapping storage or gateway failures.
    pub fn process(&self, cmd: ProcessPaymentCommand) -> ClinicResult<PaymentResult> {
        tracing::info!(appointment_id = cmd.appointment_id, "processing payment");

        match self.try_process(cmd) {
            Ok(result) => Ok(result),
            Err(err) if err.is_business_rule() => {
                tracing::error!(error = %err, "payment rejected");
                Err(err)
            }
            Err(err) => {
                tracing::error!(error = %err, "unexpected error while processing payment");
                Err(err.into_business_rule("error processing payment"))
            }
        }
    }

    fn try_process(&self, cmd: ProcessPaymentCommand) -> ClinicResult<PaymentResult> {
        let appointment = self
            .appointments
            .find_by_id(cmd.appointment_id)?
            .ok_or_else(|| ClinicError::not_found("appointment", cmd.appointment_id))?;
        tracing::debug!(appointment_id = appointment.id(), "appointment validated");

        validate_card_details(&cmd.card)?;
        tracing::debug!(card = ?cmd.card, "card data validated");

        let amount = cmd.amount.unwrap_or_else(|| self.cfg.consultation_fee());
        let payment_id = self.ids.generate_id();
        let mut payment = Payment::new(payment_id, appointment.id(), amount)?;

        payment.start_processing(format!("{TEMP_TRANSACTION_PREFIX}{payment_id}"))?;
        self.payments.save(&payment)?;
        tracing::info!(payment_id, %amount, "payment processing");

        let request = TransactionRequest {
            card: cmd.card,
            amount,
            description: format!("Online consultation - ID: {}", appointment.id()),
        };

        let response = match self.gateway.process(&request) {
            Ok(response) => response,
            Err(err) => {
                self.abandon(&mut payment, &err.to_string());
                return Err(err.into());
            }
        };
        tracing::info!(
            payment_id,
            gateway = self.gateway.name(),
            success = response.success,
            status = ?response.status,
            "gateway response received"
        );

        if response.is_captured() {
            payment.complete()?;
            self.payments.save(&payment)?;
            tracing::info!(payment_id, "payment completed");

            Ok(PaymentResult {
                payment_id,
                status: PaymentStatus::Completed,
                message: "Payment processed successfully".into(),
                gateway_transaction_id: response.transaction_id,
            })
        } else {
            payment.fail(format!("Gateway returned: {}", response.message))?;
            self.payments.save(&payment)?;
            tracing::info!(payment_id, reason = ?payment.failure_reason(), "payment failed");

            Ok(PaymentResult {
                payment_id,
                status: PaymentStatus::Failed,
                message: response.message,
                gateway_transaction_id: None,
            })
        }
    }

    /// Moves a payment stuck in `Processing` to `Failed` after the gateway was unusable.
    fn abandon(&self, payment: &mut Payment, reason: &str) {
        let result = match payment.fail(format!("Gateway error: {reason}")) {
            Ok(()) => self.payments.save(payment).map_err(ClinicError::from),
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            tracing::warn!(payment_id = payment.id(), error = %err, "could not mark payment as failed");
        }
    }

    pub fn find(&self, payment_id: Id) -> ClinicResult<Payment> {
        self.payments
            .find_by_id(payment_id)
            .map_err(|e| ClinicError::from(e).into_business_rule("failed to load payment"))?
            .ok_or_else(|| ClinicError::not_found("payment", payment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::model::{TransactionResponse, TransactionStatus};
    use crate::services::fixtures::{ana_appointment, Fixture};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn card(number: &str) -> CardDetails {
        CardDetails {
            number: number.into(),
            holder_name: "Maria Souza".into(),
            expiry: "12/29".into(),
            cvv: "123".into(),
        }
    }

    fn command(number: &str) -> ProcessPaymentCommand {
        ProcessPaymentCommand {
            appointment_id: 1,
            amount: Some(Decimal::new(15000, 2)),
            card: card(number),
        }
    }

    /// Counts calls and fails every one of them.
    #[derive(Default)]
    struct CountingGateway {
        calls: AtomicUsize,
    }

    impl PaymentGateway for CountingGateway {
        fn process(
            &self,
            _request: &TransactionRequest,
        ) -> Result<TransactionResponse, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::Unreachable {
                gateway: "counting".into(),
                reason: "connection refused".into(),
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn service_with(fx: &Fixture, gateway: Arc<dyn PaymentGateway>) -> PaymentService {
        PaymentService::new(
            fx.cfg.clone(),
            fx.store.clone(),
            fx.store.clone(),
            gateway,
            fx.ids.clone(),
        )
    }

    #[test]
    fn test_captured_payment_completes() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());

        let result = fx
            .services
            .payments
            .process(command("4111111111111111"))
            .expect("payment succeeds");

        assert_eq!(result.status, PaymentStatus::Completed);
        assert_eq!(result.message, "Payment processed successfully");
        assert!(result.gateway_transaction_id.is_some());

        let stored = fx.services.payments.find(result.payment_id).expect("stored");
        assert_eq!(stored.status(), PaymentStatus::Completed);
        assert_eq!(
            stored.transaction_id(),
            Some(format!("temp-id-{}", result.payment_id).as_str())
        );
    }

    #[test]
    fn test_declined_card_fails_payment_with_reason() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());

        let result = fx
            .services
            .payments
            .process(command("4111111111111110"))
            .expect("decline is not an error");

        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(result.message, "Card declined (FAKE)");
        assert!(result.gateway_transaction_id.is_none());

        let stored = fx.services.payments.find(result.payment_id).expect("stored");
        assert_eq!(stored.status(), PaymentStatus::Failed);
        assert_eq!(
            stored.failure_reason(),
            Some("Gateway returned: Card declined (FAKE)")
        );
    }

    #[test]
    fn test_short_card_fails_before_gateway() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());
        let gateway = Arc::new(CountingGateway::default());
        let service = service_with(&fx, gateway.clone());

        let err = service.process(command("123")).expect_err("short card");
        assert!(matches!(err, ClinicError::Validation(_)));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_appointment_is_not_found() {
        let fx = Fixture::new();
        let err = fx
            .services
            .payments
            .process(command("4111111111111111"))
            .expect_err("no appointment");
        assert!(matches!(err, ClinicError::NotFound { entity: "appointment", .. }));
    }

    #[test]
    fn test_non_positive_amount_is_validation() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());

        let mut cmd = command("4111111111111111");
        cmd.amount = Some(Decimal::ZERO);
        let err = fx.services.payments.process(cmd).expect_err("zero amount");
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn test_missing_amount_uses_configured_fee() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());

        let mut cmd = command("4111111111111111");
        cmd.amount = None;
        let result = fx.services.payments.process(cmd).expect("payment succeeds");

        let stored = fx.services.payments.find(result.payment_id).expect("stored");
        assert_eq!(stored.amount(), fx.cfg.consultation_fee());
    }

    #[test]
    fn test_gateway_failure_is_wrapped_and_payment_marked_failed() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());
        let gateway = Arc::new(CountingGateway::default());
        let service = service_with(&fx, gateway.clone());

        let err = service
            .process(command("4111111111111111"))
            .expect_err("gateway unreachable");
        match err {
            ClinicError::BusinessRule(msg) => {
                assert!(msg.starts_with("error processing payment"));
                assert!(msg.contains("connection refused"));
            }
            other => panic!("expected BusinessRule, got {other:?}"),
        }
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

        // The fixture's id generator starts at 1 and this is the first id handed out.
        let stored = service.find(1).expect("payment stored");
        assert_eq!(stored.status(), PaymentStatus::Failed);
    }

    #[test]
    fn test_find_unknown_payment() {
        let fx = Fixture::new();
        let err = fx.services.payments.find(77).expect_err("nothing stored");
        assert!(matches!(err, ClinicError::NotFound { entity: "payment", id: 77 }));
    }

    #[test]
    fn test_response_status_other_than_captured_fails_payment() {
        struct AuthorizedOnly;

        impl PaymentGateway for AuthorizedOnly {
            fn process(
                &self,
                _request: &TransactionRequest,
            ) -> Result<TransactionResponse, GatewayError> {
                Ok(TransactionResponse {
                    transaction_id: Some("auth-1".into()),
                    success: true,
                    message: "Authorized only".into(),
                    status: TransactionStatus::Authorized,
                })
            }

            fn name(&self) -> &str {
                "authorized-only"
            }
        }

        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());
        let service = service_with(&fx, Arc::new(AuthorizedOnly));

        let result = service
            .process(command("4111111111111111"))
            .expect("not an error");
        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(result.message, "Authorized only");
    }
}
