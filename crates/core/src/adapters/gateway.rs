use crate::error::GatewayError;
use crate::model::{TransactionRequest, TransactionResponse, TransactionStatus};
use crate::ports::PaymentGateway;
use clinica_types::NonEmptyText;

/// Deterministic stand-in for a card acquirer.
///
/// Card numbers ending in `0` are declined; every other card is captured with a random
/// UUID as transaction id.
#[derive(Debug, Clone)]
pub struct FakePaymentGateway {
    name: NonEmptyText,
}

impl FakePaymentGateway {
    pub fn new(name: NonEmptyText) -> Self {
        Self { name }
    }
}

impl PaymentGateway for FakePaymentGateway {
    fn process(&self, request: &TransactionRequest) -> Result<TransactionResponse, GatewayError> {
        if request.card.number.ends_with('0') {
            tracing::debug!(gateway = %self.name, "card declined");
            return Ok(TransactionResponse {
                transaction_id: None,
                success: false,
                message: "Card declined (FAKE)".into(),
                status: TransactionStatus::Cancelled,
            });
        }

        let transaction_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(gateway = %self.name, %transaction_id, amount = %request.amount, "payment captured");

        Ok(TransactionResponse {
            transaction_id: Some(transaction_id),
            success: true,
            message: "Payment approved (FAKE)".into(),
            status: TransactionStatus::Captured,
        })
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CardDetails;
    use rust_decimal::Decimal;

    fn request(number: &str) -> TransactionRequest {
        TransactionRequest {
            card: CardDetails {
                number: number.into(),
                holder_name: "Maria Souza".into(),
                expiry: "12/29".into(),
                cvv: "123".into(),
            },
            amount: Decimal::new(15000, 2),
            description: "Online consultation - ID: 1".into(),
        }
    }

    fn gateway() -> FakePaymentGateway {
        FakePaymentGateway::new(NonEmptyText::new("FakeGateway").expect("non-empty"))
    }

    #[test]
    fn test_card_ending_in_zero_is_declined() {
        let response = gateway()
            .process(&request("4111111111111110"))
            .expect("fake gateway never errors");
        assert!(!response.success);
        assert_eq!(response.status, TransactionStatus::Cancelled);
        assert!(response.transaction_id.is_none());
        assert!(!response.is_captured());
    }

    #[test]
    fn test_other_cards_are_captured_with_uuid() {
        let response = gateway()
            .process(&request("4111111111111111"))
            .expect("fake gateway never errors");
        assert!(response.is_captured());

        let id = response.transaction_id.expect("captured has an id");
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(gateway().name(), "FakeGateway");
    }
}
