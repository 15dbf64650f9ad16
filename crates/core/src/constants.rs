//! Constants used throughout the clinica core crate.
//!
//! Plausibility bounds and BMI thresholds live here so validation, the domain model and
//! the adapters agree on the same numbers.

/// Minimum plausible height in metres (extremely premature newborn).
pub const MIN_HEIGHT_M: f64 = 0.3;

/// Maximum plausible height in metres.
pub const MAX_HEIGHT_M: f64 = 2.5;

/// Minimum plausible weight in kilograms (extremely premature newborn).
pub const MIN_WEIGHT_KG: f64 = 0.5;

/// Maximum plausible weight in kilograms.
pub const MAX_WEIGHT_KG: f64 = 300.0;

/// Lowest BMI accepted on a medical record.
pub const MIN_BMI: f64 = 5.0;

/// Highest BMI accepted on a medical record.
pub const MAX_BMI: f64 = 100.0;

/// Upper (exclusive) BMI bounds for underweight, normal, overweight, obesity I and II.
pub const BMI_THRESHOLDS: [f64; 5] = [18.5, 25.0, 30.0, 35.0, 40.0];

/// Minimum number of characters in a card number.
pub const MIN_CARD_NUMBER_LEN: usize = 13;

/// Minimum number of characters in a card verification code.
pub const MIN_CVV_LEN: usize = 3;

/// Prefix of the provisional transaction id set while a payment is processing.
pub const TEMP_TRANSACTION_PREFIX: &str = "temp-id-";

/// Minutes either side of an appointment during which the doctor is considered busy.
pub const APPOINTMENT_SLOT_MINUTES: i64 = 30;

/// First id handed out by the sequential id generator when nothing is configured.
pub const DEFAULT_ID_SEED: i64 = 1;

/// Default fee charged for an online consultation.
pub const DEFAULT_CONSULTATION_FEE: &str = "150.00";

/// Name reported by the bundled fake payment gateway.
pub const DEFAULT_GATEWAY_NAME: &str = "FakeGateway";

/// Name reported by the bundled fake video-conference provider.
pub const DEFAULT_VIDEO_PROVIDER_NAME: &str = "FakeMeet";

/// Minutes before the appointment from which its video meeting may be joined.
pub const MEETING_EARLY_JOIN_MINUTES: i64 = 5;

/// Length of the window during which a video meeting may be joined.
pub const MEETING_WINDOW_MINUTES: i64 = 60;

/// Address the REST server binds to when `CLINICA_REST_ADDR` is unset.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";
