//! Clinical and payment input validation.
//!
//! Pure functions that check weight, height and BMI against plausibility bounds, classify
//! a BMI, and sanity-check card data before a payment is attempted. They hold no state and
//! are used both standalone (patient measurement history) and by the medical-record builder.

use crate::constants::{
    BMI_THRESHOLDS, MAX_BMI, MAX_HEIGHT_M, MAX_WEIGHT_KG, MIN_BMI, MIN_CARD_NUMBER_LEN,
    MIN_CVV_LEN, MIN_HEIGHT_M, MIN_WEIGHT_KG,
};
use crate::model::CardDetails;
use crate::{ClinicError, ClinicResult};
use serde::Serialize;
use std::fmt;

/// Nutritional category of a BMI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BmiCategory {
    #[serde(rename = "underweight")]
    Underweight,
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "overweight")]
    Overweight,
    #[serde(rename = "obesity-I")]
    ObesityI,
    #[serde(rename = "obesity-II")]
    ObesityII,
    #[serde(rename = "obesity-III")]
    ObesityIII,
}

impl BmiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "underweight",
            BmiCategory::Normal => "normal",
            BmiCategory::Overweight => "overweight",
            BmiCategory::ObesityI => "obesity-I",
            BmiCategory::ObesityII => "obesity-II",
            BmiCategory::ObesityIII => "obesity-III",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validates a height in metres.
///
/// # Errors
///
/// Returns `ClinicError::Validation` if `height` is not finite or lies outside
/// `[MIN_HEIGHT_M, MAX_HEIGHT_M]`.
pub fn validate_height(height: f64) -> ClinicResult<()> {
    if !height.is_finite() {
        return Err(ClinicError::Validation(format!(
            "height is not a number: {height}"
        )));
    }
    if height < MIN_HEIGHT_M {
        return Err(ClinicError::Validation(format!(
            "height too low: {height:.2} m (minimum {MIN_HEIGHT_M:.2} m)"
        )));
    }
    if height > MAX_HEIGHT_M {
        return Err(ClinicError::Validation(format!(
            "height too high: {height:.2} m (maximum {MAX_HEIGHT_M:.2} m)"
        )));
    }
    Ok(())
}

/// Validates a weight in kilograms.
///
/// # Errors
///
/// Returns `ClinicError::Validation` if `weight` is not finite or lies outside
/// `[MIN_WEIGHT_KG, MAX_WEIGHT_KG]`.
pub fn validate_weight(weight: f64) -> ClinicResult<()> {
    if !weight.is_finite() {
        return Err(ClinicError::Validation(format!(
            "weight is not a number: {weight}"
        )));
    }
    if weight < MIN_WEIGHT_KG {
        return Err(ClinicError::Validation(format!(
            "weight too low: {weight:.2} kg (minimum {MIN_WEIGHT_KG:.2} kg)"
        )));
    }
    if weight > MAX_WEIGHT_KG {
        return Err(ClinicError::Validation(format!(
            "weight too high: {weight:.2} kg (maximum {MAX_WEIGHT_KG:.2} kg)"
        )));
    }
    Ok(())
}

/// Computes `weight / height²` and checks it against `[MIN_BMI, MAX_BMI]`.
///
/// Weight and height are not range-checked here; callers validate them first.
///
/// # Errors
///
/// Returns `ClinicError::Validation` if the result is out of range or not finite.
pub fn compute_and_validate_bmi(weight: f64, height: f64) -> ClinicResult<f64> {
    let bmi = weight / (height * height);

    if !bmi.is_finite() || !(MIN_BMI..=MAX_BMI).contains(&bmi) {
        return Err(ClinicError::Validation(format!(
            "implausible BMI: {bmi:.2} (valid range {MIN_BMI:.1} to {MAX_BMI:.1}); check weight and height"
        )));
    }
    Ok(bmi)
}

/// Maps a BMI value to its category. Each threshold is an exclusive upper bound.
pub fn classify_bmi(bmi: f64) -> BmiCategory {
    let [under, normal, over, obesity_one, obesity_two] = BMI_THRESHOLDS;

    if bmi < under {
        BmiCategory::Underweight
    } else if bmi < normal {
        BmiCategory::Normal
    } else if bmi < over {
        BmiCategory::Overweight
    } else if bmi < obesity_one {
        BmiCategory::ObesityI
    } else if bmi < obesity_two {
        BmiCategory::ObesityII
    } else {
        BmiCategory::ObesityIII
    }
}

/// Checks card data shape before any payment is created.
///
/// This is a format check only: card number length, non-blank holder, `MM/YY` expiry and
/// CVV length. It does not validate the expiry date against the calendar.
///
/// # Errors
///
/// Returns `ClinicError::Validation` naming the first field that fails.
pub fn validate_card_details(card: &CardDetails) -> ClinicResult<()> {
    if card.number.chars().count() < MIN_CARD_NUMBER_LEN {
        return Err(ClinicError::Validation("invalid card number".into()));
    }

    if card.holder_name.trim().is_empty() {
        return Err(ClinicError::Validation(
            "cardholder name is required".into(),
        ));
    }

    if !is_expiry_shape(&card.expiry) {
        return Err(ClinicError::Validation(
            "invalid expiry date (expected MM/YY)".into(),
        ));
    }

    if card.cvv.chars().count() < MIN_CVV_LEN {
        return Err(ClinicError::Validation("invalid CVV".into()));
    }

    Ok(())
}

fn is_expiry_shape(expiry: &str) -> bool {
    let bytes = expiry.as_bytes();
    bytes.len() == 5
        && bytes[2] == b'/'
        && bytes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 2)
            .all(|(_, b)| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str, holder: &str, expiry: &str, cvv: &str) -> CardDetails {
        CardDetails {
            number: number.into(),
            holder_name: holder.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
        }
    }

    #[test]
    fn test_weight_bounds_are_inclusive() {
        assert!(validate_weight(0.5).is_ok());
        assert!(validate_weight(300.0).is_ok());
        assert!(validate_weight(15.2).is_ok());
        assert!(validate_weight(0.49).is_err());
        assert!(validate_weight(300.01).is_err());
        assert!(validate_weight(f64::NAN).is_err());
    }

    #[test]
    fn test_height_bounds_are_inclusive() {
        assert!(validate_height(0.3).is_ok());
        assert!(validate_height(2.5).is_ok());
        assert!(validate_height(0.29).is_err());
        assert!(validate_height(2.51).is_err());
        assert!(validate_height(f64::INFINITY).is_err());
    }

    #[test]
    fn test_height_error_names_the_bound() {
        let err = validate_height(0.2).expect_err("0.2 m should be rejected");
        match err {
            ClinicError::Validation(msg) => {
                assert!(msg.contains("0.20 m"));
                assert!(msg.contains("minimum 0.30 m"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_bmi_is_weight_over_height_squared() {
        let bmi = compute_and_validate_bmi(15.2, 0.95).expect("plausible BMI");
        assert!((bmi - 15.2 / (0.95 * 0.95)).abs() < f64::EPSILON);
        assert!((bmi - 16.84).abs() < 0.01);
    }

    #[test]
    fn test_bmi_out_of_range_is_rejected() {
        // 1.0 / 0.45² ≈ 4.94
        let err = compute_and_validate_bmi(1.0, 0.45).expect_err("BMI below 5 should fail");
        assert!(matches!(err, ClinicError::Validation(_)));

        assert!(compute_and_validate_bmi(300.0, 1.0).is_err());
        assert!(compute_and_validate_bmi(5.0, 1.0).is_ok());
        assert!(compute_and_validate_bmi(100.0, 1.0).is_ok());
    }

    #[test]
    fn test_classify_bmi_categories() {
        assert_eq!(classify_bmi(17.0), BmiCategory::Underweight);
        assert_eq!(classify_bmi(23.0), BmiCategory::Normal);
        assert_eq!(classify_bmi(27.0), BmiCategory::Overweight);
        assert_eq!(classify_bmi(32.0), BmiCategory::ObesityI);
        assert_eq!(classify_bmi(37.0), BmiCategory::ObesityII);
        assert_eq!(classify_bmi(45.0), BmiCategory::ObesityIII);
    }

    #[test]
    fn test_classify_bmi_thresholds_are_exclusive_upper_bounds() {
        assert_eq!(classify_bmi(18.5), BmiCategory::Normal);
        assert_eq!(classify_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(classify_bmi(40.0), BmiCategory::ObesityIII);
        assert_eq!(BmiCategory::ObesityII.label(), "obesity-II");
    }

    #[test]
    fn test_card_details_accepts_well_formed_card() {
        let ok = card("4111111111111111", "Maria Souza", "12/29", "123");
        assert!(validate_card_details(&ok).is_ok());
    }

    #[test]
    fn test_card_details_rejects_each_field() {
        let short = card("123", "Maria Souza", "12/29", "123");
        let blank_holder = card("4111111111111111", "  ", "12/29", "123");
        let bad_expiry = card("4111111111111111", "Maria Souza", "1229", "123");
        let letters_expiry = card("4111111111111111", "Maria Souza", "ab/cd", "123");
        let short_cvv = card("4111111111111111", "Maria Souza", "12/29", "12");

        for bad in [short, blank_holder, bad_expiry, letters_expiry, short_cvv] {
            let err = validate_card_details(&bad).expect_err("card should be rejected");
            assert!(matches!(err, ClinicError::Validation(_)));
        }
    }
}
