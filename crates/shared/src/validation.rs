//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Minimum number of digits in a contact phone number.
const MIN_PHONE_DIGITS: usize = 6;

/// Maximum number of digits in a contact phone number (E.164 allows 15).
const MAX_PHONE_DIGITS: usize = 15;

lazy_static! {
    static ref PASSPORT_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]{5,20}$").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9 ()\-]+$").unwrap();
}

/// Validates that a money amount (fees, costs) is finite and non-negative.
pub fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("amount_range");
        err.message = Some("Amount must be a non-negative number".into());
        Err(err)
    }
}

/// Validates that a text field is not empty or whitespace only.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a passport number: 5-20 latin letters or digits.
pub fn validate_passport_number(value: &str) -> Result<(), ValidationError> {
    if PASSPORT_REGEX.is_match(value.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("passport_format");
        err.message = Some("Passport number must be 5-20 letters or digits".into());
        Err(err)
    }
}

/// Validates a contact phone number.
///
/// Accepts an optional leading `+`, digits, spaces, dashes and parentheses,
/// with 6-15 digits in total.
pub fn validate_phone_number(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();

    if PHONE_REGEX.is_match(trimmed) && (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number must contain 6-15 digits".into());
        Err(err)
    }
}
