//! Client-side checks run before any request is sent.
//!
//! They are advisory: the backend validates again and its message wins.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::format::{strip_digits, PHONE_MAX_DIGITS, PHONE_MIN_DIGITS, TAX_ID_DIGITS};

lazy_static! {
    /// `local@domain.tld`, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Tax id (CNPJ) must have 14 digits")]
    TaxIdLength,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Phone must have 10 or 11 digits")]
    PhoneLength,

    #[error("Username is required")]
    UsernameRequired,

    #[error("Password is required")]
    PasswordRequired,
}

/// Trimmed value, or `error` when nothing is left.
pub fn validate_required(value: &str, error: ValidationError) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(error);
    }
    Ok(trimmed.to_string())
}

/// Digits of a CNPJ, masked or not.
pub fn validate_tax_id(value: &str) -> Result<String, ValidationError> {
    let digits = strip_digits(value);
    if digits.len() != TAX_ID_DIGITS {
        return Err(ValidationError::TaxIdLength);
    }
    Ok(digits)
}

pub fn validate_email(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(trimmed.to_string())
}

/// Digits of a landline (10) or mobile (11) number.
pub fn validate_phone(value: &str) -> Result<String, ValidationError> {
    let digits = strip_digits(value);
    if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len()) {
        return Err(ValidationError::PhoneLength);
    }
    Ok(digits)
}
