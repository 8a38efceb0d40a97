//! Phone number validation and normalization.

use crate::error::FlowError;
use std::fmt;

/// A phone number normalized to E.164 format (e.g. "+14155551234").
///
/// Can only be constructed through [`PhoneNumber::parse`], so holding
/// one is proof the number passed the format predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalize user input into E.164 form.
    ///
    /// Strips formatting characters, requires 7-15 digits, and requires
    /// a country code (an explicit leading `+` or enough digits to
    /// plausibly include one).
    pub fn parse(input: &str) -> Result<Self, FlowError> {
        let has_plus = input.trim_start().starts_with('+');
        let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

        if digits.is_empty() {
            return Err(FlowError::InvalidPhoneNumber(
                "must contain at least one digit".into(),
            ));
        }

        if digits.len() < 7 {
            return Err(FlowError::InvalidPhoneNumber("too short".into()));
        }

        if digits.len() > 15 {
            return Err(FlowError::InvalidPhoneNumber("too long".into()));
        }

        if has_plus || digits.len() >= 10 {
            Ok(Self(format!("+{}", digits)))
        } else {
            Err(FlowError::InvalidPhoneNumber(
                "must include country code".into(),
            ))
        }
    }

    /// The normalized E.164 representation.
    pub fn as_e164(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
