use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};

/// Country code the rail requires every payer number to carry.
const COUNTRY_CODE: &str = "254";
/// National trunk prefix replaced by the country code during normalization.
const TRUNK_PREFIX: &str = "0";
/// Total digits of a canonical number, country code included.
const CANONICAL_LEN: usize = 12;

/// A payer phone number in the canonical international form the rail accepts.
///
/// Construction is the only way to obtain one, so any `PhoneNumber` held by
/// the rest of the system is already valid. Normalization is pure; malformed
/// input fails here, before any network call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalizes free-text input into canonical form.
    ///
    /// Whitespace, dashes and a leading `+` are stripped; a leading trunk `0`
    /// is replaced with the country code; a number already starting with the
    /// country code passes through. Anything else, or a result that is not
    /// exactly twelve digits, is rejected.
    pub fn normalize(raw: &str) -> Result<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '+')
            .collect();

        if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::InvalidPhoneNumber(format!(
                "'{raw}' contains non-digit characters"
            )));
        }

        let canonical = if let Some(rest) = cleaned.strip_prefix(TRUNK_PREFIX) {
            format!("{COUNTRY_CODE}{rest}")
        } else if cleaned.starts_with(COUNTRY_CODE) {
            cleaned
        } else {
            return Err(PaymentError::InvalidPhoneNumber(format!(
                "'{raw}' must start with {TRUNK_PREFIX} or {COUNTRY_CODE}"
            )));
        };

        if canonical.len() != CANONICAL_LEN {
            return Err(PaymentError::InvalidPhoneNumber(format!(
                "'{raw}' normalizes to {} digits, expected {CANONICAL_LEN}",
                canonical.len()
            )));
        }

        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for PhoneNumber {
    type Error = PaymentError;

    fn try_from(value: &str) -> Result<Self> {
        Self::normalize(value)
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trunk_prefix_replaced_with_country_code() {
        let phone = PhoneNumber::normalize("0712345678").unwrap();
        assert_eq!(phone.as_str(), "254712345678");
    }

    #[test]
    fn test_canonical_number_accepted_as_is() {
        let phone = PhoneNumber::normalize("254712345678").unwrap();
        assert_eq!(phone.as_str(), "254712345678");
    }

    #[test]
    fn test_separators_and_plus_stripped() {
        let phone = PhoneNumber::normalize("+254 712-345 678").unwrap();
        assert_eq!(phone.as_str(), "254712345678");

        let phone = PhoneNumber::normalize("07 1234 5678").unwrap();
        assert_eq!(phone.as_str(), "254712345678");
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(PhoneNumber::normalize("12345").is_err());
    }

    #[test]
    fn test_wrong_length_after_normalization_rejected() {
        // Trunk form with one digit too many
        assert!(PhoneNumber::normalize("07123456789").is_err());
        // Canonical prefix but truncated
        assert!(PhoneNumber::normalize("2547123456").is_err());
    }

    #[test]
    fn test_foreign_prefix_rejected() {
        assert!(PhoneNumber::normalize("44712345678").is_err());
    }

    #[test]
    fn test_non_digit_input_rejected() {
        assert!(PhoneNumber::normalize("07abc45678").is_err());
        assert!(PhoneNumber::normalize("").is_err());
    }
}
