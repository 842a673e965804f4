//! Postal code (CEP) validation shared by the gateway and lookup services.

use validator::ValidationError;

/// Number of digits in a Brazilian postal code.
pub const CEP_LENGTH: usize = 8;

/// Returns true iff `code` is exactly eight ASCII decimal digits.
pub fn is_valid_cep(code: &str) -> bool {
    code.len() == CEP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// `validator` rule wrapping [`is_valid_cep`].
pub fn validate_cep(code: &str) -> Result<(), ValidationError> {
    if is_valid_cep(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("cep");
        err.message = Some("invalid zipcode".into());
        Err(err)
    }
}
