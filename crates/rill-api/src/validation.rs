//! Input validation for the lookup RPC handlers.
//!
//! Every `validate_*` function returns `Ok(())` on success or a
//! `tonic::Status::invalid_argument` describing the constraint violation.
//!
//! ## Constraints enforced
//!
//! | Field           | Constraint                        |
//! |-----------------|-----------------------------------|
//! | stream_name     | non-empty, length ≤ 1024 bytes    |
//! | subscription_id | non-empty, length ≤ 1024 bytes    |

use tonic::Status;

/// Maximum resource identifier length (bytes).
pub const MAX_IDENTIFIER_LEN: usize = 1_024;

pub fn validate_stream_name(name: &str) -> Result<(), Status> {
    validate_identifier(name, "stream_name")
}

pub fn validate_subscription_id(id: &str) -> Result<(), Status> {
    validate_identifier(id, "subscription_id")
}

fn validate_identifier(value: &str, field: &str) -> Result<(), Status> {
    if value.is_empty() {
        return Err(Status::invalid_argument(format!("{field} must not be empty")));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(Status::invalid_argument(format!(
            "{field} length {} exceeds maximum {}",
            value.len(),
            MAX_IDENTIFIER_LEN,
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifier_rejected() {
        let err = validate_stream_name("").unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn oversized_identifier_rejected() {
        let long = "s".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(validate_subscription_id(&long).is_err());
    }

    #[test]
    fn normal_identifier_accepted() {
        assert!(validate_stream_name("orders").is_ok());
        assert!(validate_subscription_id("orders-consumer-1").is_ok());
    }
}
