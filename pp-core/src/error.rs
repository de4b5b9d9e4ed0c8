//! Error types for People Power core rules

use thiserror::Error;

/// Rule violations raised by the domain layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient {currency}: required {required}, available {available}")]
    InsufficientFunds {
        currency: String,
        required: i64,
        available: i64,
    },

    #[error("Insufficient energy: {available} available")]
    InsufficientEnergy { available: i64 },

    #[error("Already completed: {0}")]
    AlreadyCompleted(String),

    #[error("Supply exceeded: requested {requested}, remaining {remaining}")]
    SupplyExceeded { requested: i64, remaining: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state transition: {0}")]
    InvalidState(String),
}

impl CoreError {
    /// Insufficient power tokens
    pub fn insufficient_tokens(required: i64, available: i64) -> Self {
        Self::InsufficientFunds {
            currency: "power tokens".to_string(),
            required,
            available,
        }
    }

    /// Insufficient diamonds
    pub fn insufficient_diamonds(required: i64, available: i64) -> Self {
        Self::InsufficientFunds {
            currency: "diamonds".to_string(),
            required,
            available,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type alias for core rules
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message() {
        let err = CoreError::insufficient_tokens(50, 10);
        assert_eq!(
            err.to_string(),
            "Insufficient power tokens: required 50, available 10"
        );
    }
}
