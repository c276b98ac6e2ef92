use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropdeskError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PropdeskError {
    /// Shorthand for the common `InvalidInput` case.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PropdeskError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PropdeskError {
    fn from(e: serde_json::Error) -> Self {
        PropdeskError::SerializationError(e.to_string())
    }
}
