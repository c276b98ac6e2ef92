pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "mortgage")]
pub mod mortgage;

#[cfg(feature = "property")]
pub mod property;

#[cfg(feature = "billing")]
pub mod billing;

pub use error::PropdeskError;
pub use types::*;

/// Standard result type for all propdesk operations
pub type PropdeskResult<T> = Result<T, PropdeskError>;
