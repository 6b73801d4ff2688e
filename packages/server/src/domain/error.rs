//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ClientName validation error
    #[error("ClientName cannot be empty")]
    ClientNameEmpty,

    /// ClientName too long error
    #[error("ClientName cannot exceed {max} characters (got {actual})")]
    ClientNameTooLong { max: usize, actual: usize },

    /// MessageBody too long error
    #[error("MessageBody cannot exceed {max} characters (got {actual})")]
    MessageBodyTooLong { max: usize, actual: usize },
}

/// Why an endpoint rejected a delivery.
///
/// Either way the recipient is pruned from the registry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The endpoint was closed, or its receiving side is gone
    #[error("endpoint is closed")]
    Closed,

    /// The recipient's bounded queue is full
    #[error("endpoint queue is full")]
    Full,
}
