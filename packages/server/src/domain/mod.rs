//! Domain layer for the chat hub.
//!
//! This module contains the hub's vocabulary (names, messages, endpoints)
//! and the registry contract, independent of transport and DTO concerns.

pub mod endpoint;
pub mod entity;
pub mod error;
pub mod registry;
pub mod value_object;

pub use endpoint::{DeliveryStream, Endpoint};
pub use entity::{ChatMessage, DeliveredMessage};
pub use error::{DeliveryError, ValueObjectError};
pub use registry::ClientRegistry;
pub use value_object::{ClientName, EndpointId, MessageBody, Timestamp};

#[cfg(test)]
pub use registry::MockClientRegistry;
